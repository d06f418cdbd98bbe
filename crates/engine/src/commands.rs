//! Command structs for engine operations.
//!
//! These types group parameters for budget and expense writes and list
//! filters, keeping call sites readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{BudgetPeriod, BudgetStatus, ExpenseStatus, Money};

/// Create a budget.
#[derive(Clone, Debug)]
pub struct BudgetNew {
    pub name: String,
    /// Ignored for MANAGER actors, whose budgets always land in their own
    /// department.
    pub department_id: Option<Uuid>,
    pub category_id: Uuid,
    /// Defaults to the creating actor.
    pub owner_id: Option<Uuid>,
    pub amount: Money,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BudgetNew {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category_id: Uuid,
        amount: Money,
        period: BudgetPeriod,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            department_id: None,
            category_id,
            owner_id: None,
            amount,
            period,
            start_date,
            end_date,
        }
    }

    #[must_use]
    pub fn department_id(mut self, department_id: Uuid) -> Self {
        self.department_id = Some(department_id);
        self
    }

    #[must_use]
    pub fn owner_id(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

/// Partial budget update. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub amount: Option<Money>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Submit an expense against a budget.
#[derive(Clone, Debug)]
pub struct ExpenseNew {
    pub budget_id: Uuid,
    pub amount: Money,
    pub description: String,
    pub receipt_url: Option<String>,
}

impl ExpenseNew {
    #[must_use]
    pub fn new(budget_id: Uuid, amount: Money, description: impl Into<String>) -> Self {
        Self {
            budget_id,
            amount,
            description: description.into(),
            receipt_url: None,
        }
    }

    #[must_use]
    pub fn receipt_url(mut self, url: impl Into<String>) -> Self {
        self.receipt_url = Some(url.into());
        self
    }
}

/// Partial edit of a pending expense.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub amount: Option<Money>,
    pub description: Option<String>,
    pub receipt_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct BudgetListFilter {
    pub department_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<BudgetStatus>,
    /// Case-insensitive substring match on the budget name.
    pub search: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub budget_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<ExpenseStatus>,
}
