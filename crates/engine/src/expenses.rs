//! Expense primitives and the expense state machine.
//!
//! ```text
//! PENDING ──approve──▶ APPROVED
//!    │
//!    └────reject────▶ REJECTED
//! ```
//!
//! `APPROVED` and `REJECTED` are terminal: status, approver and decision
//! timestamp never change again, and amount/description are frozen.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidInput(format!(
                "invalid expense status: {other}"
            ))),
        }
    }
}

/// What an approver wants to do with a pending expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The terminal status this decision moves an expense into.
    pub fn target(self) -> ExpenseStatus {
        match self {
            Self::Approve => ExpenseStatus::Approved,
            Self::Reject => ExpenseStatus::Rejected,
        }
    }
}

/// Outcome of checking a decision against an expense's current status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The expense is `PENDING`; the decision moves it.
    Apply(ExpenseStatus),
    /// The expense already sits in the decision's target state.
    AlreadyApplied(ExpenseStatus),
}

impl Transition {
    /// Validates `decision` against `current`.
    ///
    /// A decision on an expense already in the *other* terminal state is
    /// [`EngineError::InvalidState`].
    pub fn check(current: ExpenseStatus, decision: Decision) -> ResultEngine<Self> {
        let target = decision.target();
        match current {
            ExpenseStatus::Pending => Ok(Self::Apply(target)),
            status if status == target => Ok(Self::AlreadyApplied(status)),
            status => Err(EngineError::InvalidState(format!(
                "expense is already {}",
                status.as_str().to_lowercase()
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub user_id: Uuid,
    pub amount: Money,
    pub description: String,
    pub receipt_url: Option<String>,
    pub status: ExpenseStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Builds a new `PENDING` expense submitted by `user_id`.
    pub fn new(
        budget_id: Uuid,
        user_id: Uuid,
        amount: Money,
        description: String,
        receipt_url: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive(amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            budget_id,
            user_id,
            amount,
            description,
            receipt_url,
            status: ExpenseStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Amount/description/receipt may only change while `PENDING`.
    pub fn ensure_editable(&self) -> ResultEngine<()> {
        if self.status.is_terminal() {
            return Err(EngineError::InvalidState(
                "cannot edit approved or rejected expenses".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn ensure_positive(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "expense amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub receipt_url: Option<String>,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Budget,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id),
            budget_id: ActiveValue::Set(expense.budget_id),
            user_id: ActiveValue::Set(expense.user_id),
            amount_minor: ActiveValue::Set(expense.amount.minor()),
            description: ActiveValue::Set(expense.description.clone()),
            receipt_url: ActiveValue::Set(expense.receipt_url.clone()),
            status: ActiveValue::Set(expense.status.as_str().to_string()),
            approved_by: ActiveValue::Set(expense.approved_by),
            approved_at: ActiveValue::Set(expense.approved_at),
            created_at: ActiveValue::Set(expense.created_at),
            updated_at: ActiveValue::Set(expense.updated_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = ExpenseStatus::try_from(model.status.as_str()).map_err(|_| {
            EngineError::DataIntegrity(format!("expense {} has invalid status", model.id))
        })?;
        Ok(Self {
            id: model.id,
            budget_id: model.budget_id,
            user_id: model.user_id,
            amount: Money::new(model.amount_minor),
            description: model.description,
            receipt_url: model.receipt_url,
            status,
            approved_by: model.approved_by,
            approved_at: model.approved_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_accepts_both_decisions() {
        assert_eq!(
            Transition::check(ExpenseStatus::Pending, Decision::Approve).unwrap(),
            Transition::Apply(ExpenseStatus::Approved)
        );
        assert_eq!(
            Transition::check(ExpenseStatus::Pending, Decision::Reject).unwrap(),
            Transition::Apply(ExpenseStatus::Rejected)
        );
    }

    #[test]
    fn same_terminal_state_is_a_replay() {
        assert_eq!(
            Transition::check(ExpenseStatus::Approved, Decision::Approve).unwrap(),
            Transition::AlreadyApplied(ExpenseStatus::Approved)
        );
        assert_eq!(
            Transition::check(ExpenseStatus::Rejected, Decision::Reject).unwrap(),
            Transition::AlreadyApplied(ExpenseStatus::Rejected)
        );
    }

    #[test]
    fn opposite_terminal_state_is_invalid() {
        assert!(matches!(
            Transition::check(ExpenseStatus::Approved, Decision::Reject),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            Transition::check(ExpenseStatus::Rejected, Decision::Approve),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn new_expense_requires_positive_amount() {
        let now = Utc::now();
        let new = |minor| {
            Expense::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                Money::new(minor),
                "Taxi".to_string(),
                None,
                now,
            )
        };
        assert!(new(0).is_err());
        assert!(new(-5).is_err());
        let expense = new(1500).unwrap();
        assert_eq!(expense.status, ExpenseStatus::Pending);
        assert!(expense.ensure_editable().is_ok());
    }
}
