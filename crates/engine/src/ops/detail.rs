//! Response shaping: budgets and expenses with their referenced entities
//! resolved. Lookups are batched per page, one query per referenced table.

use std::collections::{HashMap, HashSet};

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use serde::Serialize;

use crate::{
    Budget, EngineError, Expense, Money, ResultEngine, budgets, categories, departments, expenses,
    users,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// The budget fields an expense response carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetRef {
    pub id: Uuid,
    pub name: String,
    pub department_id: Uuid,
    pub category_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetDetail {
    pub budget: Budget,
    pub remaining: Money,
    pub department: Option<NamedRef>,
    pub category: Option<NamedRef>,
    pub owner: Option<UserRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseDetail {
    pub expense: Expense,
    /// `None` only when the referenced budget no longer exists.
    pub budget: Option<BudgetRef>,
    pub user: Option<UserRef>,
    pub approver: Option<UserRef>,
}

async fn users_by_id<C: ConnectionTrait>(
    db: &C,
    ids: HashSet<Uuid>,
) -> ResultEngine<HashMap<Uuid, UserRef>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|user| {
            (
                user.id,
                UserRef {
                    id: user.id,
                    name: user.name,
                    email: user.email,
                },
            )
        })
        .collect())
}

pub(super) async fn budget_details<C: ConnectionTrait>(
    db: &C,
    models: Vec<budgets::Model>,
) -> ResultEngine<Vec<BudgetDetail>> {
    let department_ids: HashSet<Uuid> = models.iter().map(|m| m.department_id).collect();
    let category_ids: HashSet<Uuid> = models.iter().map(|m| m.category_id).collect();
    let owner_ids: HashSet<Uuid> = models.iter().map(|m| m.owner_id).collect();

    let departments: HashMap<Uuid, NamedRef> = if department_ids.is_empty() {
        HashMap::new()
    } else {
        departments::Entity::find()
            .filter(departments::Column::Id.is_in(department_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|d| (d.id, NamedRef { id: d.id, name: d.name }))
            .collect()
    };
    let categories: HashMap<Uuid, NamedRef> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, NamedRef { id: c.id, name: c.name }))
            .collect()
    };
    let owners = users_by_id(db, owner_ids).await?;

    models
        .into_iter()
        .map(|model| {
            let budget = Budget::try_from(model)?;
            Ok(BudgetDetail {
                remaining: budget.remaining(),
                department: departments.get(&budget.department_id).cloned(),
                category: categories.get(&budget.category_id).cloned(),
                owner: owners.get(&budget.owner_id).cloned(),
                budget,
            })
        })
        .collect()
}

pub(super) async fn budget_detail<C: ConnectionTrait>(
    db: &C,
    model: budgets::Model,
) -> ResultEngine<BudgetDetail> {
    let mut details = budget_details(db, vec![model]).await?;
    details.pop().ok_or_else(|| {
        EngineError::DataIntegrity("budget vanished while loading".to_string())
    })
}

pub(super) async fn expense_details<C: ConnectionTrait>(
    db: &C,
    models: Vec<expenses::Model>,
) -> ResultEngine<Vec<ExpenseDetail>> {
    let budget_ids: HashSet<Uuid> = models.iter().map(|m| m.budget_id).collect();
    let user_ids: HashSet<Uuid> = models
        .iter()
        .flat_map(|m| std::iter::once(m.user_id).chain(m.approved_by))
        .collect();

    let budgets: HashMap<Uuid, BudgetRef> = if budget_ids.is_empty() {
        HashMap::new()
    } else {
        budgets::Entity::find()
            .filter(budgets::Column::Id.is_in(budget_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|b| {
                (
                    b.id,
                    BudgetRef {
                        id: b.id,
                        name: b.name,
                        department_id: b.department_id,
                        category_id: b.category_id,
                    },
                )
            })
            .collect()
    };
    let users = users_by_id(db, user_ids).await?;

    models
        .into_iter()
        .map(|model| {
            let expense = Expense::try_from(model)?;
            Ok(ExpenseDetail {
                budget: budgets.get(&expense.budget_id).cloned(),
                user: users.get(&expense.user_id).cloned(),
                approver: expense.approved_by.and_then(|id| users.get(&id).cloned()),
                expense,
            })
        })
        .collect()
}

pub(super) async fn expense_detail<C: ConnectionTrait>(
    db: &C,
    model: expenses::Model,
) -> ResultEngine<ExpenseDetail> {
    let mut details = expense_details(db, vec![model]).await?;
    details.pop().ok_or_else(|| {
        EngineError::DataIntegrity("expense vanished while loading".to_string())
    })
}
