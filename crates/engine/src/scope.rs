//! Role-scoped visibility of budgets and expenses.
//!
//! [`Scope::for_actor`] is a pure function of the actor and the resource
//! kind. Every list, read, edit and decision goes through it before touching
//! storage: lists add [`Scope::budget_condition`] /
//! [`Scope::expense_condition`] to the query, single-record paths call
//! [`Scope::permits_budget`] / [`Scope::permits_expense`].
//!
//! | role    | budgets                          | expenses                      |
//! |---------|----------------------------------|-------------------------------|
//! | ADMIN   | all                              | all                           |
//! | MANAGER | own department                   | budgets of own department     |
//! | USER    | owned or in own department       | submitted by the user         |
//!
//! A MANAGER without a department sees nothing. A USER without a department
//! keeps only the ownership branch.

use sea_orm::{
    ColumnTrait, Condition,
    sea_query::{Expr, Query},
};
use uuid::Uuid;

use crate::{Actor, Role, budgets, expenses};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Budget,
    Expense,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    Department(Uuid),
    Owner(Uuid),
    OwnerOrDepartment { owner: Uuid, department: Uuid },
    Deny,
}

impl Scope {
    pub fn for_actor(actor: &Actor, kind: ResourceKind) -> Self {
        match (actor.role, kind, actor.department_id) {
            (Role::Admin, _, _) => Self::Unrestricted,
            (Role::Manager, _, Some(department)) => Self::Department(department),
            (Role::Manager, _, None) => Self::Deny,
            (Role::User, ResourceKind::Expense, _) => Self::Owner(actor.id),
            (Role::User, ResourceKind::Budget, Some(department)) => Self::OwnerOrDepartment {
                owner: actor.id,
                department,
            },
            (Role::User, ResourceKind::Budget, None) => Self::Owner(actor.id),
        }
    }

    pub fn is_denied(self) -> bool {
        matches!(self, Self::Deny)
    }

    /// Predicate over the `budgets` table.
    pub fn budget_condition(self) -> Condition {
        match self {
            Self::Unrestricted => Condition::all(),
            Self::Department(department) => {
                Condition::all().add(budgets::Column::DepartmentId.eq(department))
            }
            Self::Owner(owner) => Condition::all().add(budgets::Column::OwnerId.eq(owner)),
            Self::OwnerOrDepartment { owner, department } => Condition::any()
                .add(budgets::Column::OwnerId.eq(owner))
                .add(budgets::Column::DepartmentId.eq(department)),
            Self::Deny => deny(),
        }
    }

    /// Predicate over the `expenses` table. Department scope is resolved
    /// through the expense's budget.
    pub fn expense_condition(self) -> Condition {
        let in_department = |department: Uuid| {
            expenses::Column::BudgetId.in_subquery(
                Query::select()
                    .column(budgets::Column::Id)
                    .from(budgets::Entity)
                    .and_where(budgets::Column::DepartmentId.eq(department))
                    .to_owned(),
            )
        };
        match self {
            Self::Unrestricted => Condition::all(),
            Self::Department(department) => Condition::all().add(in_department(department)),
            Self::Owner(owner) => Condition::all().add(expenses::Column::UserId.eq(owner)),
            Self::OwnerOrDepartment { owner, department } => Condition::any()
                .add(expenses::Column::UserId.eq(owner))
                .add(in_department(department)),
            Self::Deny => deny(),
        }
    }

    pub fn permits_budget(self, owner_id: Uuid, department_id: Uuid) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Department(department) => department == department_id,
            Self::Owner(owner) => owner == owner_id,
            Self::OwnerOrDepartment { owner, department } => {
                owner == owner_id || department == department_id
            }
            Self::Deny => false,
        }
    }

    /// `budget_department` is `None` when the expense's budget is gone; only
    /// unrestricted and ownership scopes can still see such an expense.
    pub fn permits_expense(self, submitter_id: Uuid, budget_department: Option<Uuid>) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Department(department) => budget_department == Some(department),
            Self::Owner(owner) => owner == submitter_id,
            Self::OwnerOrDepartment { owner, department } => {
                owner == submitter_id || budget_department == Some(department)
            }
            Self::Deny => false,
        }
    }
}

fn deny() -> Condition {
    Condition::all().add(Expr::val(1).eq(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, department_id: Option<Uuid>) -> Actor {
        Actor::new(Uuid::new_v4(), role, department_id)
    }

    #[test]
    fn admin_is_unrestricted() {
        let admin = actor(Role::Admin, None);
        assert_eq!(
            Scope::for_actor(&admin, ResourceKind::Expense),
            Scope::Unrestricted
        );
        assert_eq!(
            Scope::for_actor(&admin, ResourceKind::Budget),
            Scope::Unrestricted
        );
    }

    #[test]
    fn manager_is_department_scoped() {
        let department = Uuid::new_v4();
        let manager = actor(Role::Manager, Some(department));
        let scope = Scope::for_actor(&manager, ResourceKind::Expense);
        assert_eq!(scope, Scope::Department(department));
        assert!(scope.permits_expense(Uuid::new_v4(), Some(department)));
        assert!(!scope.permits_expense(manager.id, Some(Uuid::new_v4())));
        assert!(!scope.permits_expense(manager.id, None));
    }

    #[test]
    fn manager_without_department_is_denied() {
        let manager = actor(Role::Manager, None);
        for kind in [ResourceKind::Budget, ResourceKind::Expense] {
            let scope = Scope::for_actor(&manager, kind);
            assert!(scope.is_denied());
            assert!(!scope.permits_budget(manager.id, Uuid::new_v4()));
        }
    }

    #[test]
    fn user_sees_own_expenses_only() {
        let department = Uuid::new_v4();
        let user = actor(Role::User, Some(department));
        let scope = Scope::for_actor(&user, ResourceKind::Expense);
        assert!(scope.permits_expense(user.id, Some(Uuid::new_v4())));
        assert!(!scope.permits_expense(Uuid::new_v4(), Some(department)));
    }

    #[test]
    fn user_sees_owned_or_department_budgets() {
        let department = Uuid::new_v4();
        let user = actor(Role::User, Some(department));
        let scope = Scope::for_actor(&user, ResourceKind::Budget);
        assert!(scope.permits_budget(user.id, Uuid::new_v4()));
        assert!(scope.permits_budget(Uuid::new_v4(), department));
        assert!(!scope.permits_budget(Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn user_without_department_keeps_ownership_only() {
        let user = actor(Role::User, None);
        let scope = Scope::for_actor(&user, ResourceKind::Budget);
        assert_eq!(scope, Scope::Owner(user.id));
        assert!(!scope.permits_budget(Uuid::new_v4(), Uuid::new_v4()));
    }
}
