//! Departmental budgeting and expense approval engine.
//!
//! Expenses are submitted against budgets in `PENDING` state; an ADMIN or
//! in-department MANAGER approves or rejects them through
//! [`Engine::decide_expense`], which moves the expense and the budget's
//! running `spent` total as one unit and then notifies the submitter.

pub use actor::{Actor, Role};
pub use budgets::{Budget, BudgetPeriod, BudgetStatus};
pub use commands::{
    BudgetListFilter, BudgetNew, BudgetUpdate, ExpenseListFilter, ExpenseNew, ExpenseUpdate,
};
pub use error::EngineError;
pub use expenses::{Decision, Expense, ExpenseStatus, Transition};
pub use money::Money;
pub use notifications::{DbNotifier, Notification, NotificationKind, NotificationNew, Notifier};
pub use ops::{
    ApprovalOutcome, BudgetDetail, BudgetRef, Engine, EngineBuilder, ExpenseDetail, NamedRef,
    UserRef,
};
pub use pagination::{Page, Pagination};
pub use scope::{ResourceKind, Scope};

mod actor;
pub mod budgets;
pub mod categories;
mod commands;
pub mod departments;
mod error;
pub mod expenses;
mod money;
pub mod notifications;
mod ops;
mod pagination;
mod scope;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
