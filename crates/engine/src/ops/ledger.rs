//! Budget ledger: the only writers of `budgets.amount_minor` and
//! `budgets.spent_minor`.
//!
//! Both writes are single conditional `UPDATE` statements evaluated by the
//! database, so `spent` is never read-modify-written from the application.

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{Budget, EngineError, Money, ResultEngine, budgets};

use super::Engine;

impl Engine {
    /// Adds `amount` to the budget's `spent` total.
    ///
    /// Called exactly once per expense, by the caller that won the
    /// `PENDING → APPROVED` conditional write, inside the same transaction.
    /// A missing budget is a data-integrity failure: the expense points at
    /// a budget that no longer exists. An increment that would overflow
    /// `spent` is refused and the caller's transaction rolls back.
    pub(super) async fn record_approval(
        &self,
        db_tx: &DatabaseTransaction,
        budget_id: Uuid,
        amount: Money,
    ) -> ResultEngine<()> {
        let result = budgets::Entity::update_many()
            .col_expr(
                budgets::Column::SpentMinor,
                Expr::col(budgets::Column::SpentMinor).add(amount.minor()),
            )
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget_id))
            .filter(budgets::Column::SpentMinor.lte(i64::MAX.saturating_sub(amount.minor())))
            .exec(db_tx)
            .await?;
        if result.rows_affected > 0 {
            return Ok(());
        }

        let Some(current) = budgets::Entity::find_by_id(budget_id).one(db_tx).await? else {
            tracing::error!(%budget_id, "approved expense references a missing budget");
            return Err(EngineError::DataIntegrity(format!(
                "budget {budget_id} referenced by the expense does not exist"
            )));
        };
        let spent = Money::new(current.spent_minor);
        if spent.checked_add(amount).is_none() {
            return Err(EngineError::InvalidAmount(format!(
                "approving {amount} would overflow the spent total {spent} of budget {budget_id}"
            )));
        }
        Err(EngineError::DataIntegrity(format!(
            "budget {budget_id} rejected the spent increment"
        )))
    }

    /// Sets a new allocation, refusing anything below the current `spent`.
    ///
    /// The floor is part of the `UPDATE` predicate so a concurrent approval
    /// cannot slip between the check and the write.
    pub(super) async fn adjust_allocation(
        &self,
        db_tx: &DatabaseTransaction,
        budget: &Budget,
        new_amount: Money,
    ) -> ResultEngine<()> {
        budget.check_allocation(new_amount)?;

        let result = budgets::Entity::update_many()
            .col_expr(budgets::Column::AmountMinor, Expr::value(new_amount.minor()))
            .col_expr(budgets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(budgets::Column::Id.eq(budget.id))
            .filter(budgets::Column::SpentMinor.lte(new_amount.minor()))
            .exec(db_tx)
            .await?;

        if result.rows_affected == 0 {
            let current = budgets::Entity::find_by_id(budget.id)
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;
            return Err(EngineError::InvalidAmount(format!(
                "budget amount {new_amount} cannot be less than already spent {}",
                Money::new(current.spent_minor)
            )));
        }
        Ok(())
    }
}
