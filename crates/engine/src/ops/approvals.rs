//! Approval coordinator.
//!
//! A decision is a compare-and-swap on `expenses.status` followed, for
//! approvals, by the ledger increment. Both run in one transaction; the
//! increment only happens for the caller whose conditional write applied.
//! The submitter is notified after commit.

use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Actor, Decision, EngineError, ExpenseStatus, Money, NotificationKind, NotificationNew,
    ResultEngine, Transition, expenses,
};

use super::{
    Engine, ExpenseDetail, detail::expense_detail, normalize_optional_text, require_decider,
    with_tx,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    pub expense: ExpenseDetail,
    /// `true` when the expense was already in the requested state and
    /// nothing was changed.
    pub already_processed: bool,
}

impl ApprovalOutcome {
    /// Human readable note for replayed decisions.
    pub fn message(&self) -> Option<String> {
        self.already_processed.then(|| {
            format!(
                "Expense already {}",
                self.expense.expense.status.as_str().to_lowercase()
            )
        })
    }
}

impl Engine {
    pub async fn approve_expense(
        &self,
        actor: &Actor,
        expense_id: Uuid,
    ) -> ResultEngine<ApprovalOutcome> {
        self.decide_expense(actor, expense_id, Decision::Approve, None)
            .await
    }

    pub async fn reject_expense(
        &self,
        actor: &Actor,
        expense_id: Uuid,
        reason: Option<&str>,
    ) -> ResultEngine<ApprovalOutcome> {
        self.decide_expense(actor, expense_id, Decision::Reject, reason)
            .await
    }

    /// Moves a `PENDING` expense to the decision's terminal state.
    ///
    /// Repeating a decision that already applied succeeds with
    /// `already_processed` set and has no side effects. Deciding the
    /// opposite way on a terminal expense is [`EngineError::InvalidState`].
    pub async fn decide_expense(
        &self,
        actor: &Actor,
        expense_id: Uuid,
        decision: Decision,
        reason: Option<&str>,
    ) -> ResultEngine<ApprovalOutcome> {
        require_decider(actor, "approve or reject expenses")?;
        self.scoped_expense(&self.database, actor, expense_id)
            .await?;

        let target = decision.target();
        let (model, applied) = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let result = expenses::Entity::update_many()
                .col_expr(expenses::Column::Status, Expr::value(target.as_str()))
                .col_expr(expenses::Column::ApprovedBy, Expr::value(actor.id))
                .col_expr(expenses::Column::ApprovedAt, Expr::value(now))
                .col_expr(expenses::Column::UpdatedAt, Expr::value(now))
                .filter(expenses::Column::Id.eq(expense_id))
                .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;

            let model = expenses::Entity::find_by_id(expense_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;

            if result.rows_affected == 1 {
                if decision == Decision::Approve {
                    self.record_approval(&db_tx, model.budget_id, Money::new(model.amount_minor))
                        .await?;
                }
                Ok((model, true))
            } else {
                let current = ExpenseStatus::try_from(model.status.as_str())
                    .map_err(|_| {
                        EngineError::DataIntegrity(format!(
                            "expense {expense_id} has invalid status"
                        ))
                    })?;
                match Transition::check(current, decision)? {
                    Transition::AlreadyApplied(_) => Ok((model, false)),
                    Transition::Apply(_) => Err(EngineError::InvalidState(
                        "expense changed while deciding".to_string(),
                    )),
                }
            }
        })?;

        let detail = expense_detail(&self.database, model).await?;
        if !applied {
            tracing::warn!(
                %expense_id,
                actor = %actor.id,
                status = detail.expense.status.as_str(),
                "decision replayed on a processed expense"
            );
            return Ok(ApprovalOutcome {
                expense: detail,
                already_processed: true,
            });
        }

        tracing::info!(
            %expense_id,
            actor = %actor.id,
            status = target.as_str(),
            amount = %detail.expense.amount,
            "expense decided"
        );
        self.emit(decision_notification(&detail, decision, reason))
            .await;

        Ok(ApprovalOutcome {
            expense: detail,
            already_processed: false,
        })
    }
}

fn decision_notification(
    detail: &ExpenseDetail,
    decision: Decision,
    reason: Option<&str>,
) -> NotificationNew {
    let budget = detail
        .budget
        .as_ref()
        .map_or("an unknown budget", |b| b.name.as_str());
    let expense = &detail.expense;
    match decision {
        Decision::Approve => NotificationNew::new(
            expense.user_id,
            "Expense Approved",
            format!(
                "Your expense of {} for {budget} has been approved.",
                expense.amount
            ),
            NotificationKind::Info,
        ),
        Decision::Reject => {
            let mut message = format!(
                "Your expense of {} for {budget} has been rejected.",
                expense.amount
            );
            if let Some(reason) = normalize_optional_text(reason) {
                message.push_str(&format!(" Reason: {reason}"));
            }
            NotificationNew::new(
                expense.user_id,
                "Expense Rejected",
                message,
                NotificationKind::Warning,
            )
        }
    }
}
