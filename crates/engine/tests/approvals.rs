mod common;

use std::{
    collections::HashMap,
    sync::{Arc, atomic::Ordering},
};

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use common::{FailingNotifier, TempDb, fixture, fixture_at, fixture_with_notifier};
use engine::{EngineError, ExpenseStatus, Money, budgets};
use uuid::Uuid;

#[tokio::test]
async fn approve_moves_spent_once_and_replays() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 200_00).await;
    let expense = fx.submit(&fx.alice, budget.id, 150_00).await;
    assert_eq!(expense.status, ExpenseStatus::Pending);

    let outcome = fx
        .engine
        .approve_expense(&fx.manager, expense.id)
        .await
        .unwrap();
    assert!(!outcome.already_processed);
    assert_eq!(outcome.message(), None);
    assert_eq!(outcome.expense.expense.status, ExpenseStatus::Approved);
    assert_eq!(outcome.expense.expense.approved_by, Some(fx.manager.id));
    assert!(outcome.expense.expense.approved_at.is_some());
    assert_eq!(
        outcome.expense.approver.as_ref().map(|u| u.id),
        Some(fx.manager.id)
    );

    let after = fx.load_budget(budget.id).await;
    assert_eq!(after.spent, Money::new(350_00));
    assert_eq!(after.remaining(), Money::new(650_00));

    let replay = fx
        .engine
        .approve_expense(&fx.manager, expense.id)
        .await
        .unwrap();
    assert!(replay.already_processed);
    assert_eq!(replay.message().as_deref(), Some("Expense already approved"));
    assert_eq!(replay.expense.expense.status, ExpenseStatus::Approved);
    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(350_00));
}

#[tokio::test]
async fn repeated_approvals_count_once_and_notify_once() {
    let fx = fixture().await;
    let budget = fx.budget(500_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 40_00).await;

    for _ in 0..3 {
        fx.engine
            .approve_expense(&fx.admin, expense.id)
            .await
            .unwrap();
    }

    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(40_00));
    let approved = fx.notifications(fx.alice.id, "Expense Approved").await;
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].kind, "INFO");
    assert_eq!(
        approved[0].message,
        "Your expense of 40.00 for Travel has been approved."
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_have_a_single_winner() {
    let db_file = TempDb::new();
    let fx = fixture_at(&db_file.url()).await;
    let budget = fx.budget(1000_00, 0).await;
    let mut expenses = Vec::new();
    for _ in 0..5 {
        expenses.push(fx.submit(&fx.alice, budget.id, 20_00).await);
    }

    let mut handles = Vec::new();
    for expense in &expenses {
        for i in 0..8 {
            let engine = fx.engine.clone();
            let actor = if i % 2 == 0 {
                fx.manager.clone()
            } else {
                fx.admin.clone()
            };
            let expense_id = expense.id;
            handles.push(tokio::spawn(async move {
                engine.approve_expense(&actor, expense_id).await
            }));
        }
    }

    let mut winners: HashMap<Uuid, Vec<Option<Uuid>>> = HashMap::new();
    let mut replays = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if outcome.already_processed {
            replays += 1;
        } else {
            winners
                .entry(outcome.expense.expense.id)
                .or_default()
                .push(outcome.expense.expense.approved_by);
        }
    }

    assert_eq!(replays, 5 * 7);
    assert_eq!(winners.len(), 5);
    for expense in &expenses {
        let won = &winners[&expense.id];
        assert_eq!(won.len(), 1);
        let stored = fx.load_expense(expense.id).await;
        assert_eq!(stored.status, ExpenseStatus::Approved);
        assert_eq!(stored.approved_by, won[0]);
    }
    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(100_00));
    assert_eq!(
        fx.notifications(fx.alice.id, "Expense Approved").await.len(),
        5
    );
}

#[tokio::test]
async fn rejection_leaves_ledger_untouched_and_sends_reason() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 200_00).await;
    let expense = fx.submit(&fx.alice, budget.id, 150_00).await;

    let outcome = fx
        .engine
        .reject_expense(&fx.manager, expense.id, Some("duplicate receipt"))
        .await
        .unwrap();
    assert!(!outcome.already_processed);
    assert_eq!(outcome.expense.expense.status, ExpenseStatus::Rejected);
    assert_eq!(outcome.expense.expense.approved_by, Some(fx.manager.id));
    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(200_00));

    let rejected = fx.notifications(fx.alice.id, "Expense Rejected").await;
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].kind, "WARNING");
    assert!(rejected[0].message.contains("duplicate receipt"));

    let replay = fx
        .engine
        .reject_expense(&fx.manager, expense.id, None)
        .await
        .unwrap();
    assert!(replay.already_processed);
    assert_eq!(replay.message().as_deref(), Some("Expense already rejected"));
    assert_eq!(
        fx.notifications(fx.alice.id, "Expense Rejected").await.len(),
        1
    );
}

#[tokio::test]
async fn terminal_states_are_immutable() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;

    let approved = fx.submit(&fx.alice, budget.id, 10_00).await;
    fx.engine
        .approve_expense(&fx.manager, approved.id)
        .await
        .unwrap();
    let err = fx
        .engine
        .reject_expense(&fx.manager, approved.id, Some("too late"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(
        fx.load_expense(approved.id).await.status,
        ExpenseStatus::Approved
    );

    let rejected = fx.submit(&fx.alice, budget.id, 20_00).await;
    fx.engine
        .reject_expense(&fx.manager, rejected.id, None)
        .await
        .unwrap();
    let err = fx
        .engine
        .approve_expense(&fx.admin, rejected.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(
        fx.load_expense(rejected.id).await.status,
        ExpenseStatus::Rejected
    );

    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(10_00));
}

#[tokio::test]
async fn user_cannot_decide() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 10_00).await;

    let err = fx
        .engine
        .approve_expense(&fx.alice, expense.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx
        .engine
        .reject_expense(&fx.alice, expense.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    assert_eq!(
        fx.load_expense(expense.id).await.status,
        ExpenseStatus::Pending
    );
    assert_eq!(fx.load_budget(budget.id).await.spent, Money::ZERO);
}

#[tokio::test]
async fn manager_cannot_decide_outside_department() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 10_00).await;

    let err = fx
        .engine
        .approve_expense(&fx.ops_manager, expense.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(
        fx.load_expense(expense.id).await.status,
        ExpenseStatus::Pending
    );
}

#[tokio::test]
async fn unknown_expense_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .engine
        .approve_expense(&fx.admin, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn approving_against_missing_budget_is_fatal_and_rolled_back() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 10_00).await;

    budgets::Entity::delete_many()
        .filter(budgets::Column::Id.eq(budget.id))
        .exec(&fx.db)
        .await
        .unwrap();

    let err = fx
        .engine
        .approve_expense(&fx.admin, expense.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DataIntegrity(_)));
    assert_eq!(
        fx.load_expense(expense.id).await.status,
        ExpenseStatus::Pending
    );
    assert!(
        fx.notifications(fx.alice.id, "Expense Approved")
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn approval_that_would_overflow_spent_is_refused() {
    let fx = fixture().await;
    let budget = fx.budget(i64::MAX, i64::MAX - 10).await;
    let expense = fx.submit(&fx.alice, budget.id, 100).await;

    let err = fx
        .engine
        .approve_expense(&fx.manager, expense.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(
        fx.load_expense(expense.id).await.status,
        ExpenseStatus::Pending
    );
    assert_eq!(
        fx.load_budget(budget.id).await.spent,
        Money::new(i64::MAX - 10)
    );
    fx.engine.budget(&fx.manager, budget.id).await.unwrap();
    assert!(
        fx.notifications(fx.alice.id, "Expense Approved")
            .await
            .is_empty()
    );

    // the expense stays decidable
    let outcome = fx
        .engine
        .reject_expense(&fx.manager, expense.id, Some("over budget"))
        .await
        .unwrap();
    assert_eq!(outcome.expense.expense.status, ExpenseStatus::Rejected);
}

#[tokio::test]
async fn failing_notifier_does_not_fail_the_decision() {
    let notifier = Arc::new(FailingNotifier::default());
    let fx = fixture_with_notifier(notifier.clone()).await;
    let budget = fx.budget(1000_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 99_99).await;
    let before = notifier.calls.load(Ordering::SeqCst);

    let outcome = fx
        .engine
        .approve_expense(&fx.manager, expense.id)
        .await
        .unwrap();
    assert_eq!(outcome.expense.expense.status, ExpenseStatus::Approved);
    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(99_99));
    assert_eq!(notifier.calls.load(Ordering::SeqCst), before + 1);
}
