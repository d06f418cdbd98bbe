mod common;

use common::fixture;
use engine::{
    EngineError, ExpenseListFilter, ExpenseNew, ExpenseStatus, ExpenseUpdate, Money, Pagination,
};

#[tokio::test]
async fn submission_is_pending_and_notifies_approvers() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;

    let detail = fx
        .engine
        .submit_expense(
            &fx.alice,
            ExpenseNew::new(budget.id, Money::new(42_50), " Train ticket ")
                .receipt_url("https://receipts.example.com/1.pdf"),
        )
        .await
        .unwrap();
    assert_eq!(detail.expense.status, ExpenseStatus::Pending);
    assert_eq!(detail.expense.user_id, fx.alice.id);
    assert_eq!(detail.expense.description, "Train ticket");
    assert_eq!(detail.expense.approved_by, None);
    assert_eq!(detail.budget.as_ref().map(|b| b.name.as_str()), Some("Travel"));
    assert_eq!(detail.user.as_ref().map(|u| u.name.as_str()), Some("alice"));

    let title = "Expense Awaiting Approval";
    let to_manager = fx.notifications(fx.manager.id, title).await;
    assert_eq!(to_manager.len(), 1);
    assert_eq!(to_manager[0].kind, "ACTION");
    assert_eq!(
        to_manager[0].message,
        "alice submitted an expense of 42.50 for \"Train ticket\" that requires your approval."
    );
    assert_eq!(fx.notifications(fx.admin.id, title).await.len(), 1);
    assert!(fx.notifications(fx.ops_manager.id, title).await.is_empty());
    assert!(fx.notifications(fx.alice.id, title).await.is_empty());
}

#[tokio::test]
async fn submission_requires_positive_amount_and_visible_budget() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;

    for amount in [0, -10_00] {
        let err = fx
            .engine
            .submit_expense(
                &fx.alice,
                ExpenseNew::new(budget.id, Money::new(amount), "Taxi"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    let err = fx
        .engine
        .submit_expense(&fx.bob, ExpenseNew::new(budget.id, Money::new(5_00), "Taxi"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .submit_expense(
            &fx.alice,
            ExpenseNew::new(uuid::Uuid::new_v4(), Money::new(5_00), "Taxi"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn expense_lists_are_role_scoped() {
    let fx = fixture().await;
    let sales = fx.budget_in(fx.sales, "Sales Travel", 1000_00, 0).await;
    let ops = fx.budget_in(fx.ops, "Ops Tooling", 1000_00, 0).await;
    let mine = fx.submit(&fx.alice, sales.id, 10_00).await;
    let by_manager = fx.submit(&fx.manager, sales.id, 20_00).await;
    let theirs = fx.submit(&fx.bob, ops.id, 30_00).await;
    let all = ExpenseListFilter::default();

    let page = fx
        .engine
        .list_expenses(&fx.admin, &all, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);

    let page = fx
        .engine
        .list_expenses(&fx.manager, &all, Pagination::default())
        .await
        .unwrap();
    let mut ids: Vec<_> = page.data.iter().map(|d| d.expense.id).collect();
    ids.sort();
    let mut expected = vec![mine.id, by_manager.id];
    expected.sort();
    assert_eq!(ids, expected);

    let page = fx
        .engine
        .list_expenses(&fx.alice, &all, Pagination::default())
        .await
        .unwrap();
    let ids: Vec<_> = page.data.iter().map(|d| d.expense.id).collect();
    assert_eq!(ids, vec![mine.id]);

    let err = fx.engine.expense(&fx.alice, theirs.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let err = fx
        .engine
        .expense(&fx.manager, theirs.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    fx.engine.expense(&fx.ops_manager, theirs.id).await.unwrap();
}

#[tokio::test]
async fn pending_approvals_for_deciders_only() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    let first = fx.submit(&fx.alice, budget.id, 10_00).await;
    let second = fx.submit(&fx.alice, budget.id, 20_00).await;
    fx.engine
        .reject_expense(&fx.manager, first.id, None)
        .await
        .unwrap();

    let page = fx
        .engine
        .pending_approvals(&fx.manager, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].expense.id, second.id);

    let page = fx
        .engine
        .pending_approvals(&fx.ops_manager, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let err = fx
        .engine
        .pending_approvals(&fx.alice, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn list_pagination_reports_totals() {
    let fx = fixture().await;
    let budget = fx.budget(10_000_00, 0).await;
    for amount in 1..=5 {
        fx.submit(&fx.alice, budget.id, amount * 100).await;
    }

    let page = fx
        .engine
        .list_expenses(
            &fx.alice,
            &ExpenseListFilter::default(),
            Pagination::new(Some(2), Some(2)),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next_page);
    assert!(page.has_prev_page);

    let filtered = ExpenseListFilter {
        status: Some(ExpenseStatus::Approved),
        ..Default::default()
    };
    let page = fx
        .engine
        .list_expenses(&fx.alice, &filtered, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 0);
    assert!(!page.has_next_page);
}

#[tokio::test]
async fn out_of_range_page_is_empty() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    fx.submit(&fx.alice, budget.id, 10_00).await;

    let page = fx
        .engine
        .list_expenses(
            &fx.admin,
            &ExpenseListFilter::default(),
            Pagination::new(Some(u64::MAX), Some(100)),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.data.is_empty());
    assert!(!page.has_next_page);
    assert!(page.has_prev_page);
}

#[tokio::test]
async fn only_pending_expenses_are_editable() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 10_00).await;

    let detail = fx
        .engine
        .update_expense(
            &fx.alice,
            expense.id,
            ExpenseUpdate {
                amount: Some(Money::new(12_00)),
                description: Some("Taxi to airport".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(detail.expense.amount, Money::new(12_00));
    assert_eq!(detail.expense.description, "Taxi to airport");

    let err = fx
        .engine
        .update_expense(
            &fx.bob,
            expense.id,
            ExpenseUpdate {
                amount: Some(Money::new(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    fx.engine
        .approve_expense(&fx.manager, expense.id)
        .await
        .unwrap();
    let err = fx
        .engine
        .update_expense(
            &fx.alice,
            expense.id,
            ExpenseUpdate {
                amount: Some(Money::new(99_00)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(fx.load_expense(expense.id).await.amount, Money::new(12_00));
    assert_eq!(fx.load_budget(budget.id).await.spent, Money::new(12_00));
}
