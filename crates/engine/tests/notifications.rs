mod common;

use common::fixture;
use engine::{EngineError, NotificationKind, Pagination};

#[tokio::test]
async fn inbox_belongs_to_its_recipient() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    let expense = fx.submit(&fx.alice, budget.id, 10_00).await;
    fx.engine
        .approve_expense(&fx.manager, expense.id)
        .await
        .unwrap();

    // "New Budget Created" + "Expense Approved"
    let inbox = fx
        .engine
        .list_notifications(&fx.alice, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(inbox.total, 2);
    assert_eq!(inbox.data[0].title, "Expense Approved");
    assert_eq!(inbox.data[0].kind, NotificationKind::Info);
    assert!(inbox.data.iter().all(|n| n.user_id == fx.alice.id && !n.read));

    let approved = inbox.data[0].id;
    let err = fx
        .engine
        .mark_notification_read(&fx.bob, approved)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let err = fx
        .engine
        .delete_notification(&fx.bob, approved)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let read = fx
        .engine
        .mark_notification_read(&fx.alice, approved)
        .await
        .unwrap();
    assert!(read.read);
    assert_eq!(fx.engine.unread_notifications(&fx.alice).await.unwrap(), 1);

    let unread = fx
        .engine
        .list_notifications(&fx.alice, Some(false), Pagination::default())
        .await
        .unwrap();
    assert_eq!(unread.total, 1);
    assert_eq!(unread.data[0].title, "New Budget Created");

    fx.engine
        .delete_notification(&fx.alice, approved)
        .await
        .unwrap();
    let inbox = fx
        .engine
        .list_notifications(&fx.alice, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(inbox.total, 1);
}

#[tokio::test]
async fn mark_all_read_counts_changed_rows() {
    let fx = fixture().await;
    let budget = fx.budget(1000_00, 0).await;
    fx.submit(&fx.alice, budget.id, 10_00).await;
    fx.submit(&fx.alice, budget.id, 20_00).await;

    // the budget announcement plus two approval requests
    assert_eq!(fx.engine.unread_notifications(&fx.manager).await.unwrap(), 3);
    assert_eq!(
        fx.engine
            .mark_all_notifications_read(&fx.manager)
            .await
            .unwrap(),
        3
    );
    assert_eq!(fx.engine.unread_notifications(&fx.manager).await.unwrap(), 0);
    assert_eq!(
        fx.engine
            .mark_all_notifications_read(&fx.manager)
            .await
            .unwrap(),
        0
    );
    // other inboxes are untouched
    assert_eq!(fx.engine.unread_notifications(&fx.admin).await.unwrap(), 2);
}
