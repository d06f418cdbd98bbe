#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};

use engine::{
    Actor, Budget, BudgetNew, BudgetPeriod, Engine, EngineError, Expense, ExpenseNew, Money,
    NotificationNew, Notifier, Role, budgets, categories, departments, notifications, users,
};
use migration::MigratorTrait;
use uuid::Uuid;

/// Two departments (sales, ops), one category and one actor per role:
/// `admin`, `manager` (sales), `ops_manager`, `alice` (sales user),
/// `bob` (ops user).
pub struct Fixture {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub sales: Uuid,
    pub ops: Uuid,
    pub travel: Uuid,
    pub admin: Actor,
    pub manager: Actor,
    pub ops_manager: Actor,
    pub alice: Actor,
    pub bob: Actor,
}

/// Notifier that always fails and counts how often it was called.
#[derive(Default)]
pub struct FailingNotifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: NotificationNew) -> Result<(), EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EngineError::InvalidInput("mail server down".to_string()))
    }
}

/// SQLite file in the system temp dir, removed on drop. Unlike
/// `sqlite::memory:`, it is served by a pool of several connections.
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("budgetflow-{}.db", Uuid::new_v4())),
        }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub async fn fixture() -> Fixture {
    fixture_inner("sqlite::memory:", None).await
}

pub async fn fixture_at(url: &str) -> Fixture {
    fixture_inner(url, None).await
}

pub async fn fixture_with_notifier(notifier: Arc<dyn Notifier>) -> Fixture {
    fixture_inner("sqlite::memory:", Some(notifier)).await
}

async fn fixture_inner(url: &str, notifier: Option<Arc<dyn Notifier>>) -> Fixture {
    let db = Database::connect(url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let sales = insert_department(&db, "Sales", "SAL").await;
    let ops = insert_department(&db, "Operations", "OPS").await;
    let travel = Uuid::new_v4();
    categories::ActiveModel {
        id: Set(travel),
        name: Set("Travel".to_string()),
    }
    .insert(&db)
    .await
    .unwrap();

    let admin = insert_user(&db, "admin", Role::Admin, None).await;
    let manager = insert_user(&db, "manager", Role::Manager, Some(sales)).await;
    let ops_manager = insert_user(&db, "ops_manager", Role::Manager, Some(ops)).await;
    let alice = insert_user(&db, "alice", Role::User, Some(sales)).await;
    let bob = insert_user(&db, "bob", Role::User, Some(ops)).await;

    let mut builder = Engine::builder().database(db.clone());
    if let Some(notifier) = notifier {
        builder = builder.notifier(notifier);
    }
    let engine = Arc::new(builder.build().await.unwrap());

    Fixture {
        engine,
        db,
        sales,
        ops,
        travel,
        admin,
        manager,
        ops_manager,
        alice,
        bob,
    }
}

async fn insert_department(db: &DatabaseConnection, name: &str, code: &str) -> Uuid {
    let id = Uuid::new_v4();
    departments::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        code: Set(code.to_string()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub async fn insert_user(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
    department_id: Option<Uuid>,
) -> Actor {
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(format!("{name}@example.com")),
        password: Set("password".to_string()),
        role: Set(role.as_str().to_string()),
        department_id: Set(department_id),
        active: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
    Actor::new(id, role, department_id)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

impl Fixture {
    /// A sales budget owned by the sales manager, with `spent` preset.
    pub async fn budget(&self, amount: i64, spent: i64) -> Budget {
        self.budget_in(self.sales, "Travel", amount, spent).await
    }

    pub async fn budget_in(
        &self,
        department_id: Uuid,
        name: &str,
        amount: i64,
        spent: i64,
    ) -> Budget {
        let detail = self
            .engine
            .create_budget(
                &self.admin,
                BudgetNew::new(
                    name,
                    self.travel,
                    Money::new(amount),
                    BudgetPeriod::Yearly,
                    date(2026, 1, 1),
                    date(2026, 12, 31),
                )
                .department_id(department_id),
            )
            .await
            .unwrap();
        if spent != 0 {
            budgets::Entity::update_many()
                .col_expr(budgets::Column::SpentMinor, Expr::value(spent))
                .filter(budgets::Column::Id.eq(detail.budget.id))
                .exec(&self.db)
                .await
                .unwrap();
        }
        self.load_budget(detail.budget.id).await
    }

    pub async fn load_budget(&self, budget_id: Uuid) -> Budget {
        let model = budgets::Entity::find_by_id(budget_id)
            .one(&self.db)
            .await
            .unwrap()
            .unwrap();
        Budget::try_from(model).unwrap()
    }

    pub async fn load_expense(&self, expense_id: Uuid) -> Expense {
        let model = engine::expenses::Entity::find_by_id(expense_id)
            .one(&self.db)
            .await
            .unwrap()
            .unwrap();
        Expense::try_from(model).unwrap()
    }

    pub async fn submit(&self, actor: &Actor, budget_id: Uuid, amount: i64) -> Expense {
        self.engine
            .submit_expense(
                actor,
                ExpenseNew::new(budget_id, Money::new(amount), "Client dinner"),
            )
            .await
            .unwrap()
            .expense
    }

    /// Notifications stored for `user_id` with the given title.
    pub async fn notifications(&self, user_id: Uuid, title: &str) -> Vec<notifications::Model> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::Title.eq(title))
            .all(&self.db)
            .await
            .unwrap()
    }
}
