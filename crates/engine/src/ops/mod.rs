use std::{fmt, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{Actor, DbNotifier, EngineError, NotificationNew, Notifier, ResultEngine};

mod approvals;
mod budgets;
mod detail;
mod expenses;
mod inbox;
mod ledger;

pub use approvals::ApprovalOutcome;
pub use detail::{BudgetDetail, BudgetRef, ExpenseDetail, NamedRef, UserRef};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Dispatches a notification, logging and dropping any failure.
    async fn emit(&self, notification: NotificationNew) {
        let recipient = notification.recipient_id;
        let title = notification.title.clone();
        if let Err(err) = self.notifier.notify(notification).await {
            tracing::warn!(%recipient, %title, "notification dropped: {err}");
        }
    }
}

/// Role gate for workflow decisions and budget administration. Department
/// scope is checked separately.
fn require_decider(actor: &Actor, action: &str) -> ResultEngine<()> {
    if !actor.role.can_decide() {
        return Err(EngineError::Forbidden(format!(
            "only ADMIN or MANAGER can {action}"
        )));
    }
    Ok(())
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default database-backed notifier.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(DbNotifier::new(self.database.clone())));
        Ok(Engine {
            database: self.database,
            notifier,
        })
    }
}
