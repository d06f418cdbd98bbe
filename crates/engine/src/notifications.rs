//! Notifications and the emitter used by the approval workflow.
//!
//! Dispatch is best-effort: callers log a failed [`Notifier::notify`] and
//! carry on. A notification is never part of the database transaction that
//! moves an expense or the budget ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    #[default]
    Info,
    Warning,
    Action,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Action => "ACTION",
        }
    }
}

impl TryFrom<&str> for NotificationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ACTION" => Ok(Self::Action),
            other => Err(EngineError::InvalidInput(format!(
                "invalid notification type: {other}"
            ))),
        }
    }
}

/// A notification waiting to be delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationNew {
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

impl NotificationNew {
    pub fn new(
        recipient_id: Uuid,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            recipient_id,
            title: title.into(),
            message: message.into(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Side channel informing users about expense state changes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: NotificationNew) -> ResultEngine<()>;
}

/// Stores notifications in the `notifications` table, where the inbox
/// operations read them back.
#[derive(Clone, Debug)]
pub struct DbNotifier {
    database: DatabaseConnection,
}

impl DbNotifier {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Notifier for DbNotifier {
    async fn notify(&self, notification: NotificationNew) -> ResultEngine<()> {
        let now = Utc::now();
        let model = ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(notification.recipient_id),
            title: ActiveValue::Set(notification.title),
            message: ActiveValue::Set(notification.message),
            kind: ActiveValue::Set(notification.kind.as_str().to_string()),
            read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        model.insert(&self.database).await?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub read: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = NotificationKind::try_from(model.kind.as_str()).map_err(|_| {
            EngineError::DataIntegrity(format!("notification {} has invalid type", model.id))
        })?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            message: model.message,
            kind,
            read: model.read,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
