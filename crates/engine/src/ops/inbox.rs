//! The recipient's view of their notifications. Every query is keyed on the
//! actor, so another user's notification id simply does not resolve.

use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{Actor, EngineError, Notification, Page, Pagination, ResultEngine, notifications};

use super::Engine;

impl Engine {
    pub async fn list_notifications(
        &self,
        actor: &Actor,
        read: Option<bool>,
        pagination: Pagination,
    ) -> ResultEngine<Page<Notification>> {
        let mut query =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(actor.id));
        if let Some(read) = read {
            query = query.filter(notifications::Column::Read.eq(read));
        }

        let total = query.clone().count(&self.database).await?;
        let data = query
            .order_by_desc(notifications::Column::CreatedAt)
            .offset(pagination.offset())
            .limit(pagination.limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Page::new(data, total, pagination))
    }

    /// Number of unread notifications.
    pub async fn unread_notifications(&self, actor: &Actor) -> ResultEngine<u64> {
        Ok(notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(actor.id))
            .filter(notifications::Column::Read.eq(false))
            .count(&self.database)
            .await?)
    }

    pub async fn mark_notification_read(
        &self,
        actor: &Actor,
        notification_id: Uuid,
    ) -> ResultEngine<Notification> {
        let model = notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::UserId.eq(actor.id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("notification not exists".to_string()))?;
        if model.read {
            return Notification::try_from(model);
        }

        let mut active: notifications::ActiveModel = model.into();
        active.read = sea_orm::ActiveValue::Set(true);
        active.updated_at = sea_orm::ActiveValue::Set(Utc::now());
        Notification::try_from(active.update(&self.database).await?)
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_notifications_read(&self, actor: &Actor) -> ResultEngine<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .col_expr(notifications::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(notifications::Column::UserId.eq(actor.id))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.database)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_notification(
        &self,
        actor: &Actor,
        notification_id: Uuid,
    ) -> ResultEngine<()> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::Id.eq(notification_id))
            .filter(notifications::Column::UserId.eq(actor.id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(
                "notification not exists".to_string(),
            ));
        }
        Ok(())
    }
}
