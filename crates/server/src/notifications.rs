//! Notification inbox endpoints

use api_types::{
    ApiResponse, PageView,
    notification::{MarkedRead, NotificationListQuery, NotificationView, UnreadCount},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{Actor, Pagination};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{notification_view, page_view},
};

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<PageView<NotificationView>>>, ServerError> {
    let page = state
        .engine
        .list_notifications(&actor, query.read, Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(ApiResponse::ok(page_view(page, notification_view))))
}

pub async fn unread_count(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<UnreadCount>>, ServerError> {
    let unread_count = state.engine.unread_notifications(&actor).await?;
    Ok(Json(ApiResponse::ok(UnreadCount { unread_count })))
}

pub async fn read(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationView>>, ServerError> {
    let notification = state.engine.mark_notification_read(&actor, id).await?;
    Ok(Json(ApiResponse::ok(notification_view(notification))))
}

pub async fn read_all(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<MarkedRead>>, ServerError> {
    let updated = state.engine.mark_all_notifications_read(&actor).await?;
    Ok(Json(
        ApiResponse::ok(MarkedRead { updated }).with_message("All notifications marked as read"),
    ))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.engine.delete_notification(&actor, id).await?;
    Ok(Json(ApiResponse::message("Notification deleted")))
}
