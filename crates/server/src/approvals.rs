//! Approval queue endpoints. Decisions go through the same coordinator as
//! the `/expenses/{id}/approve|reject` routes.

use api_types::{
    ApiResponse, PageQuery, PageView,
    expense::{ExpenseView, RejectBody},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{Actor, Pagination};
use uuid::Uuid;

use crate::{
    ServerError,
    expenses::decision_response,
    server::ServerState,
    views::{expense_view, page_view},
};

pub async fn pending(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PageView<ExpenseView>>>, ServerError> {
    let page = state
        .engine
        .pending_approvals(&actor, Pagination::new(query.page, query.limit))
        .await?;
    Ok(Json(ApiResponse::ok(page_view(page, expense_view))))
}

pub async fn approve(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ExpenseView>>, ServerError> {
    let outcome = state.engine.approve_expense(&actor, id).await?;
    Ok(decision_response(outcome, "Expense approved successfully"))
}

pub async fn reject(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<RejectBody>>,
) -> Result<Json<ApiResponse<ExpenseView>>, ServerError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let outcome = state
        .engine
        .reject_expense(&actor, id, reason.as_deref())
        .await?;
    Ok(decision_response(outcome, "Expense rejected successfully"))
}
