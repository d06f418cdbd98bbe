//! Expense API endpoints

use api_types::{
    ApiResponse, PageView,
    expense::{ExpenseListQuery, ExpenseNew, ExpenseUpdate, ExpenseView, RejectBody},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Actor, ApprovalOutcome, Money, Pagination};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{expense_view, page_view, parse_expense_status},
};

/// Wraps a coordinator outcome; replays carry the "already processed" note.
pub(crate) fn decision_response(
    outcome: ApprovalOutcome,
    applied_message: &str,
) -> Json<ApiResponse<ExpenseView>> {
    let message = outcome
        .message()
        .unwrap_or_else(|| applied_message.to_string());
    Json(ApiResponse::ok(expense_view(outcome.expense)).with_message(message))
}

/// Handle requests for submitting a new expense
pub async fn submit(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseView>>), ServerError> {
    let mut cmd = engine::ExpenseNew::new(
        payload.budget_id,
        Money::new(payload.amount_minor),
        payload.description,
    );
    if let Some(url) = payload.receipt_url {
        cmd = cmd.receipt_url(url);
    }
    let detail = state.engine.submit_expense(&actor, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(expense_view(detail)).with_message("Expense created successfully")),
    ))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ApiResponse<PageView<ExpenseView>>>, ServerError> {
    let filter = engine::ExpenseListFilter {
        budget_id: query.budget_id,
        user_id: query.user_id,
        status: query.status.map(parse_expense_status),
    };
    let page = state
        .engine
        .list_expenses(&actor, &filter, Pagination::new(query.page, query.limit))
        .await?;

    Ok(Json(ApiResponse::ok(page_view(page, expense_view))))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ExpenseView>>, ServerError> {
    let detail = state.engine.expense(&actor, id).await?;
    Ok(Json(ApiResponse::ok(expense_view(detail))))
}

/// Handle requests for editing a pending expense
pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ApiResponse<ExpenseView>>, ServerError> {
    let update = engine::ExpenseUpdate {
        amount: payload.amount_minor.map(Money::new),
        description: payload.description,
        receipt_url: payload.receipt_url,
    };
    let detail = state.engine.update_expense(&actor, id, update).await?;
    Ok(Json(
        ApiResponse::ok(expense_view(detail)).with_message("Expense updated successfully"),
    ))
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
