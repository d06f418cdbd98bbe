//! Budget API endpoints

use api_types::{
    ApiResponse, PageView,
    budget::{BudgetListQuery, BudgetNew, BudgetUpdate, BudgetView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Actor, Money, Pagination};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{budget_view, page_view, parse_budget_status, parse_period},
};

/// Handle requests for creating a budget
pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetView>>), ServerError> {
    let mut cmd = engine::BudgetNew::new(
        payload.name,
        payload.category_id,
        Money::new(payload.amount_minor),
        parse_period(payload.period),
        payload.start_date,
        payload.end_date,
    );
    if let Some(department_id) = payload.department_id {
        cmd = cmd.department_id(department_id);
    }
    if let Some(owner_id) = payload.owner_id {
        cmd = cmd.owner_id(owner_id);
    }
    let detail = state.engine.create_budget(&actor, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(budget_view(detail)).with_message("Budget created successfully")),
    ))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetListQuery>,
) -> Result<Json<ApiResponse<PageView<BudgetView>>>, ServerError> {
    let filter = engine::BudgetListFilter {
        department_id: query.department_id,
        category_id: query.category_id,
        status: query.status.map(parse_budget_status),
        search: query.search,
    };
    let page = state
        .engine
        .list_budgets(&actor, &filter, Pagination::new(query.page, query.limit))
        .await?;

    Ok(Json(ApiResponse::ok(page_view(page, budget_view))))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BudgetView>>, ServerError> {
    let detail = state.engine.budget(&actor, id).await?;
    Ok(Json(ApiResponse::ok(budget_view(detail))))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<ApiResponse<BudgetView>>, ServerError> {
    let update = engine::BudgetUpdate {
        name: payload.name,
        amount: payload.amount_minor.map(Money::new),
        period: payload.period.map(parse_period),
        start_date: payload.start_date,
        end_date: payload.end_date,
    };
    let detail = state.engine.update_budget(&actor, id, update).await?;
    Ok(Json(
        ApiResponse::ok(budget_view(detail)).with_message("Budget updated successfully"),
    ))
}

/// Archives the budget; it stays readable.
pub async fn archive(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    state.engine.archive_budget(&actor, id).await?;
    Ok(Json(ApiResponse::message("Budget archived successfully")))
}
