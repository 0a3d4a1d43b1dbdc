//! Budget API endpoints

use api_types::{
    MonthQuery,
    budget::{BudgetNew, BudgetUpdate, BudgetView, MonthSummaryView, SnapshotResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{BudgetId, BudgetSnapshot, Engine, Money, MonthPeriod};

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views,
};

async fn snapshot_response(engine: &Engine, snapshots: Vec<BudgetSnapshot>) -> SnapshotResponse {
    let categories = engine.categories_for(&snapshots).await;
    SnapshotResponse {
        budgets: snapshots
            .iter()
            .map(|snapshot| views::snapshot(snapshot, &categories))
            .collect(),
    }
}

/// Handle requests for the budgets of one month
pub async fn snapshot(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<SnapshotResponse>, ServerError> {
    let period: MonthPeriod = query.month.parse()?;
    let snapshots = state.engine.snapshot(user.0, period).await?;
    Ok(Json(snapshot_response(&state.engine, snapshots).await))
}

/// Handle requests for every budget of the user
pub async fn list_all(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<SnapshotResponse>, ServerError> {
    let snapshots = state.engine.list_all(user.0).await?;
    Ok(Json(snapshot_response(&state.engine, snapshots).await))
}

pub async fn summary(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthSummaryView>, ServerError> {
    let period: MonthPeriod = query.month.parse()?;
    let summary = state.engine.summary(user.0, period).await?;
    Ok(Json(views::summary(&summary)))
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<BudgetId>,
) -> Result<Json<api_types::budget::BudgetSnapshotView>, ServerError> {
    let snapshot = state.engine.budget(user.0, id).await?;
    let categories = state
        .engine
        .categories_for(std::slice::from_ref(&snapshot))
        .await;
    Ok(Json(views::snapshot(&snapshot, &categories)))
}

/// Handle requests for creating a new budget
pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let period: MonthPeriod = payload.month.parse()?;
    let budget = state
        .engine
        .create_budget(
            user.0,
            payload.category_id,
            period,
            Money::new(payload.limit_minor),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(views::budget(&budget))))
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<BudgetId>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let period = payload
        .month
        .as_deref()
        .map(str::parse::<MonthPeriod>)
        .transpose()?;
    let budget = state
        .engine
        .update_budget(
            user.0,
            id,
            engine::BudgetUpdate {
                limit: Money::new(payload.limit_minor),
                category_id: payload.category_id,
                period,
            },
        )
        .await?;
    Ok(Json(views::budget(&budget)))
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(id): Path<BudgetId>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(user.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
