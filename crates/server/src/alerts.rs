//! Alert API endpoints

use std::collections::HashMap;

use api_types::alert::{AlertEvaluate, AlertListResponse, AlertRefresh};
use axum::{Extension, Json, extract::State};
use engine::MonthPeriod;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views,
};

/// Handle alert evaluation against statuses the client remembers
pub async fn evaluate(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AlertEvaluate>,
) -> Result<Json<AlertListResponse>, ServerError> {
    let period: MonthPeriod = payload.month.parse()?;
    let previous: HashMap<_, _> = payload
        .previous
        .into_iter()
        .map(|(category_id, status)| (category_id, views::engine_status(status)))
        .collect();

    let events = state
        .engine
        .evaluate_alerts(user.0, period, &previous)
        .await?;
    Ok(Json(AlertListResponse {
        alerts: events.iter().map(views::alert).collect(),
    }))
}

/// Handle alert evaluation against the server's last observed statuses
pub async fn refresh(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AlertRefresh>,
) -> Result<Json<AlertListResponse>, ServerError> {
    let period: MonthPeriod = payload.month.parse()?;
    let events = state.engine.refresh_alerts(user.0, period).await?;
    Ok(Json(AlertListResponse {
        alerts: events.iter().map(views::alert).collect(),
    }))
}
