use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{router, run, run_with_listener, spawn_with_listener};

mod alerts;
mod budgets;
mod server;
mod views;

pub mod types {
    pub mod budget {
        pub use api_types::budget::{
            BudgetNew, BudgetSnapshotView, BudgetUpdate, BudgetView, CategoryView,
            MonthSummaryView, SnapshotResponse,
        };
    }

    pub mod alert {
        pub use api_types::alert::{
            AlertEvaluate, AlertEventView, AlertKind, AlertListResponse, AlertRefresh, Severity,
        };
    }

    pub use api_types::{BudgetStatus, Currency, MonthQuery};
}

/// Engine failure rendered as a status code and a JSON `{ "error": ... }` body.
pub struct ServerError(EngineError);

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateBudget(_) => StatusCode::CONFLICT,
        EngineError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidLimit(_)
        | EngineError::ImmutableField(_)
        | EngineError::InvalidPeriod(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidThreshold(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::DataUnavailable(reason) => {
            tracing::warn!("data unavailable: {reason}");
            "budget data is temporarily unavailable, try again later".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for_engine_error(&self.0);
        let error = message_for_engine_error(self.0);

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self(value)
    }
}
