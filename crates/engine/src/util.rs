//! Internal helpers shared by the engine services and the sea-orm adapters.
//!
//! These utilities are **not** part of the public API.

use std::{future::Future, time::Duration};

use sea_orm::{DbErr, SqlErr};

use crate::{EngineError, ResultEngine};

/// Awaits a collaborator call, failing with `DataUnavailable` once `timeout`
/// elapses. The pending call is dropped, so nothing after it runs.
pub(crate) async fn bounded<T, F>(timeout: Duration, what: &str, call: F) -> ResultEngine<T>
where
    F: Future<Output = ResultEngine<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{what} timed out after {}ms", timeout.as_millis());
            Err(EngineError::DataUnavailable(format!(
                "{what} timed out after {}ms",
                timeout.as_millis()
            )))
        }
    }
}

/// Maps a storage error: connectivity problems become `DataUnavailable`,
/// everything else stays a database fault.
pub(crate) fn storage_error(err: DbErr) -> EngineError {
    match &err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            tracing::warn!("storage unreachable: {err}");
            EngineError::DataUnavailable(err.to_string())
        }
        _ => EngineError::Database(err),
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
