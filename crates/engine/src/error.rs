//! The module contains the errors the engine can return.
//!
//! Validation failures ([`InvalidLimit`], [`ImmutableField`], [`InvalidPeriod`])
//! are surfaced to the caller for correction. [`DuplicateBudget`] tells the
//! caller to switch to the update flow. [`DataUnavailable`] means a
//! collaborator (ledger or store) could not be reached in time; retrying is
//! up to the caller.
//!
//!  [`InvalidLimit`]: EngineError::InvalidLimit
//!  [`ImmutableField`]: EngineError::ImmutableField
//!  [`InvalidPeriod`]: EngineError::InvalidPeriod
//!  [`DuplicateBudget`]: EngineError::DuplicateBudget
//!  [`DataUnavailable`]: EngineError::DataUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
    #[error("Budget already exists: {0}")]
    DuplicateBudget(String),
    #[error("\"{0}\" cannot be changed once the budget exists")]
    ImmutableField(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidLimit(a), Self::InvalidLimit(b)) => a == b,
            (Self::DuplicateBudget(a), Self::DuplicateBudget(b)) => a == b,
            (Self::ImmutableField(a), Self::ImmutableField(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::DataUnavailable(a), Self::DataUnavailable(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidThreshold(a), Self::InvalidThreshold(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
