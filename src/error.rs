use thiserror::Error;

/// The device refused, or could not provide, its current position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("location unavailable: {reason}")]
pub struct LocationUnavailable {
    pub reason: String,
}

impl LocationUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
}

/// Failures of the underlying key/value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage quota exceeded: {needed} bytes > {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("storage is disabled")]
    Disabled,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persisted record that cannot be turned back into a workout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("workout {id}: missing {field}")]
pub struct MalformedRecord {
    pub id: String,
    pub field: &'static str,
}
