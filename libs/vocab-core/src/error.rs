//! Error types for vocab-core.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using ProgressError.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Reasons a stored progress record is rejected when it is loaded.
#[derive(Debug, Error, PartialEq)]
pub enum ProgressError {
    #[error("ease factor {value} is below the minimum of {minimum}")]
    EaseFactorTooLow { value: f64, minimum: f64 },

    #[error("ease factor is not a finite number")]
    NonFiniteEaseFactor,

    #[error("interval must be at least one day")]
    ZeroInterval,

    #[error("repetitions must be at least one")]
    ZeroRepetitions,

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("status {status} does not match {repetitions} repetitions")]
    StatusMismatch {
        status: &'static str,
        repetitions: u32,
    },

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("next review {next_review} precedes last review {last_reviewed}")]
    ReviewOrder {
        last_reviewed: DateTime<Utc>,
        next_review: DateTime<Utc>,
    },

    #[error("item {item_id}: {source}")]
    Item {
        item_id: i64,
        #[source]
        source: Box<ProgressError>,
    },
}
