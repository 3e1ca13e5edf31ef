//! Core vocabulary study library shared by the backend and its clients.
//!
//! Provides:
//! - Review scheduler (simplified SM-2 with ease factors)
//! - Due selection and aggregate statistics over a progress store
//! - Daily study streak tracking
//! - Shared types (Progress, ProgressStore, StudyStatus, JlptLevel, etc.)

pub mod error;
pub mod scheduler;
pub mod streak;
pub mod types;

pub use error::{ProgressError, Result};
pub use scheduler::{aggregate_stats, compute_next_review, select_due, Scheduler};
pub use streak::StudyStreak;
pub use types::{JlptLevel, Progress, ProgressStore, StudyItem, StudyStats, StudyStatus};
