//! Core types for vocabulary study.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scheduler::Scheduler;

/// Learning status of a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyStatus {
    Learning,
    Reviewing,
    Mastered,
}

impl StudyStatus {
    /// Get the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Reviewing => "reviewing",
            Self::Mastered => "mastered",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "learning" => Some(Self::Learning),
            "reviewing" => Some(Self::Reviewing),
            "mastered" => Some(Self::Mastered),
            _ => None,
        }
    }
}

/// JLPT level, from the easiest (N5) to the hardest (N1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl JlptLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N5 => "N5",
            Self::N4 => "N4",
            Self::N3 => "N3",
            Self::N2 => "N2",
            Self::N1 => "N1",
        }
    }

    /// Parse from string, accepting lowercase input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N5" => Some(Self::N5),
            "N4" => Some(Self::N4),
            "N3" => Some(Self::N3),
            "N2" => Some(Self::N2),
            "N1" => Some(Self::N1),
            _ => None,
        }
    }
}

/// Anything the scheduler can pick for review.
pub trait StudyItem {
    fn item_id(&self) -> i64;
}

impl StudyItem for i64 {
    fn item_id(&self) -> i64 {
        *self
    }
}

/// Per-(user, item) review progress.
///
/// Serialized in camelCase with RFC 3339 timestamps so stores exported from
/// the browser client load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub status: StudyStatus,
    pub last_reviewed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    pub repetitions: u32,
    pub ease_factor: f64,
    pub interval: u32,
}

impl Progress {
    /// Whether the item is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// Check the record invariants against the default scheduler.
    ///
    /// Records written by a scheduler with other parameters are checked
    /// with [`Scheduler::validate`] instead.
    pub fn validate(&self) -> Result<()> {
        Scheduler::default().validate(self)
    }
}

/// One user's progress records keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressStore {
    records: BTreeMap<i64, Progress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: i64) -> Option<&Progress> {
        self.records.get(&item_id)
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert(&mut self, item_id: i64, progress: Progress) -> Option<Progress> {
        self.records.insert(item_id, progress)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending item id order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Progress)> {
        self.records.iter().map(|(id, p)| (*id, p))
    }

    /// Validate every record against the default scheduler, reporting the
    /// first offending item.
    pub fn validate(&self) -> Result<()> {
        Scheduler::default().validate_store(self)
    }
}

impl FromIterator<(i64, Progress)> for ProgressStore {
    fn from_iter<I: IntoIterator<Item = (i64, Progress)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Counts of tracked items by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub learning: usize,
    pub reviewing: usize,
    pub mastered: usize,
    pub due_today: usize,
}
