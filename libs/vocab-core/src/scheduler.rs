//! Review scheduler.
//!
//! A simplified SM-2: a binary pass/fail outcome adjusts the ease factor,
//! and the ease factor drives interval growth once an item has been answered
//! correctly twice in a row.

use chrono::{DateTime, Duration, Utc};

use crate::error::{ProgressError, Result};
use crate::types::{Progress, ProgressStore, StudyItem, StudyStats, StudyStatus};

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MINIMUM_EASE_FACTOR: f64 = 1.3;
pub const EASE_BONUS: f64 = 0.15;
pub const EASE_PENALTY: f64 = 0.2;
pub const MASTERY_REPETITIONS: u32 = 4;

/// Scheduler parameters.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub ease_bonus: f64,
    pub ease_penalty: f64,
    /// Interval in days after the second correct answer in a row.
    pub second_interval: u32,
    pub mastery_repetitions: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            initial_ease: INITIAL_EASE_FACTOR,
            minimum_ease: MINIMUM_EASE_FACTOR,
            ease_bonus: EASE_BONUS,
            ease_penalty: EASE_PENALTY,
            second_interval: 3,
            mastery_repetitions: MASTERY_REPETITIONS,
        }
    }
}

impl Scheduler {
    /// Record for an item reviewed for the first time.
    ///
    /// The outcome of a first exposure does not matter: the item always
    /// enters `learning` and comes back tomorrow.
    pub fn initial_progress(&self, now: DateTime<Utc>) -> Progress {
        Progress {
            status: StudyStatus::Learning,
            last_reviewed: now,
            next_review: add_days(now, 1),
            repetitions: 1,
            ease_factor: self.initial_ease,
            interval: 1,
        }
    }

    /// Compute the record that follows a review.
    pub fn next_review(
        &self,
        previous: Option<&Progress>,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> Progress {
        let Some(previous) = previous else {
            return self.initial_progress(now);
        };

        let (status, repetitions, ease_factor, interval) = if was_correct {
            self.schedule_correct(previous)
        } else {
            self.schedule_incorrect(previous)
        };

        Progress {
            status,
            last_reviewed: now,
            next_review: add_days(now, interval),
            repetitions,
            ease_factor,
            interval,
        }
    }

    fn schedule_correct(&self, previous: &Progress) -> (StudyStatus, u32, f64, u32) {
        let repetitions = previous.repetitions.saturating_add(1);
        let ease = (previous.ease_factor + self.ease_bonus).max(self.minimum_ease);

        let interval = match repetitions {
            1 => 1,
            2 => self.second_interval,
            // Half-up rounding; the float-to-int cast saturates on overflow.
            _ => ((previous.interval as f64 * ease).round() as u32).max(1),
        };

        (self.status_for(repetitions), repetitions, ease, interval)
    }

    fn schedule_incorrect(&self, previous: &Progress) -> (StudyStatus, u32, f64, u32) {
        let ease = (previous.ease_factor - self.ease_penalty).max(self.minimum_ease);
        (StudyStatus::Learning, 1, ease, 1)
    }

    /// Status implied by a run of consecutive correct answers.
    pub fn status_for(&self, repetitions: u32) -> StudyStatus {
        match repetitions {
            0 | 1 => StudyStatus::Learning,
            r if r >= self.mastery_repetitions => StudyStatus::Mastered,
            _ => StudyStatus::Reviewing,
        }
    }

    /// Check a record loaded from outside against these parameters.
    ///
    /// Every record this scheduler produces passes.
    pub fn validate(&self, progress: &Progress) -> Result<()> {
        if !progress.ease_factor.is_finite() {
            return Err(ProgressError::NonFiniteEaseFactor);
        }
        if progress.ease_factor < self.minimum_ease {
            return Err(ProgressError::EaseFactorTooLow {
                value: progress.ease_factor,
                minimum: self.minimum_ease,
            });
        }
        if progress.interval == 0 {
            return Err(ProgressError::ZeroInterval);
        }
        if progress.repetitions == 0 {
            return Err(ProgressError::ZeroRepetitions);
        }
        if self.status_for(progress.repetitions) != progress.status {
            return Err(ProgressError::StatusMismatch {
                status: progress.status.as_str(),
                repetitions: progress.repetitions,
            });
        }
        if progress.next_review < progress.last_reviewed {
            return Err(ProgressError::ReviewOrder {
                last_reviewed: progress.last_reviewed,
                next_review: progress.next_review,
            });
        }
        Ok(())
    }

    /// Validate every record in a store, reporting the first offending item.
    pub fn validate_store(&self, store: &ProgressStore) -> Result<()> {
        for (item_id, progress) in store.iter() {
            self.validate(progress).map_err(|e| ProgressError::Item {
                item_id,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

fn add_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Compute the next review with the default parameters.
pub fn compute_next_review(
    previous: Option<&Progress>,
    was_correct: bool,
    now: DateTime<Utc>,
) -> Progress {
    Scheduler::default().next_review(previous, was_correct, now)
}

/// Items that are new or whose next review has arrived, in input order.
pub fn select_due<'a, T: StudyItem>(
    items: &'a [T],
    store: &ProgressStore,
    now: DateTime<Utc>,
) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| {
            store
                .get(item.item_id())
                .map_or(true, |progress| progress.is_due(now))
        })
        .collect()
}

/// Count tracked items by status. Untracked items are not counted anywhere.
pub fn aggregate_stats(store: &ProgressStore, now: DateTime<Utc>) -> StudyStats {
    store
        .iter()
        .fold(StudyStats::default(), |mut stats, (_, progress)| {
            match progress.status {
                StudyStatus::Learning => stats.learning += 1,
                StudyStatus::Reviewing => stats.reviewing += 1,
                StudyStatus::Mastered => stats.mastered += 1,
            }
            if progress.is_due(now) {
                stats.due_today += 1;
            }
            stats
        })
}
