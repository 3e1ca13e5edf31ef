//! Study service: applies the vocab-core scheduler to API types.

use chrono::{DateTime, Utc};
use vocab_core::{aggregate_stats, select_due, Scheduler};

use crate::models::{
    DueResponse, Progress, ProgressStore, StatsResponse, StudyStreak, VocabularyWord,
};

/// Next progress record after a review.
pub fn schedule(previous: Option<&Progress>, was_correct: bool, now: DateTime<Utc>) -> Progress {
    Scheduler::default().next_review(previous, was_correct, now)
}

/// Due words in listing order, optionally capped at `limit`.
pub fn due_words(
    words: &[VocabularyWord],
    store: &ProgressStore,
    limit: Option<usize>,
    now: DateTime<Utc>,
) -> DueResponse {
    let due = select_due(words, store, now);
    let total_due = due.len();
    let take = limit.unwrap_or(total_due);

    DueResponse {
        words: due.into_iter().take(take).cloned().collect(),
        total_due,
    }
}

/// Aggregate stats plus the streak as of `now`.
pub fn stats(store: &ProgressStore, streak: &StudyStreak, now: DateTime<Utc>) -> StatsResponse {
    StatsResponse {
        stats: aggregate_stats(store, now),
        tracked: store.len(),
        streak: streak.current(now.date_naive()),
        last_study_day: streak.last_study_day,
    }
}
