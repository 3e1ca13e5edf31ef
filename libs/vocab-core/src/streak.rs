//! Daily study streak.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Consecutive days on which the learner reviewed at least one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStreak {
    pub streak: u32,
    pub last_study_day: Option<NaiveDate>,
}

impl StudyStreak {
    /// Streak after studying on `today`.
    ///
    /// Studying again on the same day changes nothing; studying the day
    /// after extends the streak; any gap starts over at one.
    pub fn record_study_day(&self, today: NaiveDate) -> Self {
        let streak = match self.last_study_day {
            Some(last) if last == today => return *self,
            Some(last) if is_day_before(last, today) => self.streak.saturating_add(1),
            _ => 1,
        };

        Self {
            streak,
            last_study_day: Some(today),
        }
    }

    /// Streak as seen on `today`: zero once a full day has been missed.
    pub fn current(&self, today: NaiveDate) -> u32 {
        match self.last_study_day {
            Some(last) if last == today || is_day_before(last, today) => self.streak,
            _ => 0,
        }
    }
}

fn is_day_before(day: NaiveDate, today: NaiveDate) -> bool {
    today.checked_sub_days(Days::new(1)) == Some(day)
}
