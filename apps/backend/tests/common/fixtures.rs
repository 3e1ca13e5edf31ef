//! Test fixtures and factory functions for creating test data.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery staple";

/// Generate a unique email to avoid collisions between test runs.
pub fn unique_email() -> String {
    format!("user_{}@example.com", &Uuid::new_v4().to_string()[..8])
}

/// Create a register/login request body.
pub fn credentials(email: &str, password: &str) -> serde_json::Value {
    json!({ "email": email, "password": password })
}

/// Create a vocabulary create/update request body.
pub fn vocabulary_request(word: &str, level: &str) -> serde_json::Value {
    json!({
        "word": word,
        "kanji": word,
        "hiragana": "てすと",
        "meanings": [{ "definition": "test word", "type": "noun" }],
        "examples": [{ "japanese": "これはテストです。", "meaning": "This is a test." }],
        "jlpt_level": level,
        "tags": ["test"]
    })
}

/// Generate a unique word so searches only match this test's data.
pub fn unique_word(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().to_string()[..8])
}

/// Create a review request body.
pub fn review_request(vocabulary_id: i64, was_correct: bool) -> serde_json::Value {
    json!({ "vocabulary_id": vocabulary_id, "was_correct": was_correct })
}

/// A progress record as exported by the browser client.
pub fn progress_record(
    repetitions: u32,
    status: &str,
    interval: u32,
    last_reviewed: DateTime<Utc>,
) -> serde_json::Value {
    json!({
        "status": status,
        "lastReviewed": last_reviewed,
        "nextReview": last_reviewed + Duration::days(i64::from(interval)),
        "repetitions": repetitions,
        "easeFactor": 2.5,
        "interval": interval
    })
}
