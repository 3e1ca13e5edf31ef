//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::error::{ApiError, Result};

// Re-export shared types from vocab-core
pub use vocab_core::types::{
    JlptLevel, Progress, ProgressStore, StudyItem, StudyStats, StudyStatus,
};
pub use vocab_core::{ProgressError, StudyStreak};

// === Database Entity Types ===

/// Registered user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_api_user(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

/// One sense of a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meaning {
    pub definition: String,
    /// Part of speech, e.g. "noun" or "verb"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Example sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub japanese: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    pub meaning: String,
}

/// Kanji making up a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanjiComponent {
    pub kanji: String,
    pub meaning: String,
    pub reading: String,
}

/// Vocabulary row in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbVocabulary {
    pub id: i64,
    pub word: String,
    pub kanji: Option<String>,
    pub hiragana: Option<String>,
    pub katakana: Option<String>,
    pub meanings: Json<Vec<Meaning>>,
    pub examples: Json<Vec<Example>>,
    pub components: Json<Vec<KanjiComponent>>,
    pub jlpt_level: String,
    pub tags: Vec<String>,
    pub stroke_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbVocabulary {
    /// Convert to API word type
    pub fn to_api_word(&self) -> VocabularyWord {
        VocabularyWord {
            id: self.id,
            word: self.word.clone(),
            kanji: self.kanji.clone(),
            hiragana: self.hiragana.clone(),
            katakana: self.katakana.clone(),
            meanings: self.meanings.0.clone(),
            examples: self.examples.0.clone(),
            components: self.components.0.clone(),
            // The column is CHECK-constrained to the five levels.
            jlpt_level: JlptLevel::parse(&self.jlpt_level).unwrap_or(JlptLevel::N5),
            tags: self.tags.clone(),
            stroke_count: self.stroke_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Study progress row in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbProgress {
    pub user_id: i32,
    pub vocabulary_id: i64,
    pub status: String,
    pub last_reviewed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    pub repetitions: i32,
    pub ease_factor: f64,
    pub interval_days: i64,
}

impl DbProgress {
    /// Create from vocab-core Progress
    pub fn from_core_progress(user_id: i32, vocabulary_id: i64, progress: &Progress) -> Self {
        Self {
            user_id,
            vocabulary_id,
            status: progress.status.as_str().to_string(),
            last_reviewed: progress.last_reviewed,
            next_review: progress.next_review,
            repetitions: i32::try_from(progress.repetitions).unwrap_or(i32::MAX),
            ease_factor: progress.ease_factor,
            interval_days: i64::from(progress.interval),
        }
    }

    /// Convert to vocab-core Progress, rejecting rows that break its invariants
    pub fn to_core_progress(&self) -> vocab_core::Result<Progress> {
        let status = StudyStatus::parse(&self.status)
            .ok_or_else(|| ProgressError::UnknownStatus(self.status.clone()))?;
        let repetitions = u32::try_from(self.repetitions).map_err(|_| ProgressError::Negative {
            field: "repetitions",
            value: i64::from(self.repetitions),
        })?;
        let interval = u32::try_from(self.interval_days).map_err(|_| ProgressError::Negative {
            field: "interval",
            value: self.interval_days,
        })?;

        let progress = Progress {
            status,
            last_reviewed: self.last_reviewed,
            next_review: self.next_review,
            repetitions,
            ease_factor: self.ease_factor,
            interval,
        };
        progress.validate()?;
        Ok(progress)
    }
}

/// Study streak row in PostgreSQL
#[derive(Debug, Clone, FromRow)]
pub struct DbStreak {
    pub streak: i32,
    pub last_study_day: Option<NaiveDate>,
}

impl DbStreak {
    pub fn to_core_streak(&self) -> StudyStreak {
        StudyStreak {
            streak: u32::try_from(self.streak).unwrap_or(0),
            last_study_day: self.last_study_day,
        }
    }
}

// === API Request/Response Types ===

// Auth types
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsRequest {
    /// Trimmed email, or a bad request if either field is blank.
    pub fn validate(&self) -> Result<String> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }
        Ok(email.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}

// Vocabulary types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: i64,
    pub word: String,
    pub kanji: Option<String>,
    pub hiragana: Option<String>,
    pub katakana: Option<String>,
    pub meanings: Vec<Meaning>,
    pub examples: Vec<Example>,
    pub components: Vec<KanjiComponent>,
    pub jlpt_level: JlptLevel,
    pub tags: Vec<String>,
    pub stroke_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudyItem for VocabularyWord {
    fn item_id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VocabularyQuery {
    pub search: Option<String>,
    pub level: Option<String>,
}

impl VocabularyQuery {
    /// Parsed level filter, if any.
    pub fn level(&self) -> Result<Option<JlptLevel>> {
        parse_level_filter(self.level.as_deref())
    }

    /// Search term, ignoring blank input.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyInput {
    #[serde(default)]
    pub word: String,
    pub kanji: Option<String>,
    pub hiragana: Option<String>,
    pub katakana: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub components: Vec<KanjiComponent>,
    pub jlpt_level: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub stroke_count: Option<i32>,
}

impl VocabularyInput {
    /// Check the input and return its parsed level.
    pub fn validate(&self) -> Result<JlptLevel> {
        if self.word.trim().is_empty() {
            return Err(ApiError::BadRequest("word is required".to_string()));
        }
        if matches!(self.stroke_count, Some(n) if n < 0) {
            return Err(ApiError::BadRequest(
                "stroke_count must not be negative".to_string(),
            ));
        }
        JlptLevel::parse(&self.jlpt_level).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown JLPT level: {}", self.jlpt_level))
        })
    }
}

// Study types
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DueQuery {
    pub level: Option<String>,
    pub limit: Option<usize>,
}

impl DueQuery {
    pub fn level(&self) -> Result<Option<JlptLevel>> {
        parse_level_filter(self.level.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueResponse {
    pub words: Vec<VocabularyWord>,
    pub total_due: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub vocabulary_id: i64,
    pub was_correct: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub vocabulary_id: i64,
    pub progress: Progress,
    pub stats: StudyStats,
}

/// Stats block served in the same camelCase shape as `StudyStats`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StudyStats,
    pub tracked: usize,
    pub streak: u32,
    pub last_study_day: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveProgressResponse {
    pub saved_count: usize,
}

fn parse_level_filter(level: Option<&str>) -> Result<Option<JlptLevel>> {
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        Some(l) => JlptLevel::parse(l)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown JLPT level: {}", l))),
        None => Ok(None),
    }
}
