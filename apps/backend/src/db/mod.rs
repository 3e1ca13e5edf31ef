//! PostgreSQL database operations

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

const VOCABULARY_COLUMNS: &str = "id, word, kanji, hiragana, katakana, meanings, examples, \
     components, jlpt_level, tags, stroke_count, created_at, updated_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a user. Returns None if the email is already registered.
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // === Session Repository ===

    /// Store a session for a token digest
    pub async fn create_session(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the user owning an unexpired session
    pub async fn get_user_by_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.created_at, u.updated_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Delete a session
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove expired sessions for a user
    pub async fn delete_expired_sessions(&self, user_id: i32, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= $2")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // === Vocabulary Repository ===

    /// List vocabulary, optionally filtered by search term and level
    pub async fn list_vocabulary(
        &self,
        search: Option<&str>,
        level: Option<JlptLevel>,
    ) -> Result<Vec<DbVocabulary>> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));
        let words = sqlx::query_as::<_, DbVocabulary>(&format!(
            r#"
            SELECT {VOCABULARY_COLUMNS}
            FROM vocabulary
            WHERE ($1::TEXT IS NULL
                   OR word ILIKE $1 OR kanji ILIKE $1 OR hiragana ILIKE $1 OR katakana ILIKE $1)
              AND ($2::TEXT IS NULL OR jlpt_level = $2)
            ORDER BY word ASC, id ASC
            "#
        ))
        .bind(pattern)
        .bind(level.map(|l| l.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(words)
    }

    /// Get vocabulary by ID
    pub async fn get_vocabulary(&self, id: i64) -> Result<Option<DbVocabulary>> {
        let word = sqlx::query_as::<_, DbVocabulary>(&format!(
            "SELECT {VOCABULARY_COLUMNS} FROM vocabulary WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(word)
    }

    /// Insert a new word
    pub async fn create_vocabulary(
        &self,
        input: &VocabularyInput,
        level: JlptLevel,
    ) -> Result<DbVocabulary> {
        let word = sqlx::query_as::<_, DbVocabulary>(&format!(
            r#"
            INSERT INTO vocabulary (word, kanji, hiragana, katakana, meanings, examples,
                                    components, jlpt_level, tags, stroke_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {VOCABULARY_COLUMNS}
            "#
        ))
        .bind(input.word.trim())
        .bind(&input.kanji)
        .bind(&input.hiragana)
        .bind(&input.katakana)
        .bind(Json(&input.meanings))
        .bind(Json(&input.examples))
        .bind(Json(&input.components))
        .bind(level.as_str())
        .bind(&input.tags)
        .bind(input.stroke_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(word)
    }

    /// Replace a word. Returns None if it does not exist.
    pub async fn update_vocabulary(
        &self,
        id: i64,
        input: &VocabularyInput,
        level: JlptLevel,
    ) -> Result<Option<DbVocabulary>> {
        let word = sqlx::query_as::<_, DbVocabulary>(&format!(
            r#"
            UPDATE vocabulary SET
                word = $1,
                kanji = $2,
                hiragana = $3,
                katakana = $4,
                meanings = $5,
                examples = $6,
                components = $7,
                jlpt_level = $8,
                tags = $9,
                stroke_count = $10
            WHERE id = $11
            RETURNING {VOCABULARY_COLUMNS}
            "#
        ))
        .bind(input.word.trim())
        .bind(&input.kanji)
        .bind(&input.hiragana)
        .bind(&input.katakana)
        .bind(Json(&input.meanings))
        .bind(Json(&input.examples))
        .bind(Json(&input.components))
        .bind(level.as_str())
        .bind(&input.tags)
        .bind(input.stroke_count)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(word)
    }

    /// Which of the given ids exist
    pub async fn existing_vocabulary_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM vocabulary WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(found)
    }

    /// Delete a word (progress rows cascade)
    pub async fn delete_vocabulary(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM vocabulary WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Progress Repository ===

    /// Load a user's whole progress store.
    ///
    /// Rows violating the progress invariants are rejected here rather than
    /// reaching the scheduler.
    pub async fn load_progress(&self, user_id: i32) -> Result<ProgressStore> {
        let rows = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, vocabulary_id, status, last_reviewed, next_review,
                   repetitions, ease_factor, interval_days
            FROM study_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows_to_store(rows)
    }

    /// Replace a user's progress store
    pub async fn save_progress(&self, user_id: i32, store: &ProgressStore) -> Result<usize> {
        let mut tx = self.begin_user_write(user_id).await?;

        sqlx::query("DELETE FROM study_progress WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (vocabulary_id, progress) in store.iter() {
            let row = DbProgress::from_core_progress(user_id, vocabulary_id, progress);
            upsert_progress_row(&mut tx, &row).await?;
        }

        tx.commit().await?;
        Ok(store.len())
    }

    /// Get a single progress record, validated
    pub async fn get_progress(&self, user_id: i32, vocabulary_id: i64) -> Result<Option<Progress>> {
        let row = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, vocabulary_id, status, last_reviewed, next_review,
                   repetitions, ease_factor, interval_days
            FROM study_progress
            WHERE user_id = $1 AND vocabulary_id = $2
            "#,
        )
        .bind(user_id)
        .bind(vocabulary_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.to_core_progress()).transpose()?)
    }

    /// Apply one review: read the current record, let `schedule` compute the
    /// next one, store it and count `today` towards the streak, all while
    /// holding the user's row lock.
    pub async fn record_review<F>(
        &self,
        user_id: i32,
        vocabulary_id: i64,
        today: NaiveDate,
        schedule: F,
    ) -> Result<(Progress, StudyStreak)>
    where
        F: FnOnce(Option<&Progress>) -> Progress,
    {
        let mut tx = self.begin_user_write(user_id).await?;

        let previous = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, vocabulary_id, status, last_reviewed, next_review,
                   repetitions, ease_factor, interval_days
            FROM study_progress
            WHERE user_id = $1 AND vocabulary_id = $2
            "#,
        )
        .bind(user_id)
        .bind(vocabulary_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| r.to_core_progress())
        .transpose()?;

        let next = schedule(previous.as_ref());
        let row = DbProgress::from_core_progress(user_id, vocabulary_id, &next);
        upsert_progress_row(&mut tx, &row).await?;

        let streak = sqlx::query_as::<_, DbStreak>(
            "SELECT streak, last_study_day FROM study_streaks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| r.to_core_streak())
        .unwrap_or_default()
        .record_study_day(today);
        upsert_streak_row(&mut tx, user_id, &streak).await?;

        tx.commit().await?;
        Ok((next, streak))
    }

    /// Evict one progress record
    pub async fn delete_progress(&self, user_id: i32, vocabulary_id: i64) -> Result<bool> {
        let mut tx = self.begin_user_write(user_id).await?;

        let result = sqlx::query(
            "DELETE FROM study_progress WHERE user_id = $1 AND vocabulary_id = $2",
        )
        .bind(user_id)
        .bind(vocabulary_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // === Streak Repository ===

    /// Get a user's study streak
    pub async fn get_streak(&self, user_id: i32) -> Result<StudyStreak> {
        let row = sqlx::query_as::<_, DbStreak>(
            "SELECT streak, last_study_day FROM study_streaks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.to_core_streak()).unwrap_or_default())
    }

    /// Open a transaction holding the user's row lock, so writes to one
    /// user's progress are applied one at a time.
    async fn begin_user_write(&self, user_id: i32) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}

async fn upsert_streak_row(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    streak: &StudyStreak,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO study_streaks (user_id, streak, last_study_day)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET
            streak = EXCLUDED.streak,
            last_study_day = EXCLUDED.last_study_day
        "#,
    )
    .bind(user_id)
    .bind(i32::try_from(streak.streak).unwrap_or(i32::MAX))
    .bind(streak.last_study_day)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn upsert_progress_row(tx: &mut Transaction<'_, Postgres>, row: &DbProgress) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO study_progress (user_id, vocabulary_id, status, last_reviewed, next_review,
                                    repetitions, ease_factor, interval_days)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id, vocabulary_id) DO UPDATE SET
            status = EXCLUDED.status,
            last_reviewed = EXCLUDED.last_reviewed,
            next_review = EXCLUDED.next_review,
            repetitions = EXCLUDED.repetitions,
            ease_factor = EXCLUDED.ease_factor,
            interval_days = EXCLUDED.interval_days
        "#,
    )
    .bind(row.user_id)
    .bind(row.vocabulary_id)
    .bind(&row.status)
    .bind(row.last_reviewed)
    .bind(row.next_review)
    .bind(row.repetitions)
    .bind(row.ease_factor)
    .bind(row.interval_days)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn rows_to_store(rows: Vec<DbProgress>) -> Result<ProgressStore> {
    let mut store = ProgressStore::new();
    for row in rows {
        let progress = row.to_core_progress().map_err(|e| ProgressError::Item {
            item_id: row.vocabulary_id,
            source: Box::new(e),
        })?;
        store.insert(row.vocabulary_id, progress);
    }
    Ok(store)
}

/// Escape LIKE wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
