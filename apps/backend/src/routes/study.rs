//! Study endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::study;
use crate::AppState;

/// GET /api/study/due
pub async fn due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<DueQuery>,
) -> Result<Json<DueResponse>> {
    let level = query.level()?;
    let words: Vec<VocabularyWord> = state
        .db
        .list_vocabulary(None, level)
        .await?
        .iter()
        .map(|w| w.to_api_word())
        .collect();
    let store = state.db.load_progress(auth.user_id).await?;

    Ok(Json(study::due_words(&words, &store, query.limit, Utc::now())))
}

/// POST /api/study/review
pub async fn review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>> {
    if state.db.get_vocabulary(payload.vocabulary_id).await?.is_none() {
        return Err(ApiError::NotFound("Vocabulary not found".to_string()));
    }

    let now = Utc::now();
    let (progress, streak) = state
        .db
        .record_review(
            auth.user_id,
            payload.vocabulary_id,
            now.date_naive(),
            |previous| study::schedule(previous, payload.was_correct, now),
        )
        .await?;

    tracing::debug!(
        "User {} reviewed {} (correct: {}), next review {}, streak {}",
        auth.user_id,
        payload.vocabulary_id,
        payload.was_correct,
        progress.next_review,
        streak.streak
    );

    let store = state.db.load_progress(auth.user_id).await?;

    Ok(Json(ReviewResponse {
        vocabulary_id: payload.vocabulary_id,
        progress,
        stats: vocab_core::aggregate_stats(&store, now),
    }))
}

/// GET /api/study/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<StatsResponse>> {
    let store = state.db.load_progress(auth.user_id).await?;
    let streak = state.db.get_streak(auth.user_id).await?;
    Ok(Json(study::stats(&store, &streak, Utc::now())))
}

/// GET /api/study/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ProgressStore>> {
    let store = state.db.load_progress(auth.user_id).await?;
    Ok(Json(store))
}

/// PUT /api/study/progress
pub async fn put_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(store): Json<ProgressStore>,
) -> Result<Json<SaveProgressResponse>> {
    store.validate()?;

    let ids: Vec<i64> = store.iter().map(|(id, _)| id).collect();
    let existing = state.db.existing_vocabulary_ids(&ids).await?;
    if let Some(missing) = ids.iter().find(|id| !existing.contains(id)) {
        return Err(ApiError::BadRequest(format!(
            "Unknown vocabulary id: {}",
            missing
        )));
    }

    let saved_count = state.db.save_progress(auth.user_id, &store).await?;

    tracing::info!("Saved {} progress records for user {}", saved_count, auth.user_id);

    Ok(Json(SaveProgressResponse { saved_count }))
}

/// DELETE /api/study/progress/:id
pub async fn reset_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(vocabulary_id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let deleted = state.db.delete_progress(auth.user_id, vocabulary_id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
