//! Vocabulary endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/vocabulary
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<VocabularyQuery>,
) -> Result<Json<Vec<VocabularyWord>>> {
    let level = query.level()?;
    let words = state.db.list_vocabulary(query.search(), level).await?;
    Ok(Json(words.iter().map(|w| w.to_api_word()).collect()))
}

/// GET /api/vocabulary/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VocabularyWord>> {
    let word = state
        .db
        .get_vocabulary(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vocabulary not found".to_string()))?;
    Ok(Json(word.to_api_word()))
}

/// POST /api/vocabulary
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<VocabularyInput>,
) -> Result<(StatusCode, Json<VocabularyWord>)> {
    let level = input.validate()?;
    let word = state.db.create_vocabulary(&input, level).await?;

    tracing::info!("Created vocabulary {} ({})", word.id, word.word);

    Ok((StatusCode::CREATED, Json(word.to_api_word())))
}

/// PUT /api/vocabulary/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<VocabularyInput>,
) -> Result<Json<VocabularyWord>> {
    let level = input.validate()?;
    let word = state
        .db
        .update_vocabulary(id, &input, level)
        .await?
        .ok_or_else(|| ApiError::NotFound("Vocabulary not found".to_string()))?;
    Ok(Json(word.to_api_word()))
}

/// DELETE /api/vocabulary/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    if !state.db.delete_vocabulary(id).await? {
        return Err(ApiError::NotFound("Vocabulary not found".to_string()));
    }

    tracing::info!("Deleted vocabulary {}", id);

    Ok(StatusCode::NO_CONTENT)
}
