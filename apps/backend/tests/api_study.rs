//! Study API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use common::fixtures;
use common::TestContext;
use jlpt_vocab_backend::models::JlptLevel;

/// Test a new user has empty stats.
#[tokio::test]
#[ignore = "requires database"]
async fn test_stats_empty_for_new_user() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;

    let response = server
        .get("/api/study/stats")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["learning"], 0);
    assert_eq!(body["reviewing"], 0);
    assert_eq!(body["mastered"], 0);
    assert_eq!(body["dueToday"], 0);
    assert_eq!(body["streak"], 0);

    // Cleanup
    ctx.cleanup_user(user_id).await;
}

/// Test reviewing a word schedules it and removes it from the due list.
#[tokio::test]
#[ignore = "requires database"]
async fn test_review_schedules_word() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;
    let auth = TestContext::auth_header_value(&token);
    let word_id = ctx
        .create_test_word(&fixtures::unique_word("review"), JlptLevel::N1)
        .await;

    let response = server
        .post("/api/study/review")
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .json(&fixtures::review_request(word_id, true))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["progress"]["status"], "learning");
    assert_eq!(body["progress"]["repetitions"], 1);
    assert_eq!(body["progress"]["interval"], 1);
    assert_eq!(body["stats"]["learning"], 1);

    let response = server
        .post("/api/study/review")
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .json(&fixtures::review_request(word_id, true))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["progress"]["status"], "reviewing");
    assert_eq!(body["progress"]["interval"], 3);

    let response = server
        .get("/api/study/due")
        .add_query_param("level", "N1")
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .await;
    response.assert_status_ok();
    let due: serde_json::Value = response.json();
    let due_ids: Vec<i64> = due["words"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["id"].as_i64().unwrap())
        .collect();
    assert!(!due_ids.contains(&word_id));

    let response = server
        .get("/api/study/stats")
        .add_header(axum::http::header::AUTHORIZATION, auth)
        .await;
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["reviewing"], 1);
    assert_eq!(stats["streak"], 1);

    // Cleanup
    ctx.cleanup_words(&[word_id]).await;
    ctx.cleanup_user(user_id).await;
}

/// Test a wrong answer resets the word to learning.
#[tokio::test]
#[ignore = "requires database"]
async fn test_incorrect_review_resets() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;
    let auth = TestContext::auth_header_value(&token);
    let word_id = ctx
        .create_test_word(&fixtures::unique_word("reset"), JlptLevel::N5)
        .await;

    for correct in [true, true, false] {
        server
            .post("/api/study/review")
            .add_header(axum::http::header::AUTHORIZATION, auth.clone())
            .json(&fixtures::review_request(word_id, correct))
            .await
            .assert_status_ok();
    }

    let progress = ctx.db.get_progress(user_id, word_id).await.unwrap().unwrap();
    assert_eq!(progress.repetitions, 1);
    assert_eq!(progress.interval, 1);
    assert!((progress.ease_factor - 2.45).abs() < 1e-9);

    // Cleanup
    ctx.cleanup_words(&[word_id]).await;
    ctx.cleanup_user(user_id).await;
}

/// Test reviewing an unknown word.
#[tokio::test]
#[ignore = "requires database"]
async fn test_review_unknown_word() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;

    server
        .post("/api/study/review")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&fixtures::review_request(999_999_999, true))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Cleanup
    ctx.cleanup_user(user_id).await;
}

/// Test importing, exporting and resetting a progress store.
#[tokio::test]
#[ignore = "requires database"]
async fn test_progress_import_export_reset() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;
    let auth = TestContext::auth_header_value(&token);
    let a = ctx
        .create_test_word(&fixtures::unique_word("import"), JlptLevel::N3)
        .await;
    let b = ctx
        .create_test_word(&fixtures::unique_word("import"), JlptLevel::N3)
        .await;

    let reviewed = Utc::now() - Duration::days(5);
    let mut store = serde_json::Map::new();
    store.insert(a.to_string(), fixtures::progress_record(2, "reviewing", 3, reviewed));
    store.insert(b.to_string(), fixtures::progress_record(5, "mastered", 30, reviewed));

    let response = server
        .put("/api/study/progress")
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .json(&serde_json::Value::Object(store))
        .await;
    response.assert_status_ok();
    let saved: serde_json::Value = response.json();
    assert_eq!(saved["saved_count"], 2);

    let response = server
        .get("/api/study/stats")
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .await;
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["reviewing"], 1);
    assert_eq!(stats["mastered"], 1);
    assert_eq!(stats["dueToday"], 1);

    server
        .delete(&format!("/api/study/progress/{}", a))
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .await
        .assert_status_ok();

    let response = server
        .get("/api/study/progress")
        .add_header(axum::http::header::AUTHORIZATION, auth)
        .await;
    let exported: serde_json::Value = response.json();
    assert!(exported.get(a.to_string()).is_none());
    assert_eq!(exported[b.to_string()]["status"], "mastered");

    // Cleanup
    ctx.cleanup_words(&[a, b]).await;
    ctx.cleanup_user(user_id).await;
}

/// Test invalid progress records are rejected on import.
#[tokio::test]
#[ignore = "requires database"]
async fn test_progress_import_rejects_invalid_record() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;
    let word_id = ctx
        .create_test_word(&fixtures::unique_word("invalid"), JlptLevel::N5)
        .await;

    let mut record = fixtures::progress_record(1, "learning", 1, Utc::now());
    record["easeFactor"] = serde_json::json!(0.5);
    let mut store = serde_json::Map::new();
    store.insert(word_id.to_string(), record);

    let response = server
        .put("/api/study/progress")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&serde_json::Value::Object(store))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_progress");

    // Cleanup
    ctx.cleanup_words(&[word_id]).await;
    ctx.cleanup_user(user_id).await;
}

/// Test concurrent reviews both land and count once towards the streak.
#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_reviews_share_streak_day() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;
    let auth = TestContext::auth_header_value(&token);
    let a = ctx
        .create_test_word(&fixtures::unique_word("concurrent"), JlptLevel::N4)
        .await;
    let b = ctx
        .create_test_word(&fixtures::unique_word("concurrent"), JlptLevel::N4)
        .await;

    let (first, second) = tokio::join!(
        async {
            server
                .post("/api/study/review")
                .add_header(axum::http::header::AUTHORIZATION, auth.clone())
                .json(&fixtures::review_request(a, true))
                .await
        },
        async {
            server
                .post("/api/study/review")
                .add_header(axum::http::header::AUTHORIZATION, auth.clone())
                .json(&fixtures::review_request(b, false))
                .await
        }
    );
    first.assert_status_ok();
    second.assert_status_ok();

    let response = server
        .get("/api/study/stats")
        .add_header(axum::http::header::AUTHORIZATION, auth)
        .await;
    let stats: serde_json::Value = response.json();
    assert_eq!(stats["learning"], 2);
    assert_eq!(stats["tracked"], 2);
    assert_eq!(stats["streak"], 1);
    assert_eq!(
        stats["lastStudyDay"],
        Utc::now().date_naive().to_string()
    );

    let streak = ctx.db.get_streak(user_id).await.unwrap();
    assert_eq!(streak.streak, 1);

    // Cleanup
    ctx.cleanup_words(&[a, b]).await;
    ctx.cleanup_user(user_id).await;
}

/// Test importing progress for a word that does not exist.
#[tokio::test]
#[ignore = "requires database"]
async fn test_progress_import_rejects_unknown_word() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let (user_id, token) = ctx.create_test_user(&server).await;
    let auth = TestContext::auth_header_value(&token);
    let word_id = ctx
        .create_test_word(&fixtures::unique_word("known"), JlptLevel::N5)
        .await;

    let reviewed = Utc::now() - Duration::days(1);
    let mut store = serde_json::Map::new();
    store.insert(
        word_id.to_string(),
        fixtures::progress_record(1, "learning", 1, reviewed),
    );
    store.insert(
        "999999999".to_string(),
        fixtures::progress_record(1, "learning", 1, reviewed),
    );

    let response = server
        .put("/api/study/progress")
        .add_header(axum::http::header::AUTHORIZATION, auth.clone())
        .json(&serde_json::Value::Object(store))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("999999999"));

    // Nothing from the rejected import was stored
    let response = server
        .get("/api/study/progress")
        .add_header(axum::http::header::AUTHORIZATION, auth)
        .await;
    let exported: serde_json::Value = response.json();
    assert_eq!(exported, serde_json::json!({}));

    // Cleanup
    ctx.cleanup_words(&[word_id]).await;
    ctx.cleanup_user(user_id).await;
}
