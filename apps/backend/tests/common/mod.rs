//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helper functions for creating users and vocabulary
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::Duration;

use jlpt_vocab_backend::config::Config;
use jlpt_vocab_backend::db::Database;
use jlpt_vocab_backend::models::{JlptLevel, VocabularyInput};
use jlpt_vocab_backend::AppState;

/// Test context containing database connection and test router.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);

        let config = Config {
            database_url,
            host: "127.0.0.1".to_string(),
            port: 0,
            frontend_url: None,
            session_ttl: Duration::hours(1),
        };

        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
        };

        let app = jlpt_vocab_backend::router(state).expect("Failed to build router");

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Test server over the router.
    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    /// Register and log in a fresh user; returns the user id and bearer token.
    pub async fn create_test_user(&self, server: &TestServer) -> (i32, String) {
        let email = fixtures::unique_email();

        server
            .post("/api/auth/register")
            .json(&fixtures::credentials(&email, fixtures::PASSWORD))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/auth/login")
            .json(&fixtures::credentials(&email, fixtures::PASSWORD))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        let user_id = body["user"]["id"].as_i64().unwrap() as i32;
        let token = body["token"].as_str().unwrap().to_string();
        (user_id, token)
    }

    /// Insert a word directly and return its id.
    pub async fn create_test_word(&self, word: &str, level: JlptLevel) -> i64 {
        let input: VocabularyInput =
            serde_json::from_value(fixtures::vocabulary_request(word, level.as_str())).unwrap();
        self.db
            .create_vocabulary(&input, level)
            .await
            .expect("Failed to create test word")
            .id
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Clean up test data for a user.
    ///
    /// Progress, streak and session rows cascade from the user.
    pub async fn cleanup_user(&self, user_id: i32) {
        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await;
    }

    /// Remove words created by a test.
    pub async fn cleanup_words(&self, ids: &[i64]) {
        let _ = sqlx::query("DELETE FROM vocabulary WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.db.pool())
            .await;
    }
}
