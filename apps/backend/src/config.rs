//! Environment configuration

use chrono::Duration;

use crate::error::{ApiError, Result};

/// Server configuration read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin. Any origin is allowed when unset.
    pub frontend_url: Option<String>,
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - DATABASE_URL: PostgreSQL connection string
    ///
    /// Optional env vars:
    /// - HOST (default "0.0.0.0")
    /// - PORT (default 4000)
    /// - FRONTEND_URL: origin allowed to call the API with credentials
    /// - SESSION_TTL_HOURS (default 24)
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ApiError::Internal("DATABASE_URL must be set".to_string()))?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| ApiError::Internal(format!("Invalid PORT: {}", value)))?,
            Err(_) => 4000,
        };

        let frontend_url = std::env::var("FRONTEND_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let session_ttl = match std::env::var("SESSION_TTL_HOURS") {
            Ok(value) => value
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .and_then(Duration::try_hours)
                .ok_or_else(|| ApiError::Internal(format!("Invalid SESSION_TTL_HOURS: {}", value)))?,
            Err(_) => Duration::hours(24),
        };

        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            session_ttl,
        })
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
