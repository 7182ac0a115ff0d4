// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

/// Points awarded per correct answer when a quiz does not specify its own weight.
pub const DEFAULT_POINTS_PER_QUESTION: u32 = 10;

/// Number of rows returned by the per-quiz leaderboard.
pub const LEADERBOARD_LIMIT: i64 = 5;

/// Bounds on the number of options a single question may carry.
pub const MIN_OPTIONS_PER_QUESTION: usize = 2;
pub const MAX_OPTIONS_PER_QUESTION: usize = 6;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When absent the in-memory stores are used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Length of one countdown tick. One tick removes one second of quiz time.
    pub tick_interval_ms: u64,
    /// How long a submitted attempt stays reviewable before it is evicted.
    pub attempt_retention_secs: u64,
    /// Optional JSON file with quiz definitions loaded at startup.
    pub quiz_seed_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let tick_interval_ms = env::var("TICK_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(1000);

        let attempt_retention_secs = env::var("ATTEMPT_RETENTION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(600);

        let quiz_seed_path = env::var("QUIZ_SEED_PATH").ok().filter(|p| !p.is_empty());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            tick_interval_ms,
            attempt_retention_secs,
            quiz_seed_path,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn attempt_retention(&self) -> Duration {
        Duration::from_secs(self.attempt_retention_secs)
    }
}
