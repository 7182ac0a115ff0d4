// src/main.rs

use dotenvy::dotenv;
use quiz_backend::attempt::spawn_sweeper;
use quiz_backend::config::Config;
use quiz_backend::routes;
use quiz_backend::state::AppState;
use quiz_backend::store::seed_quizzes;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let state = match &config.database_url {
        Some(database_url) => {
            // Initialize Database Pool with Retry
            let mut retry_count = 0;
            let pool = loop {
                match PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                {
                    Ok(pool) => break pool,
                    Err(e) => {
                        retry_count += 1;
                        if retry_count > 5 {
                            panic!("Failed to connect to database after 5 retries: {}", e);
                        }
                        tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            };

            tracing::info!("Database connected...");

            // Run Migrations Automatically
            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            AppState::postgres(pool, config.clone())
        }
        None => {
            tracing::warn!("DATABASE_URL not set, quizzes and results are kept in memory only");
            AppState::in_memory(config.clone())
        }
    };

    // Seed quizzes from file (only into an empty repository)
    let repository_empty = match state.quizzes.list().await {
        Ok(quizzes) => quizzes.is_empty(),
        Err(e) => {
            tracing::error!("Failed to inspect quiz repository: {:?}", e);
            false
        }
    };
    if let (Some(path), true) = (&config.quiz_seed_path, repository_empty) {
        match tokio::fs::read_to_string(path).await {
            Ok(json) => match seed_quizzes(state.quizzes.as_ref(), &json).await {
                Ok(count) => tracing::info!("Seeded {} quizzes from {}", count, path),
                Err(e) => tracing::error!("Failed to seed quizzes from {}: {:?}", path, e),
            },
            Err(e) => tracing::error!("Failed to read quiz seed file {}: {:?}", path, e),
        }
    }

    // Evict finished attempts in the background
    spawn_sweeper(
        state.attempts.clone(),
        state.results.clone(),
        config.attempt_retention(),
    );

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
