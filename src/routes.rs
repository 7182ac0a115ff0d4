// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (quiz catalogue, attempts, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (stores, attempt registry, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let quiz_routes = Router::new()
        .route("/api/quiz", get(quiz::list_quizzes))
        .route("/api/quiz/{id}", get(quiz::get_quiz))
        .route("/api/quiz/{id}/leaderboard", get(quiz::get_leaderboard));

    // Everything that touches an attempt needs a logged-in user
    let attempt_routes = Router::new()
        .route("/api/quiz/{id}/attempts", post(attempt::start_attempt))
        .route("/api/attempts/history", get(attempt::history))
        .route(
            "/api/attempts/{id}",
            get(attempt::get_attempt).delete(attempt::abandon_attempt),
        )
        .route("/api/attempts/{id}/answers", put(attempt::select_answer))
        .route("/api/attempts/{id}/navigate", post(attempt::navigate))
        .route("/api/attempts/{id}/submit", post(attempt::submit_attempt))
        .route("/api/attempts/{id}/review", get(attempt::review_attempt))
        .route("/api/attempts/{id}/retake", post(attempt::retake_attempt))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/admin/quizzes", post(admin::create_quiz))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(quiz_routes)
        .merge(attempt_routes)
        .merge(admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
