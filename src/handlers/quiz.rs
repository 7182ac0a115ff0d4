// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    config::LEADERBOARD_LIMIT,
    error::AppError,
    models::quiz::PublicQuiz,
    state::AppState,
};

/// Lists all quizzes with their question counts.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes = state.quizzes.list().await?;
    Ok(Json(quizzes))
}

/// Returns a quiz without its answer key.
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .quizzes
        .find(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

    Ok(Json(PublicQuiz::from(quiz.as_ref())))
}

/// Retrieves the top results for a quiz: each user's best percentage.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let leaderboard = state.results.leaderboard(quiz_id, LEADERBOARD_LIMIT).await?;
    Ok(Json(leaderboard))
}
