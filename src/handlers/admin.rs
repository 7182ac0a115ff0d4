// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::quiz::CreateQuizRequest,
    state::AppState,
    utils::jwt::Claims,
};

/// Creates a quiz definition.
/// Admin only.
pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_quiz = payload.into_new_quiz()?;
    let quiz = state.quizzes.create(new_quiz).await?;

    tracing::info!(
        "Admin {} created quiz {} '{}' ({} questions)",
        claims.sub,
        quiz.id,
        quiz.title,
        quiz.question_count()
    );

    Ok((StatusCode::CREATED, Json(quiz)))
}
