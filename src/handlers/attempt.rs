// src/handlers/attempt.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    attempt::{AttemptSession, AttemptState, scoring::review_items, spawn_countdown},
    error::AppError,
    models::attempt::{AttemptReview, NavigateRequest, SelectAnswerRequest},
    state::AppState,
    utils::jwt::Claims,
};

/// Looks up a live attempt owned by the caller.
/// Attempts of other users are reported as missing.
async fn owned_session(
    state: &AppState,
    claims: &Claims,
    attempt_id: Uuid,
) -> Result<Arc<AttemptSession>, AppError> {
    let user_id = claims.user_id()?;
    state
        .attempts
        .get(attempt_id)
        .await
        .filter(|session| session.user_id() == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))
}

/// Registers a freshly started attempt and starts its countdown.
async fn launch(state: &AppState, claims: &Claims, attempt: AttemptState) -> Result<Arc<AttemptSession>, AppError> {
    let user_id = claims.user_id()?;
    let session = AttemptSession::new(attempt, user_id, &claims.username);

    state.attempts.insert(Arc::clone(&session)).await;
    spawn_countdown(
        Arc::clone(&session),
        Arc::clone(&state.results),
        state.config.tick_interval(),
    );

    tracing::info!(
        "User {} started attempt {} on quiz {}",
        user_id,
        session.id(),
        session.quiz_id()
    );
    Ok(session)
}

/// Starts a new attempt on a quiz.
///
/// * Loads the quiz definition once.
/// * Creates an in-progress attempt with the full time budget.
/// * Starts the per-second countdown that auto-submits at zero.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let definition = state
        .quizzes
        .find(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

    let attempt = AttemptState::start(definition)?;
    let session = launch(&state, &claims, attempt).await?;

    Ok((StatusCode::CREATED, Json(session.view().await)))
}

/// Returns the current state of an attempt.
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = owned_session(&state, &claims, attempt_id).await?;
    Ok(Json(session.view().await))
}

/// Records (or replaces) the answer to one question.
pub async fn select_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = owned_session(&state, &claims, attempt_id).await?;

    session
        .apply(&state.results, |attempt| {
            attempt.select_answer(req.question_id, req.option_id)
        })
        .await?;

    Ok(Json(session.view().await))
}

/// Moves to the next/previous question, or jumps to an index.
pub async fn navigate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = owned_session(&state, &claims, attempt_id).await?;

    match (req.direction, req.index) {
        (Some(direction), None) => {
            session
                .apply(&state.results, |attempt| attempt.navigate(direction))
                .await?;
        }
        (None, Some(index)) => {
            session
                .apply(&state.results, |attempt| attempt.jump_to(index))
                .await?;
        }
        _ => {
            return Err(AppError::BadRequest(
                "Provide either 'direction' or 'index'".to_string(),
            ));
        }
    }

    Ok(Json(session.view().await))
}

/// Submits the attempt.
///
/// Submitting twice (or after the countdown already did) returns the
/// same result; the result is stored only once.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = owned_session(&state, &claims, attempt_id).await?;

    let result = session
        .apply(&state.results, |attempt| attempt.submit())
        .await?;

    Ok(Json(result.as_ref().clone()))
}

/// Returns the per-question review of a submitted attempt.
pub async fn review_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = owned_session(&state, &claims, attempt_id).await?;

    let review = session
        .read(|attempt| {
            attempt.result().map(|result| AttemptReview {
                attempt_id,
                quiz_id: attempt.definition().id,
                correct_count: result.correct_count,
                total_questions: result.total_questions,
                percentage: result.percentage,
                score: result.score,
                max_score: result.max_score,
                items: review_items(attempt.definition(), result),
            })
        })
        .await
        .ok_or_else(|| AppError::Conflict("Attempt has not been submitted yet".to_string()))?;

    Ok(Json(review))
}

/// Discards the attempt and starts a fresh one on the same quiz.
/// Nothing from the old attempt carries over.
pub async fn retake_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let old = owned_session(&state, &claims, attempt_id).await?;
    let definition = old.read(|attempt| Arc::clone(attempt.definition())).await;
    state.attempts.discard(attempt_id).await;

    let attempt = AttemptState::retake(definition)?;
    let session = launch(&state, &claims, attempt).await?;

    Ok((StatusCode::CREATED, Json(session.view().await)))
}

/// Abandons an attempt. An unsubmitted attempt is dropped without a result.
pub async fn abandon_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    owned_session(&state, &claims, attempt_id).await?;
    state.attempts.discard(attempt_id).await;

    tracing::info!("User {} abandoned attempt {}", claims.sub, attempt_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the caller's recorded results, newest first.
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.results.list_for_user(claims.user_id()?).await?;
    Ok(Json(records))
}
