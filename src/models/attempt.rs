// src/models/attempt.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

use crate::{
    attempt::{AttemptResult, AttemptState, AttemptStatus, Direction, QuestionOutcome},
    models::quiz::{PublicQuestion, QuizOption},
};

/// Represents the 'attempt_records' table in the database.
/// One row per submitted attempt, written once.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: Uuid,
    pub quiz_id: i64,
    pub user_id: i64,
    pub username: String,
    pub correct_count: i32,
    pub total_questions: i32,
    pub percentage: i32,
    pub score: i32,
    pub outcomes: Json<Vec<QuestionOutcome>>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(
        attempt_id: Uuid,
        quiz_id: i64,
        user_id: i64,
        username: &str,
        result: &AttemptResult,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            attempt_id,
            quiz_id,
            user_id,
            username: username.to_owned(),
            correct_count: result.correct_count as i32,
            total_questions: result.total_questions as i32,
            percentage: result.percentage as i32,
            score: result.score as i32,
            outcomes: Json(result.outcomes.clone()),
            started_at,
            completed_at: Utc::now(),
        }
    }
}

/// Aggregated row for the per-quiz leaderboard: best result per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub best_percentage: i32,
    pub best_score: i32,
    pub attempts: i64,
}

/// DTO for answering a question.
#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub question_id: i64,
    pub option_id: i64,
}

/// DTO for moving through the quiz.
/// Exactly one of `direction` (step) or `index` (jump) must be given.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Option<Direction>,
    pub index: Option<usize>,
}

/// Snapshot of an attempt as shown to its owner.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptView {
    pub attempt_id: Uuid,
    pub quiz_id: i64,
    pub status: AttemptStatus,
    pub current_question_index: usize,
    pub question_count: usize,
    pub current_question: PublicQuestion,
    pub answers: BTreeMap<i64, i64>,
    pub remaining_seconds: u32,
    /// Present once the attempt has been submitted.
    pub result: Option<AttemptResult>,
}

impl AttemptView {
    pub fn new(attempt_id: Uuid, state: &AttemptState) -> Self {
        Self {
            attempt_id,
            quiz_id: state.definition().id,
            status: state.status(),
            current_question_index: state.current_question_index(),
            question_count: state.definition().question_count(),
            current_question: PublicQuestion::from(state.current_question()),
            answers: state.answers().clone(),
            remaining_seconds: state.remaining_seconds(),
            result: state.result().map(|r| r.as_ref().clone()),
        }
    }
}

/// One line of the post-submission review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub question_id: i64,
    pub text: String,
    pub options: Vec<QuizOption>,
    pub selected_option_id: Option<i64>,
    pub selected_text: Option<String>,
    pub correct_option_id: i64,
    pub correct_text: Option<String>,
    pub is_correct: bool,
}

/// DTO returned by the review endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptReview {
    pub attempt_id: Uuid,
    pub quiz_id: i64,
    pub correct_count: usize,
    pub total_questions: usize,
    pub percentage: u32,
    pub score: u32,
    pub max_score: u32,
    pub items: Vec<ReviewItem>,
}
