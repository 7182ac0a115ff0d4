// src/store/mod.rs

//! Collaborators around the attempt controller: where quiz definitions come
//! from and where finished attempts go.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptRecord, LeaderboardEntry},
        quiz::{CreateQuizRequest, NewQuiz, QuizDefinition, QuizSummary},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryQuizRepository, MemoryResultStore};
pub use postgres::{PgQuizRepository, PgResultStore};

/// Read access to quiz definitions, plus creation for admins.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn find(&self, quiz_id: i64) -> Result<Option<Arc<QuizDefinition>>, AppError>;

    async fn list(&self) -> Result<Vec<QuizSummary>, AppError>;

    /// Stores the quiz and assigns ids to the quiz and its questions.
    async fn create(&self, quiz: NewQuiz) -> Result<QuizDefinition, AppError>;
}

/// Persistence target for submitted attempts.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Saves a record. Saving the same attempt id twice keeps the first record.
    async fn save(&self, record: &AttemptRecord) -> Result<(), AppError>;

    /// All records of a user, newest first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<AttemptRecord>, AppError>;

    /// Best percentage per user for a quiz; ties go to the user with fewer attempts.
    async fn leaderboard(&self, quiz_id: i64, limit: i64)
    -> Result<Vec<LeaderboardEntry>, AppError>;
}

/// Loads a JSON array of quiz definitions into the repository.
/// Returns how many quizzes were created.
pub async fn seed_quizzes(repo: &dyn QuizRepository, json: &str) -> Result<usize, AppError> {
    let requests: Vec<CreateQuizRequest> = serde_json::from_str(json)?;
    let count = requests.len();

    for req in requests {
        let quiz = repo.create(req.into_new_quiz()?).await?;
        tracing::info!("Seeded quiz {} '{}'", quiz.id, quiz.title);
    }

    Ok(count)
}
