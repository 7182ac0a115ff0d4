// src/store/postgres.rs

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, types::Json};

use super::{QuizRepository, ResultStore};
use crate::{
    error::AppError,
    models::{
        attempt::{AttemptRecord, LeaderboardEntry},
        quiz::{NewQuiz, Question, QuizDefinition, QuizOption, QuizSummary},
    },
};

/// Helper struct for fetching the quiz header row.
#[derive(FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    time_budget_seconds: i32,
    points_per_question: i32,
}

/// Helper struct for fetching one question with its options.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    content: String,
    options: Json<Vec<QuizOption>>,
    correct_option_id: i64,
    points: Option<i32>,
}

/// Reads a non-negative INTEGER column. A negative value means the row was
/// written by something other than this service.
fn non_negative(value: i32, column: &str) -> Result<u32, AppError> {
    u32::try_from(value).map_err(|_| {
        AppError::InternalServerError(format!("Column {} holds negative value {}", column, value))
    })
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            text: row.content,
            options: row.options.0,
            correct_option_id: row.correct_option_id,
            points: row
                .points
                .map(|p| non_negative(p, "quiz_questions.points"))
                .transpose()?,
        })
    }
}

/// Quiz repository backed by the `quizzes` and `quiz_questions` tables.
pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizRepository for PgQuizRepository {
    async fn find(&self, quiz_id: i64) -> Result<Option<Arc<QuizDefinition>>, AppError> {
        let quiz = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, time_budget_seconds, points_per_question
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch quiz {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        let Some(quiz) = quiz else {
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, content, options, correct_option_id, points
            FROM quiz_questions
            WHERE quiz_id = $1
            ORDER BY position
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions of quiz {}: {:?}", quiz_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(Some(Arc::new(QuizDefinition {
            id: quiz.id,
            title: quiz.title,
            time_budget_seconds: non_negative(quiz.time_budget_seconds, "quizzes.time_budget_seconds")?,
            points_per_question: non_negative(quiz.points_per_question, "quizzes.points_per_question")?,
            questions: questions
                .into_iter()
                .map(Question::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })))
    }

    async fn list(&self) -> Result<Vec<QuizSummary>, AppError> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT
                q.id,
                q.title,
                q.time_budget_seconds,
                COUNT(qq.id) AS question_count
            FROM quizzes q
            LEFT JOIN quiz_questions qq ON qq.quiz_id = q.id
            GROUP BY q.id
            ORDER BY q.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(quizzes)
    }

    async fn create(&self, quiz: NewQuiz) -> Result<QuizDefinition, AppError> {
        let mut tx = self.pool.begin().await?;

        let quiz_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (title, time_budget_seconds, points_per_question)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&quiz.title)
        .bind(quiz.time_budget_seconds as i32)
        .bind(quiz.points_per_question as i32)
        .fetch_one(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(quiz.questions.len());
        for (position, q) in quiz.questions.iter().enumerate() {
            let options = q.numbered_options();
            let correct_option_id = q.correct_option_id()?;

            let question_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO quiz_questions (quiz_id, position, content, options, correct_option_id, points)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(quiz_id)
            .bind(position as i32)
            .bind(&q.text)
            .bind(Json(&options))
            .bind(correct_option_id)
            .bind(q.points.map(|p| p as i32))
            .fetch_one(&mut *tx)
            .await?;

            questions.push(Question {
                id: question_id,
                text: q.text.clone(),
                options,
                correct_option_id,
                points: q.points,
            });
        }

        tx.commit().await?;
        tracing::info!("Created quiz {} with {} questions", quiz_id, questions.len());

        Ok(QuizDefinition {
            id: quiz_id,
            title: quiz.title,
            time_budget_seconds: quiz.time_budget_seconds,
            points_per_question: quiz.points_per_question,
            questions,
        })
    }
}

/// Result store backed by the `attempt_records` table.
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn save(&self, record: &AttemptRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO attempt_records (
                attempt_id, quiz_id, user_id, username,
                correct_count, total_questions, percentage, score,
                outcomes, started_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (attempt_id) DO NOTHING
            "#,
        )
        .bind(record.attempt_id)
        .bind(record.quiz_id)
        .bind(record.user_id)
        .bind(&record.username)
        .bind(record.correct_count)
        .bind(record.total_questions)
        .bind(record.percentage)
        .bind(record.score)
        .bind(&record.outcomes)
        .bind(record.started_at)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert attempt record: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<AttemptRecord>, AppError> {
        let records = sqlx::query_as::<_, AttemptRecord>(
            r#"
            SELECT
                attempt_id, quiz_id, user_id, username,
                correct_count, total_questions, percentage, score,
                outcomes, started_at, completed_at
            FROM attempt_records
            WHERE user_id = $1
            ORDER BY completed_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch attempt history: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(records)
    }

    async fn leaderboard(
        &self,
        quiz_id: i64,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT
                user_id,
                MAX(username) AS username,
                MAX(percentage) AS best_percentage,
                MAX(score) AS best_score,
                COUNT(*) AS attempts
            FROM attempt_records
            WHERE quiz_id = $1
            GROUP BY user_id
            ORDER BY best_percentage DESC, attempts ASC, user_id ASC
            LIMIT $2
            "#,
        )
        .bind(quiz_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(points: Option<i32>) -> QuestionRow {
        QuestionRow {
            id: 4,
            content: "Which roof ranks highest?".to_string(),
            options: Json(vec![
                QuizOption { id: 1, text: "Double-eave hip".to_string() },
                QuizOption { id: 2, text: "Flush gable".to_string() },
            ]),
            correct_option_id: 1,
            points,
        }
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(120, "quizzes.time_budget_seconds").unwrap(), 120);
        assert!(matches!(
            non_negative(-1, "quizzes.time_budget_seconds"),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn test_question_row_conversion() {
        let question = Question::try_from(row(Some(5))).unwrap();
        assert_eq!(question.points, Some(5));
        assert_eq!(question.options.len(), 2);

        assert_eq!(Question::try_from(row(None)).unwrap().points, None);
        assert!(matches!(
            Question::try_from(row(Some(-5))),
            Err(AppError::InternalServerError(_))
        ));
    }
}
