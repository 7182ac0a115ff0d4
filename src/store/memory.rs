// src/store/memory.rs

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{QuizRepository, ResultStore};
use crate::{
    error::AppError,
    models::{
        attempt::{AttemptRecord, LeaderboardEntry},
        quiz::{NewQuiz, Question, QuizDefinition, QuizSummary},
    },
};

#[derive(Default)]
struct QuizTable {
    quizzes: BTreeMap<i64, Arc<QuizDefinition>>,
    last_quiz_id: i64,
    last_question_id: i64,
}

/// Process-local quiz repository, used when no database is configured.
#[derive(Default)]
pub struct MemoryQuizRepository {
    table: RwLock<QuizTable>,
}

#[async_trait]
impl QuizRepository for MemoryQuizRepository {
    async fn find(&self, quiz_id: i64) -> Result<Option<Arc<QuizDefinition>>, AppError> {
        Ok(self.table.read().await.quizzes.get(&quiz_id).cloned())
    }

    async fn list(&self) -> Result<Vec<QuizSummary>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .quizzes
            .values()
            .map(|q| QuizSummary {
                id: q.id,
                title: q.title.clone(),
                time_budget_seconds: q.time_budget_seconds as i32,
                question_count: q.question_count() as i64,
            })
            .collect())
    }

    async fn create(&self, quiz: NewQuiz) -> Result<QuizDefinition, AppError> {
        let mut table = self.table.write().await;

        table.last_quiz_id += 1;
        let quiz_id = table.last_quiz_id;

        let mut questions = Vec::with_capacity(quiz.questions.len());
        for q in &quiz.questions {
            let correct_option_id = q.correct_option_id()?;
            table.last_question_id += 1;
            questions.push(Question {
                id: table.last_question_id,
                text: q.text.clone(),
                options: q.numbered_options(),
                correct_option_id,
                points: q.points,
            });
        }

        let definition = QuizDefinition {
            id: quiz_id,
            title: quiz.title,
            time_budget_seconds: quiz.time_budget_seconds,
            points_per_question: quiz.points_per_question,
            questions,
        };
        table
            .quizzes
            .insert(quiz_id, Arc::new(definition.clone()));

        Ok(definition)
    }
}

/// Process-local result store, used when no database is configured.
#[derive(Default)]
pub struct MemoryResultStore {
    records: RwLock<Vec<AttemptRecord>>,
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save(&self, record: &AttemptRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.attempt_id == record.attempt_id) {
            tracing::warn!("Attempt {} already recorded, keeping the first record", record.attempt_id);
            return Ok(());
        }
        records.push(record.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<AttemptRecord>, AppError> {
        let records = self.records.read().await;
        let mut mine: Vec<AttemptRecord> = records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(mine)
    }

    async fn leaderboard(
        &self,
        quiz_id: i64,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let records = self.records.read().await;

        let mut best: HashMap<i64, LeaderboardEntry> = HashMap::new();
        for r in records.iter().filter(|r| r.quiz_id == quiz_id) {
            let entry = best.entry(r.user_id).or_insert_with(|| LeaderboardEntry {
                user_id: r.user_id,
                username: r.username.clone(),
                best_percentage: r.percentage,
                best_score: r.score,
                attempts: 0,
            });
            entry.attempts += 1;
            entry.best_percentage = entry.best_percentage.max(r.percentage);
            entry.best_score = entry.best_score.max(r.score);
        }

        let mut rows: Vec<LeaderboardEntry> = best.into_values().collect();
        rows.sort_by(|a, b| {
            b.best_percentage
                .cmp(&a.best_percentage)
                .then(a.attempts.cmp(&b.attempts))
                .then(a.user_id.cmp(&b.user_id))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::NewQuestion;
    use chrono::{Duration, Utc};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn new_quiz(title: &str) -> NewQuiz {
        NewQuiz {
            title: title.to_string(),
            time_budget_seconds: 60,
            points_per_question: 10,
            questions: vec![
                NewQuestion {
                    text: "Q1".to_string(),
                    options: vec!["A".to_string(), "B".to_string()],
                    correct_option: 1,
                    points: None,
                },
                NewQuestion {
                    text: "Q2".to_string(),
                    options: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                    correct_option: 0,
                    points: Some(5),
                },
            ],
        }
    }

    fn record(user_id: i64, quiz_id: i64, percentage: i32, minutes_ago: i64) -> AttemptRecord {
        let completed_at = Utc::now() - Duration::minutes(minutes_ago);
        AttemptRecord {
            attempt_id: Uuid::new_v4(),
            quiz_id,
            user_id,
            username: format!("user{}", user_id),
            correct_count: 0,
            total_questions: 4,
            percentage,
            score: percentage / 10,
            outcomes: Json(vec![]),
            started_at: completed_at - Duration::minutes(1),
            completed_at,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let repo = MemoryQuizRepository::default();
        let first = repo.create(new_quiz("First")).await.unwrap();
        let second = repo.create(new_quiz("Second")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        let question_ids: Vec<i64> = second.questions.iter().map(|q| q.id).collect();
        assert_eq!(question_ids, vec![3, 4]);
        assert_eq!(first.questions[0].correct_option_id, 2);
        assert_eq!(first.questions[1].options.len(), 3);

        let found = repo.find(2).await.unwrap().unwrap();
        assert_eq!(found.title, "Second");
        assert!(repo.find(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_first_record() {
        let store = MemoryResultStore::default();
        let rec = record(1, 1, 50, 0);
        store.save(&rec).await.unwrap();

        let mut dup = rec.clone();
        dup.percentage = 100;
        store.save(&dup).await.unwrap();

        let mine = store.list_for_user(1).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].percentage, 50);
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let store = MemoryResultStore::default();
        store.save(&record(1, 1, 10, 30)).await.unwrap();
        store.save(&record(1, 1, 20, 5)).await.unwrap();
        store.save(&record(2, 1, 90, 1)).await.unwrap();

        let mine = store.list_for_user(1).await.unwrap();
        let percentages: Vec<i32> = mine.iter().map(|r| r.percentage).collect();
        assert_eq!(percentages, vec![20, 10]);
    }

    #[tokio::test]
    async fn test_leaderboard_best_per_user() {
        let store = MemoryResultStore::default();
        store.save(&record(1, 1, 40, 3)).await.unwrap();
        store.save(&record(1, 1, 80, 2)).await.unwrap();
        store.save(&record(2, 1, 80, 1)).await.unwrap();
        store.save(&record(3, 1, 60, 1)).await.unwrap();
        store.save(&record(4, 2, 100, 1)).await.unwrap();

        let board = store.leaderboard(1, 5).await.unwrap();
        let order: Vec<i64> = board.iter().map(|e| e.user_id).collect();
        // User 2 reached 80 in one attempt, user 1 needed two.
        assert_eq!(order, vec![2, 1, 3]);
        assert_eq!(board[1].attempts, 2);
        assert_eq!(board[1].best_percentage, 80);

        let top = store.leaderboard(1, 1).await.unwrap();
        assert_eq!(top.len(), 1);
    }
}
