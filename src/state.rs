use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    attempt::AttemptRegistry,
    config::Config,
    store::{
        MemoryQuizRepository, MemoryResultStore, PgQuizRepository, PgResultStore, QuizRepository,
        ResultStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn ResultStore>,
    pub attempts: AttemptRegistry,
}

impl AppState {
    /// State backed by PostgreSQL for quizzes and results.
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        Self {
            config,
            quizzes: Arc::new(PgQuizRepository::new(pool.clone())),
            results: Arc::new(PgResultStore::new(pool)),
            attempts: AttemptRegistry::default(),
        }
    }

    /// State that keeps everything in process memory.
    pub fn in_memory(config: Config) -> Self {
        Self {
            config,
            quizzes: Arc::new(MemoryQuizRepository::default()),
            results: Arc::new(MemoryResultStore::default()),
            attempts: AttemptRegistry::default(),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
