// src/attempt/session.rs

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, RwLock},
    task::AbortHandle,
    time::Instant,
};
use uuid::Uuid;

use super::AttemptState;
use crate::{
    models::attempt::{AttemptRecord, AttemptView},
    store::ResultStore,
};

struct SessionInner {
    state: AttemptState,
    /// When the result store confirmed the submitted result.
    recorded_at: Option<Instant>,
}

/// A live attempt owned by one user.
///
/// The countdown task and request handlers both go through the same lock,
/// so a timer-driven submission and a manual one are serialized. Whoever
/// lands first submits; the other sees the stored result.
pub struct AttemptSession {
    id: Uuid,
    quiz_id: i64,
    user_id: i64,
    username: String,
    started_at: DateTime<Utc>,
    inner: Mutex<SessionInner>,
    countdown: OnceLock<AbortHandle>,
}

impl AttemptSession {
    pub fn new(state: AttemptState, user_id: i64, username: &str) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            quiz_id: state.definition().id,
            user_id,
            username: username.to_owned(),
            started_at: Utc::now(),
            inner: Mutex::new(SessionInner {
                state,
                recorded_at: None,
            }),
            countdown: OnceLock::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Runs a mutation under the session lock.
    ///
    /// If the attempt is submitted afterwards and its result has not been
    /// recorded yet, the record is saved to `results` before the lock is
    /// released. A failed save is logged and retried by the next `apply`
    /// or `settle`; the attempt stays submitted either way.
    pub async fn apply<R, F>(&self, results: &Arc<dyn ResultStore>, op: F) -> R
    where
        F: FnOnce(&mut AttemptState) -> R + Send,
        R: Send,
    {
        let mut inner = self.inner.lock().await;
        let output = op(&mut inner.state);
        self.record(&mut inner, results).await;
        output
    }

    /// Retries a pending save and reports when the result was recorded.
    /// `None` while the attempt is running or its save keeps failing.
    pub async fn settle(&self, results: &Arc<dyn ResultStore>) -> Option<Instant> {
        let mut inner = self.inner.lock().await;
        self.record(&mut inner, results).await;
        inner.recorded_at
    }

    async fn record(&self, inner: &mut SessionInner, results: &Arc<dyn ResultStore>) {
        if inner.recorded_at.is_some() {
            return;
        }
        let Some(result) = inner.state.result() else {
            return;
        };
        let record = AttemptRecord::new(
            self.id,
            self.quiz_id,
            self.user_id,
            &self.username,
            result,
            self.started_at,
        );

        // Detached so that aborting the caller cannot cut a save in half.
        // Saves are idempotent per attempt id, so a retry after an abort
        // never produces a second record.
        let store = Arc::clone(results);
        let saved = tokio::spawn(async move {
            let saved = store.save(&record).await;
            saved.map(|()| record)
        })
        .await;

        match saved {
            Ok(Ok(record)) => {
                inner.recorded_at = Some(Instant::now());
                tracing::info!(
                    "Recorded attempt {} for user {}: {}/{} ({}%)",
                    self.id,
                    self.user_id,
                    record.correct_count,
                    record.total_questions,
                    record.percentage
                );
            }
            Ok(Err(e)) => tracing::error!("Failed to record attempt {}: {:?}", self.id, e),
            Err(e) => tracing::error!("Recording task for attempt {} died: {:?}", self.id, e),
        }
    }

    /// Reads the state under the session lock.
    pub async fn read<R>(&self, op: impl FnOnce(&AttemptState) -> R) -> R {
        let inner = self.inner.lock().await;
        op(&inner.state)
    }

    pub async fn view(&self) -> AttemptView {
        self.read(|state| AttemptView::new(self.id, state)).await
    }

    pub(super) fn attach_countdown(&self, handle: AbortHandle) {
        if self.countdown.set(handle).is_err() {
            tracing::warn!("Attempt {} already has a countdown", self.id);
        }
    }

    /// Cancels the countdown task, if one was started.
    pub fn stop_countdown(&self) {
        if let Some(handle) = self.countdown.get() {
            handle.abort();
        }
    }
}

/// All live attempts, keyed by attempt id.
#[derive(Clone, Default)]
pub struct AttemptRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<AttemptSession>>>>,
}

impl AttemptRegistry {
    pub async fn insert(&self, session: Arc<AttemptSession>) {
        self.sessions.write().await.insert(session.id(), session);
    }

    pub async fn get(&self, attempt_id: Uuid) -> Option<Arc<AttemptSession>> {
        self.sessions.read().await.get(&attempt_id).cloned()
    }

    /// Drops the session and cancels its countdown.
    pub async fn discard(&self, attempt_id: Uuid) -> Option<Arc<AttemptSession>> {
        let session = self.sessions.write().await.remove(&attempt_id)?;
        session.stop_countdown();
        Some(session)
    }

    /// Evicts sessions whose result was recorded at least `retention` ago,
    /// retrying pending saves on the way. Running attempts are kept.
    /// Returns how many sessions were evicted.
    pub async fn sweep(&self, results: &Arc<dyn ResultStore>, retention: Duration) -> usize {
        let sessions: Vec<Arc<AttemptSession>> =
            self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for session in sessions {
            if let Some(recorded_at) = session.settle(results).await {
                if recorded_at.elapsed() >= retention {
                    expired.push(session.id());
                }
            }
        }

        let mut map = self.sessions.write().await;
        expired
            .into_iter()
            .filter_map(|id| map.remove(&id))
            .inspect(|session| session.stop_countdown())
            .count()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
