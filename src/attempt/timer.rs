// src/attempt/timer.rs

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};

use super::{AttemptRegistry, AttemptSession, TickOutcome};
use crate::store::ResultStore;

/// Spawns the countdown for a running attempt.
///
/// Every `period` the attempt loses one second. The task ends when the
/// attempt runs out of time (auto-submit) or when a tick finds it already
/// submitted. `AttemptRegistry::discard` aborts it early.
pub fn spawn_countdown(
    session: Arc<AttemptSession>,
    results: Arc<dyn ResultStore>,
    period: Duration,
) -> JoinHandle<()> {
    let task_session = Arc::clone(&session);

    let handle = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            match task_session.apply(&results, |state| state.tick()).await {
                TickOutcome::Running(remaining) => {
                    tracing::trace!("Attempt {}: {}s left", task_session.id(), remaining);
                }
                TickOutcome::AutoSubmitted => {
                    tracing::info!("Attempt {} ran out of time and was submitted", task_session.id());
                    break;
                }
                TickOutcome::Idle => {
                    tracing::debug!("Countdown for attempt {} stopped", task_session.id());
                    break;
                }
            }
        }
    });

    session.attach_countdown(handle.abort_handle());
    handle
}

/// Spawns the task that evicts finished attempts from the registry.
///
/// Every `retention` it retries pending result saves and drops sessions
/// recorded at least `retention` ago, so a submitted attempt stays
/// reviewable for between one and two retention periods.
pub fn spawn_sweeper(
    registry: AttemptRegistry,
    results: Arc<dyn ResultStore>,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + retention, retention);
        loop {
            interval.tick().await;
            let evicted = registry.sweep(&results, retention).await;
            if evicted > 0 {
                tracing::debug!("Evicted {} finished attempts", evicted);
            }
        }
    })
}
