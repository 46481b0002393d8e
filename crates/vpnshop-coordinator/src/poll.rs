// SPDX-FileCopyrightText: 2026 Vpnshop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background polling of remote configuration tasks.
//!
//! Each accepted create/renew call gets one detached poll loop, tracked by
//! [`PollSupervisor`] under its connection id. A loop ends on a terminal remote
//! status, when its attempt budget runs out, or when it is cancelled. Delivery
//! goes through the stored chat target, so a loop keeps working after the
//! handler that started it has returned.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use vpnshop_config::model::MasterConfig;
use vpnshop_core::types::{ChatTarget, ConnectionUpdate, Notice, TaskPhase};
use vpnshop_core::{Notifier, Orchestrator, Repository, VpnshopError};

/// Floor for the pause between two status queries.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default attempt budget per task.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 40;

/// Tries per status write before a storage error is given up on.
const WRITE_ATTEMPTS: u32 = 3;
const WRITE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Shown when a ready configuration cannot be stored.
const NOT_SAVED_MESSAGE: &str = "configuration could not be saved";

/// Pacing of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSettings {
    /// The interval is clamped to at least [`MIN_POLL_INTERVAL`] and the
    /// budget to at least one attempt.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &MasterConfig) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs),
            config.max_poll_attempts,
        )
    }

    /// Upper bound on how long one loop can run.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), DEFAULT_MAX_ATTEMPTS)
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Active,
    Failed,
    TimedOut,
    Cancelled,
}

/// Everything a detached loop needs. Cloned into the spawned task.
#[derive(Clone)]
pub struct PollJob {
    pub repo: Arc<dyn Repository>,
    pub orchestrator: Arc<dyn Orchestrator>,
    pub notifier: Arc<dyn Notifier>,
    pub settings: PollSettings,
    pub target: ChatTarget,
    pub connection_id: i64,
    pub task_id: String,
}

impl PollJob {
    /// Runs the bounded loop to a terminal outcome.
    ///
    /// Status-query failures count as a pending attempt. Every terminal
    /// outcome except cancellation writes the connection status before the
    /// user is notified.
    pub async fn run(self, cancel: CancellationToken) -> PollOutcome {
        let connection_id = self.connection_id;
        let task_id = self.task_id.as_str();

        for attempt in 1..=self.settings.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(connection_id, task_id, attempt, "poll cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.settings.interval) => {}
            }

            let status = match self.orchestrator.get_task_status(task_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(connection_id, task_id, attempt, error = %e, "task status query failed, will retry");
                    continue;
                }
            };

            match status.phase() {
                TaskPhase::Ready(config_text) => {
                    if !self.write(ConnectionUpdate::active(config_text.clone())).await {
                        warn!(connection_id, task_id, attempt, "ready configuration not stored");
                        self.write(ConnectionUpdate::failed()).await;
                        self.notify(Notice::ConfigFailed {
                            connection_id,
                            message: NOT_SAVED_MESSAGE.to_string(),
                        })
                        .await;
                        return PollOutcome::Failed;
                    }
                    info!(connection_id, task_id, attempt, "configuration ready");
                    self.notify(Notice::ConfigReady {
                        connection_id,
                        config_text,
                    })
                    .await;
                    return PollOutcome::Active;
                }
                TaskPhase::Failed(message) => {
                    self.write(ConnectionUpdate::failed()).await;
                    warn!(connection_id, task_id, attempt, message = %message, "remote task failed");
                    self.notify(Notice::ConfigFailed {
                        connection_id,
                        message,
                    })
                    .await;
                    return PollOutcome::Failed;
                }
                TaskPhase::Pending => {
                    debug!(connection_id, task_id, attempt, status = %status.status, "task not ready");
                }
            }
        }

        self.write(ConnectionUpdate::failed()).await;
        warn!(
            connection_id,
            task_id,
            attempts = self.settings.max_attempts,
            "poll budget exhausted"
        );
        self.notify(Notice::ConfigTimeout { connection_id }).await;
        PollOutcome::TimedOut
    }

    /// Moves the connection to `update.status`, first applying `creating`
    /// in case the dispatcher could not record it. Storage errors are retried.
    /// Returns whether the row now has the requested status.
    async fn write(&self, update: ConnectionUpdate) -> bool {
        let creating = ConnectionUpdate::creating(self.task_id.clone());
        for attempt in 1..=WRITE_ATTEMPTS {
            let result = async {
                self.repo
                    .update_connection_task(self.connection_id, &creating)
                    .await?;
                self.repo
                    .update_connection_task(self.connection_id, &update)
                    .await
            }
            .await;
            match result {
                Ok(true) => return true,
                Ok(false) => {
                    warn!(
                        connection_id = self.connection_id,
                        to = %update.status,
                        "connection already left the expected status"
                    );
                    return false;
                }
                Err(e) => {
                    warn!(
                        connection_id = self.connection_id,
                        attempt,
                        error = %e,
                        "failed to record connection status"
                    );
                    if attempt < WRITE_ATTEMPTS {
                        tokio::time::sleep(WRITE_RETRY_DELAY).await;
                    }
                }
            }
        }
        false
    }

    async fn notify(&self, notice: Notice) {
        if let Err(e) = self.notifier.notify(&self.target, notice).await {
            warn!(connection_id = self.connection_id, error = %e, "poll notice not delivered");
        }
    }
}

/// Registry of live poll loops keyed by connection id.
#[derive(Clone)]
pub struct PollSupervisor {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    live: Arc<Mutex<HashMap<i64, CancellationToken>>>,
}

impl PollSupervisor {
    /// Loops are cancelled when `shutdown` is.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            tracker: TaskTracker::new(),
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn live(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, CancellationToken>>, VpnshopError> {
        self.live
            .lock()
            .map_err(|_| VpnshopError::Internal("poll registry lock poisoned".into()))
    }

    /// Spawns `work` for `connection_id` unless a loop for it is already live.
    /// Returns whether a new loop was started.
    pub fn spawn<F, Fut>(&self, connection_id: i64, work: F) -> Result<bool, VpnshopError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = PollOutcome> + Send + 'static,
    {
        let token = self.shutdown.child_token();
        {
            let mut live = self.live()?;
            if live.contains_key(&connection_id) {
                debug!(connection_id, "poll already running, not dispatching again");
                return Ok(false);
            }
            live.insert(connection_id, token.clone());
        }

        let fut = work(token);
        let registry = Arc::clone(&self.live);
        self.tracker.spawn(async move {
            let outcome = fut.await;
            if let Ok(mut live) = registry.lock() {
                live.remove(&connection_id);
            }
            debug!(connection_id, ?outcome, "poll task finished");
        });
        Ok(true)
    }

    /// Starts the loop described by `job`.
    pub fn spawn_job(&self, job: PollJob) -> Result<bool, VpnshopError> {
        self.spawn(job.connection_id, move |cancel| job.run(cancel))
    }

    pub fn is_polling(&self, connection_id: i64) -> bool {
        self.live()
            .map(|live| live.contains_key(&connection_id))
            .unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.live().map(|live| live.len()).unwrap_or(0)
    }

    /// Cancels one loop. Returns whether it was live.
    pub fn cancel(&self, connection_id: i64) -> bool {
        match self.live() {
            Ok(live) => match live.get(&connection_id) {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Waits until every loop spawned so far has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancels every loop and waits up to `grace` for them to stop.
    pub async fn shutdown(&self, grace: Duration) {
        self.shutdown.cancel();
        self.tracker.close();
        let remaining = self.tracker.len();
        if remaining > 0 {
            info!(count = remaining, "waiting for poll tasks to stop");
        }
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(remaining = self.tracker.len(), "poll tasks still running after grace period");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_clamp_interval_and_attempts() {
        let settings = PollSettings::new(Duration::from_secs(1), 0);
        assert_eq!(settings.interval, MIN_POLL_INTERVAL);
        assert_eq!(settings.max_attempts, 1);

        let settings = PollSettings::from_config(&MasterConfig::default());
        assert_eq!(settings.interval, Duration::from_secs(15));
        assert_eq!(settings.max_attempts, 40);
        assert_eq!(settings.budget(), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn duplicate_spawn_is_refused_while_live() {
        let supervisor = PollSupervisor::new(CancellationToken::new());
        let started = supervisor
            .spawn(7, |cancel| async move {
                cancel.cancelled().await;
                PollOutcome::Cancelled
            })
            .unwrap();
        assert!(started);
        assert!(supervisor.is_polling(7));

        let again = supervisor
            .spawn(7, |_| async { PollOutcome::Active })
            .unwrap();
        assert!(!again);

        assert!(supervisor.cancel(7));
        supervisor.drain().await;
        assert!(!supervisor.is_polling(7));
        assert_eq!(supervisor.active_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_cancels_children() {
        let root = CancellationToken::new();
        let supervisor = PollSupervisor::new(root.clone());
        for id in 1..=3 {
            supervisor
                .spawn(id, |cancel| async move {
                    cancel.cancelled().await;
                    PollOutcome::Cancelled
                })
                .unwrap();
        }
        assert_eq!(supervisor.active_count(), 3);
        supervisor.shutdown(Duration::from_secs(1)).await;
        assert!(root.is_cancelled());
        assert_eq!(supervisor.active_count(), 0);
    }
}
