//! Background projection scheduler.
//!
//! A single long-lived task per [`ProjectionScheduler`] wakes up on a fixed interval,
//! enumerates every workspace and extends its projection horizon. The loop is started
//! with [`ProjectionScheduler::start`] and ends when either [`ProjectionScheduler::stop`]
//! is called or the cancellation token passed to `start` is cancelled.
//!
//! Workspaces are synced one after another. A failed sync is logged and the loop moves
//! on to the next workspace; nothing that happens inside a tick stops the scheduler.

use crate::{
    config::settings::SchedulerConfig,
    core::projection::{self, ProjectionRunResult},
    db,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};
use tokio::{
    runtime::Handle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle state shared between the scheduler handle and its loop task.
#[derive(Debug, Default)]
struct LoopState {
    /// Token of the current loop, `None` when stopped
    stop: Option<CancellationToken>,
    /// Incremented on every start so a finishing loop never clears a newer one
    generation: u64,
}

impl LoopState {
    fn is_running(&self) -> bool {
        self.stop.as_ref().is_some_and(|token| !token.is_cancelled())
    }
}

/// Keeps every workspace's projections populated on a timer.
#[derive(Debug)]
pub struct ProjectionScheduler {
    db: DatabaseConnection,
    config: SchedulerConfig,
    state: Arc<Mutex<LoopState>>,
    ticks: Arc<AtomicU64>,
}

impl ProjectionScheduler {
    /// Creates a stopped scheduler. Unusable interval or horizon values are replaced
    /// with the defaults (one hour, twelve months).
    #[must_use]
    pub fn new(db: DatabaseConnection, config: SchedulerConfig) -> Self {
        Self {
            db,
            config: config.normalized(),
            state: Arc::new(Mutex::new(LoopState::default())),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The effective configuration.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Number of ticks completed since the scheduler was created.
    #[must_use]
    pub fn completed_ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Whether the loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_state().is_running()
    }

    /// Starts the background loop on the current tokio runtime.
    ///
    /// Returns `false` without spawning anything if a loop is already running, if
    /// `cancel` is already cancelled, or if the calling thread is not inside a tokio
    /// runtime. The loop stops when `cancel` is cancelled or [`stop`](Self::stop) is
    /// called, whichever comes first. The first tick runs immediately.
    pub fn start(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            debug!("Not starting projection scheduler: already cancelled");
            return false;
        }
        let Ok(runtime) = Handle::try_current() else {
            error!("Cannot start projection scheduler outside a tokio runtime");
            return false;
        };

        let (token, generation) = {
            let mut state = self.lock_state();
            if state.is_running() {
                debug!("Projection scheduler already running");
                return false;
            }
            let token = cancel.child_token();
            state.generation += 1;
            state.stop = Some(token.clone());
            (token, state.generation)
        };

        info!(
            interval_secs = self.config.interval.as_secs(),
            months_ahead = self.config.months_ahead,
            "Starting projection scheduler"
        );

        let worker = Worker {
            db: self.db.clone(),
            config: self.config,
            ticks: Arc::clone(&self.ticks),
        };
        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            worker.run(token).await;

            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation == generation {
                state.stop = None;
            }
            info!("Projection scheduler stopped");
        });

        true
    }

    /// Stops the loop. Safe to call when already stopped and from several callers.
    pub fn stop(&self) {
        if let Some(token) = self.lock_state().stop.take() {
            token.cancel();
            info!("Stopping projection scheduler");
        }
    }

    /// Runs one workspace's generation immediately, independent of the timer.
    ///
    /// # Errors
    /// Returns [`Error::WorkspaceNotFound`] for unknown or deleted workspaces, or the
    /// error from listing the workspace's templates.
    #[instrument(skip(self))]
    pub async fn sync_workspace(&self, workspace_id: i64) -> Result<ProjectionRunResult> {
        if !db::workspaces::workspace_exists(&self.db, workspace_id).await? {
            return Err(Error::WorkspaceNotFound { id: workspace_id });
        }
        projection::generate_projections(&self.db, workspace_id, self.config.months_ahead).await
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProjectionScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The part of the scheduler moved into the loop task.
struct Worker {
    db: DatabaseConnection,
    config: SchedulerConfig,
    ticks: Arc<AtomicU64>,
}

impl Worker {
    async fn run(&self, token: CancellationToken) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            self.tick(&token).await;
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Syncs every workspace once, checking for cancellation between workspaces.
    async fn tick(&self, token: &CancellationToken) {
        let workspace_ids = match db::list_all_workspace_ids(&self.db).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to list workspaces: {e}");
                return;
            }
        };
        debug!(workspaces = workspace_ids.len(), "Projection tick");

        let mut total = ProjectionRunResult::default();
        for workspace_id in workspace_ids {
            if token.is_cancelled() {
                debug!("Tick interrupted by shutdown");
                return;
            }

            let sync = projection::generate_projections(
                &self.db,
                workspace_id,
                self.config.months_ahead,
            );
            let result = tokio::select! {
                () = token.cancelled() => return,
                result = sync => result,
            };

            match result {
                Ok(result) => {
                    if result.has_errors() {
                        warn!(workspace_id, "Projection run finished with errors: {result}");
                    }
                    total.merge(result);
                }
                Err(e) => error!(workspace_id, "Failed to sync workspace: {e}"),
            }
        }

        info!("Projection tick complete: {total}");
    }
}
