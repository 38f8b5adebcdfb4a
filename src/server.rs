//! Server lifecycle: route table construction, the MPD keepalive task, and shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::http::{self, state::AppState};
use crate::media::fs::Filesystem;
use crate::mpd::Database;

/// Subsonic façade in front of an MPD database and the music directory.
///
/// Owns the keepalive task (if any). Call [`Server::shutdown`] before exiting
/// so the task is stopped and joined.
pub struct Server {
    state: AppState,
    router: Router,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl Server {
    /// Build the route table and, when `config.keepalive` is non-zero, start
    /// pinging `db` in the background. Must be called within a Tokio runtime.
    pub fn new(db: Arc<dyn Database>, fs: Arc<dyn Filesystem>, config: Config) -> Self {
        let state = AppState {
            db,
            fs,
            config: Arc::new(config),
        };
        let router = http::build_router(state.clone());

        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();

        let interval = state.config.keepalive;
        if !interval.is_zero() {
            tracing::debug!("Starting MPD keepalive every {:?}", interval);
            tasks.spawn(keepalive(Arc::clone(&state.db), interval, cancel.clone()));
        }
        tasks.close();

        Server {
            state,
            router,
            cancel,
            tasks,
        }
    }

    /// The gated Subsonic router, ready for `axum::serve`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Stop background work and wait until it has exited.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tasks.wait().await;
        tracing::debug!("Background tasks stopped");
    }
}

/// Ping MPD immediately and then once per `interval` until `cancel` fires.
/// Ping failures are logged and never end the loop.
pub async fn keepalive(db: Arc<dyn Database>, interval: Duration, cancel: CancellationToken) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            // first tick completes immediately
            _ = tick.tick() => {}
        }

        if let Err(e) = db.ping().await {
            tracing::warn!("Failed to send keepalive message to MPD: {}", e);
        }
    }
}
