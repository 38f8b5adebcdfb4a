use std::sync::Arc;

use crate::config::Config;
use crate::media::fs::Filesystem;
use crate::mpd::Database;

/// Shared application state injected into the gate and every route handler.
/// All fields are cheap `Arc` clones; Config is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub fs: Arc<dyn Filesystem>,
    pub config: Arc<Config>,
}
