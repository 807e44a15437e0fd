// Application state module
// Immutable per-process state shared by every connection

use super::types::Config;
use crate::storage::{FsError, RootDir};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Served directory, fixed at startup
    pub root: RootDir,
}

impl AppState {
    /// Build state from configuration, resolving the served root
    ///
    /// Falls back to the process working directory when `storage.root` is unset.
    pub fn new(config: &Config) -> Result<Self, FsError> {
        let root = match config.storage.root.as_deref() {
            Some(path) => RootDir::new(path)?,
            None => RootDir::new(std::env::current_dir()?)?,
        };
        Ok(Self::with_root(config, root))
    }

    pub fn with_root(config: &Config, root: RootDir) -> Self {
        Self {
            config: config.clone(),
            root,
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
