//! Application state shared across handlers.

use std::sync::Arc;

use mongodb::Database;
use tokio::sync::Mutex;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database handle and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    db: Database,
    // One migration run at a time per process; see routes::migrations.
    migration_lock: Mutex<()>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, db: Database) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                migration_lock: Mutex::new(()),
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database handle.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Lock serializing migration runs within this process.
    #[must_use]
    pub fn migration_lock(&self) -> &Mutex<()> {
        &self.inner.migration_lock
    }
}
