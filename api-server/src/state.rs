//! Application state

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use taskflow_core::board::Board;
use taskflow_core::config::Config;
use taskflow_core::prefs::{PreferenceStore, Preferences};
use taskflow_core::project::ProjectService;
use taskflow_core::record::RecordStore;
use taskflow_core::task::TaskService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    board: RwLock<Board>,
    prefs_store: PreferenceStore,
    preferences: RwLock<Preferences>,
    backend: &'static str,
}

impl AppState {
    /// Open the configured store and load the initial task and project lists
    pub async fn new(config: &Config) -> taskflow_core::Result<Self> {
        let store = config.open_store().await?;
        Ok(Self::with_store(
            store,
            &config.task_table,
            &config.project_table,
            config.preferences_path(),
        )
        .await)
    }

    /// Build state on an already opened store
    pub async fn with_store(
        store: Arc<dyn RecordStore>,
        task_table: &str,
        project_table: &str,
        preferences_path: PathBuf,
    ) -> Self {
        let backend = store.backend_name();
        let mut board = Board::new(
            Arc::new(TaskService::new(Arc::clone(&store), task_table)),
            Arc::new(ProjectService::new(store, project_table)),
        );
        if let Err(e) = board.load().await {
            warn!("Starting with empty lists, initial load failed: {}", e);
        }

        let prefs_store = PreferenceStore::new(preferences_path);
        let preferences = prefs_store.load().await;

        Self {
            inner: Arc::new(AppStateInner {
                board: RwLock::new(board),
                prefs_store,
                preferences: RwLock::new(preferences),
                backend,
            }),
        }
    }

    pub fn board(&self) -> &RwLock<Board> {
        &self.inner.board
    }

    pub fn prefs_store(&self) -> &PreferenceStore {
        &self.inner.prefs_store
    }

    pub fn preferences(&self) -> &RwLock<Preferences> {
        &self.inner.preferences
    }

    /// Name of the record store backend in use
    pub fn backend(&self) -> &'static str {
        self.inner.backend
    }
}

/// The local calendar date used for due-today and overdue checks
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
pub(crate) async fn test_state() -> (AppState, tempfile::TempDir) {
    use taskflow_core::record::FileRecordStore;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let state = AppState::with_store(
        Arc::new(FileRecordStore::in_memory()),
        "tasks",
        "projects",
        temp_dir.path().join("preferences.json"),
    )
    .await;
    (state, temp_dir)
}
