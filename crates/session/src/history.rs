//! Durable scene history.
//!
//! The persisted layout is exactly the serialized scene array, written
//! under a fixed namespace in the session data directory. Persistence is
//! best-effort by design: a load failure is logged and treated as an empty
//! history, a save failure is logged and the session continues with its
//! in-memory state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use artie_core::scene::Scene;

/// Fixed namespace the history is stored under.
pub const HISTORY_NAMESPACE: &str = "artie-ads-history";

/// Load-all / save-all of the scene collection.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the stored history; failures are logged and yield an empty
    /// collection.
    async fn load_all(&self) -> Vec<Scene>;

    /// Persist the full collection; failures are logged only.
    async fn save_all(&self, scenes: &[Scene]);
}

/// History store backed by one JSON file.
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{HISTORY_NAMESPACE}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn load_all(&self) -> Vec<Scene> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No stored history yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read history");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Scene>>(&bytes) {
            Ok(scenes) => {
                tracing::info!(count = scenes.len(), "History loaded");
                scenes
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Stored history is corrupt");
                Vec::new()
            }
        }
    }

    async fn save_all(&self, scenes: &[Scene]) {
        let json = match serde_json::to_vec_pretty(scenes) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize history");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create data dir");
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write history");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
