//! Persisted user preferences

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

/// JSON file holding one `Preferences` value
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read preferences; a missing or unreadable file yields the defaults
    pub async fn load(&self) -> Preferences {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Preferences::default(),
            Err(e) => {
                warn!("Failed to read preferences {:?}: {}", self.path, e);
                return Preferences::default();
            }
        };
        if content.trim().is_empty() {
            return Preferences::default();
        }
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed preferences {:?}: {}", self.path, e);
            Preferences::default()
        })
    }

    pub async fn save(&self, prefs: &Preferences) -> Result<()> {
        let content = serde_json::to_string_pretty(prefs)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Flip dark mode on `current` and persist; returns the new preferences
    pub async fn toggle_dark_mode(&self, current: &Preferences) -> Result<Preferences> {
        let prefs = Preferences {
            dark_mode: !current.dark_mode,
        };
        self.save(&prefs).await?;
        Ok(prefs)
    }
}
