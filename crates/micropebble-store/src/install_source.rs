//! Persisted record of where each installed app came from.
//!
//! Keyed by app UUID; consulted when offering updates so an app is refreshed
//! from the source it was installed from. Same leniency policy as the source
//! registry: unknown keys are ignored and a malformed file degrades to an
//! empty map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use micropebble_core::prelude::*;

/// Where one installed app came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSourceRecord {
    /// Id of the store source it was installed from, if any.
    #[serde(default)]
    pub source_id: Option<Uuid>,
    /// Human-readable source name at install time.
    #[serde(default)]
    pub source_name: String,
    /// Direct download URL for sideloads.
    #[serde(default)]
    pub url: Option<String>,
}

impl InstallSourceRecord {
    pub fn sideload() -> Self {
        Self {
            source_id: None,
            source_name: "sideload".into(),
            url: None,
        }
    }
}

/// Persisted app-UUID → install-source map.
pub struct InstallSourceMap {
    path: PathBuf,
    state: Mutex<HashMap<Uuid, InstallSourceRecord>>,
}

impl InstallSourceMap {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_map(&path);
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub async fn get(&self, app_id: Uuid) -> Option<InstallSourceRecord> {
        self.state.lock().await.get(&app_id).cloned()
    }

    /// Record (or overwrite) the install source for an app.
    pub async fn record(&self, app_id: Uuid, record: InstallSourceRecord) -> Result<()> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        next.insert(app_id, record);
        persist(&self.path, &next)?;
        *guard = next;
        Ok(())
    }

    /// Forget an uninstalled app.
    pub async fn forget(&self, app_id: Uuid) -> Result<()> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        next.remove(&app_id);
        persist(&self.path, &next)?;
        *guard = next;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }
}

fn load_map(path: &Path) -> HashMap<Uuid, InstallSourceRecord> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("malformed install-source map {}: {e}", path.display());
            HashMap::new()
        }
    }
}

fn persist(path: &Path, map: &HashMap<Uuid, InstallSourceRecord>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(map)?;
    std::fs::write(path, content)?;
    Ok(())
}
