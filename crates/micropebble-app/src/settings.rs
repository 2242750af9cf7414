//! Application settings (TOML).
//!
//! Missing file or missing keys yield defaults; a malformed file is reported
//! as a configuration error rather than silently ignored, since the user
//! edited it by hand.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use micropebble_core::prelude::*;

pub const SETTINGS_FILENAME: &str = "settings.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Override for the data directory (sources file, crash marker, scratch).
    pub data_dir: Option<PathBuf>,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Base URL of the primary store API.
    pub endpoint: String,
    /// Watch platform used for home-document requests.
    pub platform: String,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            store: StoreSettings::default(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://appstore-api.rebble.io/api".into(),
            platform: "basalt".into(),
            user_agent: micropebble_store::DEFAULT_USER_AGENT.into(),
        }
    }
}

impl Settings {
    /// Load settings from the given file, defaulting when absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::config(format!("invalid settings file: {e}")))
    }

    /// Load from the default location under the platform config dir.
    pub fn load_default() -> Result<Self> {
        Ok(Self::load(&default_settings_path())?.resolved())
    }

    /// Resolve the data dir fallback once, so all derived paths agree.
    fn resolved(mut self) -> Self {
        if self.data_dir.is_none() {
            self.data_dir = Some(default_data_dir());
        }
        self
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn sources_path(&self) -> PathBuf {
        self.data_dir().join("appstore_sources.json")
    }

    pub fn install_sources_path(&self) -> PathBuf {
        self.data_dir().join("install_sources.json")
    }

    pub fn crash_marker_path(&self) -> PathBuf {
        self.data_dir().join("crash.marker")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.data_dir().join("scratch")
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("micropebble")
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("micropebble")
        .join(SETTINGS_FILENAME)
}
