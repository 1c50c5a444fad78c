//! Session configuration loaded from `partsync.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use smol_str::SmolStr;
use tracing::warn;

use crate::error::SyncError;

pub const CONFIG_FILES: &[&str] = &["partsync.toml", ".partsync.toml"];

const DEFAULT_CONTAINER_ID: &str = "partsync-viewer";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncConfig {
    /// Config file path (if one was read).
    pub config_path: Option<PathBuf>,
    /// Design/session identifier required before the first load.
    pub design_key: Option<SmolStr>,
    pub viewer: ViewerSettings,
    pub naming: NamingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSettings {
    pub container_id: String,
    pub panes: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamingSettings {
    pub invalid_character_replacement: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            panes: false,
            verbose: true,
        }
    }
}

impl SyncConfig {
    /// Reads an explicitly requested config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            SyncError::Configuration(format!("{}: {err}", path.display()).into())
        })?;
        let mut config = Self::from_toml(&text).map_err(|err| match err {
            SyncError::Configuration(message) => {
                SyncError::Configuration(format!("{}: {message}", path.display()).into())
            }
            other => other,
        })?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Looks for a config file in `root`; falls back to defaults when none
    /// is found or the one found cannot be used.
    #[must_use]
    pub fn discover(root: &Path) -> Self {
        let Some(path) = find_config_file(root) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Ignoring partsync config at {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, SyncError> {
        let raw: ConfigFile =
            toml::from_str(text).map_err(|err| SyncError::Configuration(err.to_string().into()))?;
        Ok(raw.into_config())
    }
}

fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    session: SessionSection,
    viewer: ViewerSection,
    naming: NamingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionSection {
    design_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ViewerSection {
    container_id: Option<String>,
    panes: Option<bool>,
    verbose: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NamingSection {
    invalid_character_replacement: Option<String>,
}

impl ConfigFile {
    fn into_config(self) -> SyncConfig {
        let defaults = ViewerSettings::default();
        SyncConfig {
            config_path: None,
            design_key: self
                .session
                .design_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
                .map(SmolStr::from),
            viewer: ViewerSettings {
                container_id: self
                    .viewer
                    .container_id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or(defaults.container_id),
                panes: self.viewer.panes.unwrap_or(defaults.panes),
                verbose: self.viewer.verbose.unwrap_or(defaults.verbose),
            },
            naming: NamingSettings {
                invalid_character_replacement: self
                    .naming
                    .invalid_character_replacement
                    .unwrap_or_default(),
            },
        }
    }
}
