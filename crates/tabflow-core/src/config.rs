//! Extension configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tabflow_tabs::{RestrictedUrls, DEFAULT_RESTRICTED_SCHEMES};
use tabflow_workflows::DEFAULT_STORAGE_KEY;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Key the workflow record is stored under
    pub storage_key: String,
    /// Id of the installed extension, used to build the placeholder URL
    pub extension_id: String,
    /// URL schemes the extension must never group or suspend
    pub restricted_schemes: Vec<String>,
    /// Wipe persisted workflows on every start
    pub reset_on_start: bool,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("tabflow.db"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            extension_id: "tabflow".to_string(),
            restricted_schemes: DEFAULT_RESTRICTED_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reset_on_start: false,
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;

        if config.extension_id.trim().is_empty() {
            return Err(CoreError::Config("extension_id cannot be empty".to_string()));
        }
        if config.storage_key.trim().is_empty() {
            return Err(CoreError::Config("storage_key cannot be empty".to_string()));
        }

        Ok(config)
    }

    /// Page suspended tabs are navigated to
    pub fn placeholder_url(&self) -> String {
        format!("chrome-extension://{}/suspended.html", self.extension_id)
    }

    pub fn restricted_urls(&self) -> RestrictedUrls {
        RestrictedUrls::new(&self.restricted_schemes)
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Tabflow"))
            .unwrap_or_else(|| PathBuf::from(".tabflow"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
