//! Engine configuration from YAML
//!
//! The configuration is loaded once and handed to every entry point
//! (runner, registry, flows) explicitly.

use crate::core::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the per-resource ignore file
pub const DEFAULT_IGNORE_FILE: &str = ".shipyardignore";

/// Default directory (relative to an application root) for persisted pipelines
pub const DEFAULT_STATE_DIR: &str = ".shipyard";

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stream every step's output live
    #[serde(default)]
    pub verbose: bool,

    /// Debug-level logging
    #[serde(default)]
    pub debug: bool,

    /// Where persisted pipelines live, relative to the application root
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Name of the ignore file consulted when hashing
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// Directory backing the local lock service
    #[serde(default)]
    pub lock_dir: Option<PathBuf>,

    /// Client binary used to publish components
    #[serde(default = "default_publish_client")]
    pub publish_client: String,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

fn default_ignore_file() -> String {
    DEFAULT_IGNORE_FILE.to_string()
}

fn default_publish_client() -> String {
    "shipyard-push".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            debug: false,
            state_dir: default_state_dir(),
            ignore_file: default_ignore_file(),
            lock_dir: None,
            publish_client: default_publish_client(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml).map_err(|e| EngineError::Serialization {
            what: "engine configuration".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.ignore_file.trim().is_empty() {
            return Err(EngineError::Config("ignore_file must not be empty".to_string()));
        }
        if self.ignore_file.contains('/') {
            return Err(EngineError::Config(format!(
                "ignore_file must be a file name, got '{}'",
                self.ignore_file
            )));
        }
        if self.publish_client.trim().is_empty() {
            return Err(EngineError::Config("publish_client must not be empty".to_string()));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(EngineError::Config("state_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Directory holding persisted pipelines for an application root
    pub fn state_dir_for(&self, root: &Path) -> PathBuf {
        root.join(&self.state_dir)
    }

    /// Lock directory, falling back to the user's local data directory
    pub fn resolved_lock_dir(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("shipyard")
                .join("locks")
        })
    }
}
