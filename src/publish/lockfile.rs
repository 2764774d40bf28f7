//! Lockfile: component type -> (key -> last published hash)
//!
//! Sections are keyed by the type's name rather than by `ComponentType`, so
//! sections written by other versions survive a read and rewrite untouched.

use crate::core::{EngineError, Result};
use crate::publish::component::ComponentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Lockfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse lockfile content, rejecting malformed documents
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_yaml::from_str(content).map_err(|e| EngineError::Serialization {
            what: "lockfile".to_string(),
            message: e.to_string(),
        })
    }

    /// Parse lockfile content, starting fresh when it is malformed
    pub fn parse_lenient(content: &str) -> Self {
        Self::from_yaml(content).unwrap_or_else(|e| {
            warn!("{}; starting with an empty lockfile", e);
            Self::new()
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn get(&self, kind: ComponentType, key: &str) -> Option<&str> {
        self.entries.get(kind.as_str()).and_then(|keys| keys.get(key)).map(String::as_str)
    }

    pub fn set(&mut self, kind: ComponentType, key: impl Into<String>, hash: impl Into<String>) {
        self.entries.entry(kind.as_str().to_string()).or_default().insert(key.into(), hash.into());
    }

    /// Number of recorded entries across all types
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
