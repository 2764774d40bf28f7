//! Pipeline domain model and its persisted form

use crate::core::{
    error::{EngineError, Result},
    step::Step,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Identifies what a pipeline operates on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Root directory step paths resolve against
    pub path: PathBuf,

    /// Pipeline name, also the key of its persisted file
    pub name: String,
}

/// An ordered list of steps for one target resource
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub metadata: Metadata,
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(path: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            metadata: Metadata {
                path: path.into(),
                name: name.to_string(),
            },
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn root(&self) -> &Path {
        &self.metadata.path
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Get a mutable step by name
    pub fn step_mut(&mut self, name: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.name == name)
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }

    /// Check that step names are unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "Duplicate step name '{}' in pipeline '{}'",
                    step.name,
                    self.name()
                )));
            }
        }
        Ok(())
    }

    /// Convert to the on-disk representation
    pub fn to_file(&self) -> PipelineFile {
        PipelineFile {
            metadata: self.metadata.clone(),
            steps: self.steps.iter().map(StepRecord::from).collect(),
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_file())?)
    }

    /// Write the pipeline to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        debug!("Saved pipeline {} to {}", self.name(), path.display());
        Ok(())
    }
}

/// On-disk pipeline document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineFile {
    pub metadata: Metadata,

    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

/// One persisted step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub working_dir: PathBuf,

    #[serde(default)]
    pub target: Option<PathBuf>,

    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub sha: String,

    #[serde(default)]
    pub retries: usize,

    #[serde(default)]
    pub verbose: bool,
}

impl From<&Step> for StepRecord {
    fn from(step: &Step) -> Self {
        Self {
            name: step.name.clone(),
            args: step.action.args().to_vec(),
            working_dir: step.working_dir.clone(),
            target: step.target.clone(),
            command: step.action.program().to_string(),
            sha: step.sha.clone(),
            retries: step.retries,
            verbose: step.verbose,
        }
    }
}

impl PipelineFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| EngineError::Serialization {
            what: "pipeline file".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a persisted pipeline, strictly
    pub fn load(path: &Path) -> Result<Self> {
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

    /// Load a persisted pipeline, falling back to an empty one.
    ///
    /// Missing and corrupt files both yield fresh state; corruption is logged.
    pub fn load_or_empty(path: &Path, metadata: &Metadata) -> Self {
        match Self::load(path) {
            Ok(file) => file,
            Err(EngineError::NotFound { .. }) => {
                debug!("No persisted pipeline at {}, starting fresh", path.display());
                Self::empty(metadata)
            }
            Err(e) => {
                warn!("Ignoring unreadable pipeline file {}: {}", path.display(), e);
                Self::empty(metadata)
            }
        }
    }

    fn empty(metadata: &Metadata) -> Self {
        Self {
            metadata: metadata.clone(),
            steps: Vec::new(),
        }
    }

    /// Step names in persisted order
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }
}

/// Locates persisted pipelines by name under a state directory
#[derive(Debug, Clone)]
pub struct PipelineStore {
    dir: PathBuf,
}

impl PipelineStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file persisted for `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", name))
    }

    pub fn load(&self, metadata: &Metadata) -> PipelineFile {
        PipelineFile::load_or_empty(&self.path_for(&metadata.name), metadata)
    }

    pub fn save(&self, pipeline: &Pipeline) -> Result<()> {
        pipeline.save(&self.path_for(pipeline.name()))
    }
}
