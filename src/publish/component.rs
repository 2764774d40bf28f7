//! Publishable components
//!
//! A manifest expands into a flat list of `Component`s. Each variant knows
//! how to identify itself (type + key), how to hash its content and how to
//! hand itself to a `Publisher`.

use crate::core::hash::{hash_path, hash_str, load_ignore_file};
use crate::core::Result;
use crate::publish::publisher::{PublishRequest, Publisher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Component type, also the top-level section of a lockfile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Chart,
    Module,
    Artifact,
    Recipe,
    Integration,
    Crd,
    Resource,
    Stack,
    Tag,
    Attributes,
    Run,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Chart => "chart",
            ComponentType::Module => "module",
            ComponentType::Artifact => "artifact",
            ComponentType::Recipe => "recipe",
            ComponentType::Integration => "integration",
            ComponentType::Crd => "crd",
            ComponentType::Resource => "resource",
            ComponentType::Stack => "stack",
            ComponentType::Tag => "tag",
            ComponentType::Attributes => "attributes",
            ComponentType::Run => "run",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single publishable unit. Paths are relative to the manifest directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Chart { path: PathBuf },
    Module { path: PathBuf },
    Artifact { path: PathBuf, platform: String, arch: String },
    Recipe { path: PathBuf },
    Integration { path: PathBuf },
    Crd { path: PathBuf, chart: String },
    Resource { path: PathBuf },
    Stack { path: PathBuf },
    Tag { reference: String, tag: String },
    Attributes { path: PathBuf },
    Run { command: String, args: Vec<String> },
}

/// Everything a component needs to publish itself
pub struct PushContext<'a> {
    pub repo: &'a str,
    /// Directory the manifest lives in
    pub base_dir: &'a Path,
    pub ignore_file: &'a str,
    pub publisher: &'a dyn Publisher,
}

/// Result of a successful push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub hash: String,
    /// False when the content matched the previous hash
    pub published: bool,
}

impl Component {
    pub fn kind(&self) -> ComponentType {
        match self {
            Component::Chart { .. } => ComponentType::Chart,
            Component::Module { .. } => ComponentType::Module,
            Component::Artifact { .. } => ComponentType::Artifact,
            Component::Recipe { .. } => ComponentType::Recipe,
            Component::Integration { .. } => ComponentType::Integration,
            Component::Crd { .. } => ComponentType::Crd,
            Component::Resource { .. } => ComponentType::Resource,
            Component::Stack { .. } => ComponentType::Stack,
            Component::Tag { .. } => ComponentType::Tag,
            Component::Attributes { .. } => ComponentType::Attributes,
            Component::Run { .. } => ComponentType::Run,
        }
    }

    /// Identity of the component within its type
    pub fn key(&self) -> String {
        match self {
            Component::Artifact { path, platform, arch } => {
                format!("{}/{}/{}", slash_path(path), platform, arch)
            }
            Component::Crd { path, chart } => format!("{}/{}", chart, slash_path(path)),
            Component::Tag { tag, .. } => tag.clone(),
            Component::Run { .. } => self.command_line(),
            Component::Chart { path }
            | Component::Module { path }
            | Component::Recipe { path }
            | Component::Integration { path }
            | Component::Resource { path }
            | Component::Stack { path }
            | Component::Attributes { path } => slash_path(path),
        }
    }

    /// Human-readable label, e.g. `chart charts/api`
    pub fn label(&self) -> String {
        format!("{} {}", self.kind(), self.key())
    }

    fn path(&self) -> Option<&Path> {
        match self {
            Component::Tag { .. } | Component::Run { .. } => None,
            Component::Chart { path }
            | Component::Module { path }
            | Component::Artifact { path, .. }
            | Component::Recipe { path }
            | Component::Integration { path }
            | Component::Crd { path, .. }
            | Component::Resource { path }
            | Component::Stack { path }
            | Component::Attributes { path } => Some(path),
        }
    }

    fn command_line(&self) -> String {
        match self {
            Component::Run { command, args } if !args.is_empty() => format!("{} {}", command, args.join(" ")),
            Component::Run { command, .. } => command.clone(),
            _ => String::new(),
        }
    }

    /// Digest of whatever determines whether the component must be republished
    pub fn content_hash(&self, base_dir: &Path, ignore_file: &str) -> Result<String> {
        match self {
            Component::Tag { reference, tag } => Ok(hash_str(&format!("{}\n{}", reference, tag))),
            Component::Run { .. } => Ok(hash_str(&self.command_line())),
            Component::Artifact { path, platform, arch } => {
                let content = hash_path(&base_dir.join(path), &[])?;
                Ok(hash_str(&format!("{}\n{}\n{}", content, platform, arch)))
            }
            Component::Chart { path } | Component::Module { path } => {
                let full = base_dir.join(path);
                let ignore = if full.is_dir() {
                    load_ignore_file(&full, ignore_file)?
                } else {
                    Vec::new()
                };
                hash_path(&full, &ignore)
            }
            _ => match self.path() {
                Some(path) => hash_path(&base_dir.join(path), &[]),
                None => Ok(String::new()),
            },
        }
    }

    /// Publish the component unless its content matches `previous`.
    ///
    /// `run` components always execute.
    pub async fn push(&self, ctx: &PushContext<'_>, previous: Option<&str>) -> Result<PushOutcome> {
        let hash = self.content_hash(ctx.base_dir, ctx.ignore_file)?;

        if let Component::Run { command, args } = self {
            ctx.publisher.run(command, args, ctx.base_dir).await?;
            return Ok(PushOutcome { hash, published: true });
        }

        if previous == Some(hash.as_str()) {
            debug!("{} unchanged ({})", self.label(), hash);
            return Ok(PushOutcome { hash, published: false });
        }

        ctx.publisher.publish(&self.request(ctx)).await?;
        Ok(PushOutcome { hash, published: true })
    }

    fn request(&self, ctx: &PushContext<'_>) -> PublishRequest {
        let (source, extra) = match self {
            Component::Tag { reference, tag } => (reference.clone(), vec![tag.clone()]),
            Component::Artifact { path, platform, arch } => {
                (display(&ctx.base_dir.join(path)), vec![platform.clone(), arch.clone()])
            }
            Component::Crd { path, chart } => (display(&ctx.base_dir.join(path)), vec![chart.clone()]),
            _ => (
                self.path().map(|p| display(&ctx.base_dir.join(p))).unwrap_or_default(),
                Vec::new(),
            ),
        };

        PublishRequest {
            kind: self.kind(),
            source,
            repo: ctx.repo.to_string(),
            extra,
        }
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
