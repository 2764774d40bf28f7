//! Publish manifest parser
//!
//! One directive per line:
//!
//! ```text
//! repo stable
//! chart charts/*
//! artifact dist/agent-linux linux amd64
//! crd crds/*.yaml cert-manager
//! tag main v1.4.0
//! run make index
//! ```
//!
//! Globs resolve relative to the manifest's directory and may match nothing.

use crate::core::{EngineError, Result};
use crate::publish::component::Component;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub repo: Option<String>,
    /// Directory the manifest was loaded from
    pub base_dir: PathBuf,
    pub components: Vec<Component>,
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::NotFound {
                path: path.to_path_buf(),
            },
            _ => EngineError::Io(e),
        })?;

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&content, &base_dir)
    }

    /// Parse manifest content, expanding globs against `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest = Manifest {
            repo: None,
            base_dir: base_dir.to_path_buf(),
            components: Vec::new(),
        };

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let mut words = text.split_whitespace();
            let keyword = words.next().unwrap_or_default().to_lowercase();
            let args: Vec<&str> = words.collect();

            match keyword.as_str() {
                "repo" => {
                    let name = required(&args, 0, line, "repo <name>")?;
                    if let Some(previous) = manifest.repo.replace(name.to_string()) {
                        warn!("Manifest line {}: repo '{}' replaces '{}'", line, name, previous);
                    }
                }
                "chart" => manifest.expand(&args, line, "chart <glob>", |path| Component::Chart { path })?,
                "module" => manifest.expand(&args, line, "module <glob>", |path| Component::Module { path })?,
                "recipe" => manifest.expand(&args, line, "recipe <glob>", |path| Component::Recipe { path })?,
                "integration" => {
                    manifest.expand(&args, line, "integration <glob>", |path| Component::Integration { path })?
                }
                "resource" => {
                    manifest.expand(&args, line, "resource <glob>", |path| Component::Resource { path })?
                }
                "stack" => manifest.expand(&args, line, "stack <glob>", |path| Component::Stack { path })?,
                "attributes" => {
                    manifest.expand(&args, line, "attributes <file>", |path| Component::Attributes { path })?
                }
                "artifact" => {
                    let usage = "artifact <glob> <platform> <arch>";
                    let platform = required(&args, 1, line, usage)?.to_string();
                    let arch = required(&args, 2, line, usage)?.to_string();
                    manifest.expand(&args, line, usage, |path| Component::Artifact {
                        path,
                        platform: platform.clone(),
                        arch: arch.clone(),
                    })?
                }
                "crd" => {
                    let usage = "crd <glob> <chart>";
                    let chart = required(&args, 1, line, usage)?.to_string();
                    manifest.expand(&args, line, usage, |path| Component::Crd {
                        path,
                        chart: chart.clone(),
                    })?
                }
                "tag" => {
                    let usage = "tag <ref> <tag>";
                    manifest.components.push(Component::Tag {
                        reference: required(&args, 0, line, usage)?.to_string(),
                        tag: required(&args, 1, line, usage)?.to_string(),
                    });
                }
                "run" => {
                    let command = required(&args, 0, line, "run <command> <args...>")?.to_string();
                    manifest.components.push(Component::Run {
                        command,
                        args: args[1..].iter().map(|a| a.to_string()).collect(),
                    });
                }
                other => debug!("Manifest line {}: ignoring unknown directive '{}'", line, other),
            }
        }

        Ok(manifest)
    }

    /// Repository to publish to
    pub fn repo(&self) -> Result<&str> {
        self.repo.as_deref().ok_or_else(|| EngineError::Manifest {
            line: 0,
            message: "no 'repo' directive".to_string(),
        })
    }

    fn expand<F>(&mut self, args: &[&str], line: usize, usage: &str, build: F) -> Result<()>
    where
        F: Fn(PathBuf) -> Component,
    {
        let pattern = required(args, 0, line, usage)?;
        let matches = expand_glob(&self.base_dir, pattern, line)?;
        if matches.is_empty() {
            debug!("Manifest line {}: '{}' matched nothing", line, pattern);
        }
        self.components.extend(matches.into_iter().map(build));
        Ok(())
    }
}

fn required<'a>(args: &[&'a str], index: usize, line: usize, usage: &str) -> Result<&'a str> {
    args.get(index).copied().ok_or_else(|| EngineError::Manifest {
        line,
        message: format!("expected '{}'", usage),
    })
}

/// Sorted matches of `pattern` under `base`, relative to `base`
fn expand_glob(base: &Path, pattern: &str, line: usize) -> Result<Vec<PathBuf>> {
    let prefix = glob::Pattern::escape(&base.to_string_lossy());
    let full = Path::new(&prefix).join(pattern);
    let entries = glob::glob(&full.to_string_lossy()).map_err(|e| EngineError::Manifest {
        line,
        message: format!("invalid glob '{}': {}", pattern, e),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                let relative = path.strip_prefix(base).map(Path::to_path_buf).unwrap_or(path);
                paths.push(relative);
            }
            Err(e) => warn!("Manifest line {}: skipping unreadable match: {}", line, e),
        }
    }
    paths.sort();
    Ok(paths)
}
