//! Repository locks guarding the shared lockfile
//!
//! Locking is optimistic: acquiring returns whatever content is currently
//! stored and releasing overwrites it. Two runs against the same repository
//! that overlap will race; the last release wins.

use crate::core::{EngineError, Result};
use crate::publish::lockfile::Lockfile;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Storage for serialized lockfiles, one per repository
#[async_trait]
pub trait LockService: Send + Sync {
    /// Fetch the stored content. `NotFound` when the repository has none yet.
    async fn acquire(&self, repo: &str) -> Result<String>;

    /// Store `content` for the repository
    async fn release(&self, repo: &str, content: &str) -> Result<()>;
}

/// Keeps `<repo>.lock.yaml` files in a directory
#[derive(Debug, Clone)]
pub struct FileLockService {
    dir: PathBuf,
}

impl FileLockService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Lock file for `repo`; bytes outside `[A-Za-z0-9._-]` are
    /// percent-encoded so distinct repositories never share a file
    pub fn path_for(&self, repo: &str) -> PathBuf {
        let mut file_name = String::with_capacity(repo.len());
        for byte in repo.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => file_name.push(byte as char),
                _ => file_name.push_str(&format!("%{:02X}", byte)),
            }
        }
        self.dir.join(format!("{}.lock.yaml", file_name))
    }

    fn map_err(repo: &str, path: &Path, err: std::io::Error) -> EngineError {
        match err.kind() {
            ErrorKind::NotFound => EngineError::NotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => EngineError::PermissionDenied {
                repo: repo.to_string(),
                message: err.to_string(),
            },
            _ => EngineError::Io(err),
        }
    }
}

#[async_trait]
impl LockService for FileLockService {
    async fn acquire(&self, repo: &str) -> Result<String> {
        let path = self.path_for(repo);
        debug!("Reading lock for {} from {}", repo, path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Self::map_err(repo, &path, e))
    }

    async fn release(&self, repo: &str, content: &str) -> Result<()> {
        let path = self.path_for(repo);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::map_err(repo, &self.dir, e))?;

        let tmp = path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| Self::map_err(repo, &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Self::map_err(repo, &path, e))?;

        debug!("Wrote lock for {} to {}", repo, path.display());
        Ok(())
    }
}

/// Lock storage held in memory; repositories can be marked as denied
#[derive(Debug, Default)]
pub struct InMemoryLockService {
    contents: Mutex<HashMap<String, String>>,
    denied: HashSet<String>,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse access to `repo`
    pub fn deny(mut self, repo: impl Into<String>) -> Self {
        self.denied.insert(repo.into());
        self
    }

    /// Currently stored content for `repo`
    pub fn content(&self, repo: &str) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.get(repo).cloned())
    }

    fn check(&self, repo: &str) -> Result<()> {
        if self.denied.contains(repo) {
            return Err(EngineError::PermissionDenied {
                repo: repo.to_string(),
                message: "publish rights required".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, repo: &str) -> Result<String> {
        self.check(repo)?;
        self.content(repo).ok_or_else(|| EngineError::NotFound {
            path: PathBuf::from(repo),
        })
    }

    async fn release(&self, repo: &str, content: &str) -> Result<()> {
        self.check(repo)?;
        if let Ok(mut contents) = self.contents.lock() {
            contents.insert(repo.to_string(), content.to_string());
        }
        Ok(())
    }
}

/// Turns lock service content into lockfiles and back
#[derive(Clone)]
pub struct LockManager {
    service: Arc<dyn LockService>,
}

impl LockManager {
    pub fn new(service: Arc<dyn LockService>) -> Self {
        Self { service }
    }

    /// Acquire the lock for `repo`.
    ///
    /// A repository without stored state, or whose state cannot be fetched,
    /// starts from an empty lockfile. Permission errors are fatal.
    pub async fn acquire(&self, repo: &str) -> Result<Lockfile> {
        match self.service.acquire(repo).await {
            Ok(content) => {
                let lockfile = Lockfile::parse_lenient(&content);
                info!("Acquired lock for {} ({} entries)", repo, lockfile.len());
                Ok(lockfile)
            }
            Err(e) if e.is_not_found() => {
                info!("No lock state for {}; starting fresh", repo);
                Ok(Lockfile::new())
            }
            Err(e @ EngineError::PermissionDenied { .. }) => Err(e),
            Err(e) => {
                warn!("Could not fetch lock for {}: {}; starting fresh", repo, e);
                Ok(Lockfile::new())
            }
        }
    }

    /// Release the lock, storing `lockfile` as the new content
    pub async fn release(&self, repo: &str, lockfile: &Lockfile) -> Result<()> {
        let content = lockfile.to_yaml()?;
        self.service.release(repo, &content).await?;
        info!("Released lock for {} ({} entries)", repo, lockfile.len());
        Ok(())
    }
}
