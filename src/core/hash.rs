//! Content hashing for change detection
//!
//! A target is digested as the set of its non-ignored files: every file
//! contributes its slash-separated relative path and the SHA-256 of its
//! bytes, combined in sorted path order so that filesystem iteration order
//! never leaks into the result.

use crate::core::error::{EngineError, Result};
use sha2::{Digest, Sha256};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Compute the content digest of a file or directory tree
pub fn hash_path(root: &Path, ignore: &[String]) -> Result<String> {
    if !root.exists() {
        return Err(EngineError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let mut entries: Vec<(String, String)> = Vec::new();

    if root.is_file() {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        entries.push((name, hash_file(root)?));
    } else {
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| EngineError::Hash {
                path: root.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = match entry.path().strip_prefix(root) {
                Ok(p) => p,
                Err(_) => continue,
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if is_ignored(&rel, ignore) {
                continue;
            }

            entries.push((rel, hash_file(entry.path())?));
        }
    }

    entries.sort();
    debug!("Hashing {} files under {}", entries.len(), root.display());

    let mut hasher = Sha256::new();
    for (path, sha) in &entries {
        hasher.update(path.as_bytes());
        hasher.update(b":");
        hasher.update(sha.as_bytes());
        hasher.update(b"\n");
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of an arbitrary string, for components that have no file content
pub fn hash_str(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

fn hash_file(path: &Path) -> Result<String> {
    let to_err = |source: std::io::Error| EngineError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(to_err)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(to_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check a slash-separated relative path against ignore entries.
///
/// An entry matches when it names the path itself, a leading directory of
/// it, or glob-matches the path or any of its leading directory prefixes.
pub fn is_ignored(rel: &str, ignore: &[String]) -> bool {
    ignore.iter().any(|entry| {
        let entry = entry.trim_end_matches('/');
        if entry.is_empty() {
            return false;
        }
        if rel == entry || rel.starts_with(&format!("{}/", entry)) {
            return true;
        }

        match glob::Pattern::new(entry) {
            Ok(pattern) => {
                let mut prefix = String::new();
                for part in rel.split('/') {
                    if !prefix.is_empty() {
                        prefix.push('/');
                    }
                    prefix.push_str(part);
                    if pattern.matches(&prefix) {
                        return true;
                    }
                }
                false
            }
            Err(_) => false,
        }
    })
}

/// Read an ignore file (newline-separated glob prefixes) from `dir`.
///
/// A missing file means nothing is ignored.
pub fn load_ignore_file(dir: &Path, file_name: &str) -> Result<Vec<String>> {
    let path = dir.join(file_name);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
