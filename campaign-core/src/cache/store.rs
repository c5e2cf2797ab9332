// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! File-backed conditional cache
//!
//! Entries are stored as `<root>/<namespace>/<key>` with their metadata in
//! `<root>/<namespace>/.meta/<key>.json`. Every write goes through a temp
//! file and a rename so an entry is never observed half-written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::metadata::{CacheMetadata, MetadataSidecar, METADATA_SCHEMA_VERSION};

const META_DIR: &str = ".meta";

/// One cached file and the validators it was fetched with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Key within its namespace (file name)
    pub key: String,
    /// Cached bytes
    pub bytes: Vec<u8>,
    /// ETag / Last-Modified of the producing response
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Size of the cached bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Namespaced byte cache with per-entry HTTP metadata
#[derive(Debug, Clone)]
pub struct ConditionalCacheStore {
    root: PathBuf,
}

impl ConditionalCacheStore {
    /// Open (and create if needed) a cache rooted at `root`
    pub fn new(root: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of the cache
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get a cached entry with its metadata
    pub fn get(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(namespace, key).ok()?;
        let bytes = fs::read(&path).ok()?;
        let metadata = self.metadata(namespace, key).unwrap_or_default();
        Some(CacheEntry {
            key: key.to_string(),
            bytes,
            metadata,
        })
    }

    /// Get only the metadata of an entry
    pub fn metadata(&self, namespace: &str, key: &str) -> Option<CacheMetadata> {
        let path = self.sidecar_path(namespace, key).ok()?;
        let data = fs::read_to_string(&path).ok()?;
        let sidecar: MetadataSidecar = serde_json::from_str(&data).ok()?;
        if sidecar.schema_version != METADATA_SCHEMA_VERSION {
            warn!(
                version = sidecar.schema_version,
                key, "Ignoring cache metadata with unknown schema version"
            );
            return None;
        }
        Some(sidecar.metadata)
    }

    /// Whether an entry exists
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.entry_path(namespace, key)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Local path of an entry (whether or not it exists)
    pub fn path_of(&self, namespace: &str, key: &str) -> Result<PathBuf, CacheError> {
        self.entry_path(namespace, key)
    }

    /// Store an entry, replacing bytes and metadata wholesale
    pub fn set(
        &self,
        namespace: &str,
        key: &str,
        bytes: &[u8],
        metadata: &CacheMetadata,
    ) -> Result<(), CacheError> {
        let path = self.entry_path(namespace, key)?;
        let sidecar = self.sidecar_path(namespace, key)?;
        if let Some(dir) = sidecar.parent() {
            fs::create_dir_all(dir)?;
        }

        let data = serde_json::to_vec(&MetadataSidecar::new(metadata.clone()))?;
        atomic_write(&path, bytes)?;
        atomic_write(&sidecar, &data)?;
        debug!(namespace, key, size = bytes.len(), "Cached entry");
        Ok(())
    }

    /// Remove one entry; returns whether it existed
    pub fn remove(&self, namespace: &str, key: &str) -> Result<bool, CacheError> {
        let path = self.entry_path(namespace, key)?;
        let existed = path.is_file();
        if existed {
            fs::remove_file(&path)?;
        }
        let sidecar = self.sidecar_path(namespace, key)?;
        if sidecar.is_file() {
            fs::remove_file(&sidecar)?;
        }
        Ok(existed)
    }

    /// Keys stored directly in a namespace, sorted
    pub fn keys(&self, namespace: &str) -> Vec<String> {
        let Ok(dir) = self.namespace_path(namespace) else {
            return Vec::new();
        };
        let Ok(read) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut keys: Vec<String> = read
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        keys.sort();
        keys
    }

    /// Names of the namespaces nested directly under `namespace`, sorted
    pub fn child_namespaces(&self, namespace: &str) -> Vec<String> {
        let Ok(dir) = self.namespace_path(namespace) else {
            return Vec::new();
        };
        let Ok(read) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = read
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    /// Remove a namespace and everything below it
    pub fn remove_namespace(&self, namespace: &str) -> Result<(), CacheError> {
        let dir = self.namespace_path(namespace)?;
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            debug!(namespace, "Removed cache namespace");
        }
        Ok(())
    }

    /// Move every entry of `staged` in as `namespace`, replacing what
    /// `namespace` held. Both are renamed whole, so `namespace` holds either
    /// its previous contents or all of `staged`.
    pub fn replace_namespace(&self, namespace: &str, staged: &str) -> Result<(), CacheError> {
        let target = self.namespace_path(namespace)?;
        let source = self.namespace_path(staged)?;
        let Some(name) = target.file_name().and_then(|n| n.to_str()) else {
            return Err(CacheError::InvalidKey(namespace.to_string()));
        };
        if target == self.root {
            return Err(CacheError::InvalidKey(namespace.to_string()));
        }
        if !source.is_dir() {
            return Err(CacheError::MissingNamespace(staged.to_string()));
        }

        // Hidden sibling, never a valid namespace
        let retired = target.with_file_name(format!(".{}.old", name));
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if target.exists() {
            fs::rename(&target, &retired)?;
        }
        if let Err(e) = fs::rename(&source, &target) {
            if retired.exists() {
                if let Err(restore) = fs::rename(&retired, &target) {
                    warn!(namespace, error = %restore, "Could not restore cache namespace");
                }
            }
            return Err(e.into());
        }
        if retired.exists() {
            if let Err(e) = fs::remove_dir_all(&retired) {
                warn!(namespace, error = %e, "Could not remove replaced cache namespace");
            }
        }

        debug!(namespace, staged, "Replaced cache namespace");
        Ok(())
    }

    fn namespace_path(&self, namespace: &str) -> Result<PathBuf, CacheError> {
        let mut path = self.root.clone();
        for segment in namespace.split('/').filter(|s| !s.is_empty()) {
            validate_segment(segment).map_err(|_| CacheError::InvalidKey(namespace.to_string()))?;
            path.push(segment);
        }
        Ok(path)
    }

    fn entry_path(&self, namespace: &str, key: &str) -> Result<PathBuf, CacheError> {
        validate_segment(key)?;
        Ok(self.namespace_path(namespace)?.join(key))
    }

    fn sidecar_path(&self, namespace: &str, key: &str) -> Result<PathBuf, CacheError> {
        validate_segment(key)?;
        Ok(self
            .namespace_path(namespace)?
            .join(META_DIR)
            .join(format!("{}.json", key)))
    }
}

/// Keys and namespace segments must be plain, visible file names
fn validate_segment(segment: &str) -> Result<(), CacheError> {
    let invalid = segment.is_empty()
        || segment.starts_with('.')
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains('\0');
    if invalid {
        return Err(CacheError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

/// Atomic file write (write to temp, then rename)
///
/// Either the old content remains or the new content is fully written.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let dir = path.parent().ok_or_else(|| {
        CacheError::InvalidKey(path.to_string_lossy().into_owned())
    })?;
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{}.tmp", file_name));

    fs::write(&temp_path, data)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Errors that can occur with the conditional cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Metadata serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key or namespace is not a plain file name
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Namespace to move in has no entries
    #[error("cache namespace does not exist: {0}")]
    MissingNamespace(String),
}
