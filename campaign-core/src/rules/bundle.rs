// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rule bundle extraction
//!
//! A downloaded bundle is written to a scratch directory and fully expanded
//! there. Its files are then cached into a staging namespace, which replaces
//! the rules namespace only once every file is written. The rules namespace
//! therefore holds one complete bundle, never a mix of two. The scratch
//! directory is removed on every path out of [`BundleExtractor::extract`].

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace, warn};
use uuid::Uuid;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::cache::{CacheError, CacheMetadata, ConditionalCacheStore, RULES_NAMESPACE};

const ARCHIVE_FILE: &str = "bundle.zip";
const CONTENTS_DIR: &str = "contents";

/// Where a new bundle is cached before it replaces [`RULES_NAMESPACE`].
const STAGING_NAMESPACE: &str = "campaign/stagedRules";

/// Expands rule bundles into the conditional cache
#[derive(Debug, Clone)]
pub struct BundleExtractor {
    scratch_root: PathBuf,
    cache: ConditionalCacheStore,
}

impl BundleExtractor {
    /// Extractor using `scratch_root` for temporary directories
    pub fn new(scratch_root: impl Into<PathBuf>, cache: ConditionalCacheStore) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            cache,
        }
    }

    /// Extract `archive` and cache every file under the rules namespace.
    ///
    /// Every cached file is tagged with `metadata`. Returns the cached file
    /// names; nested paths are flattened to their file name.
    pub fn extract(
        &self,
        archive: &[u8],
        metadata: &CacheMetadata,
    ) -> Result<BTreeSet<String>, BundleError> {
        let scratch = ScratchDir::create(&self.scratch_root)?;

        let archive_path = scratch.path().join(ARCHIVE_FILE);
        fs::write(&archive_path, archive).map_err(BundleError::WriteArchive)?;

        let contents = scratch.path().join(CONTENTS_DIR);
        expand_archive(&archive_path, &contents)?;

        let mut files = Vec::new();
        collect_files(&contents, &mut files).map_err(BundleError::Read)?;

        // Leftover of an interrupted extraction
        self.cache.remove_namespace(STAGING_NAMESPACE)?;
        let committed = self.stage(&files, metadata).and_then(|cached| {
            self.cache
                .replace_namespace(RULES_NAMESPACE, STAGING_NAMESPACE)?;
            Ok(cached)
        });
        if committed.is_err() {
            if let Err(e) = self.cache.remove_namespace(STAGING_NAMESPACE) {
                warn!(error = %e, "Could not discard staged bundle");
            }
        }

        let cached = committed?;
        debug!(count = cached.len(), "Extracted rule bundle");
        Ok(cached)
    }

    fn stage(
        &self,
        files: &[PathBuf],
        metadata: &CacheMetadata,
    ) -> Result<BTreeSet<String>, BundleError> {
        let mut cached = BTreeSet::new();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                trace!(name, "Skipping hidden bundle file");
                continue;
            }
            let bytes = fs::read(path).map_err(BundleError::Read)?;
            self.cache.set(STAGING_NAMESPACE, name, &bytes, metadata)?;
            trace!(name, "Staged bundle file");
            cached.insert(name.to_string());
        }
        Ok(cached)
    }
}

/// Expand every entry of the zip at `archive_path` into `target`
fn expand_archive(archive_path: &Path, target: &Path) -> Result<(), BundleError> {
    let file = File::open(archive_path).map_err(BundleError::Read)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(target).map_err(BundleError::Read)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Rejects absolute paths and `..` components
        let Some(relative) = entry.enclosed_name() else {
            return Err(BundleError::UnsafeEntry(entry.name().to_string()));
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(BundleError::Read)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(BundleError::Read)?;
        }
        let mut out = File::create(&out_path).map_err(BundleError::Read)?;
        io::copy(&mut entry, &mut out).map_err(|e| {
            BundleError::Corrupt(ZipError::Io(e))
        })?;
    }
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.path());
    for entry in entries {
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Scratch directory removed on drop
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create(root: &Path) -> Result<Self, BundleError> {
        let path = root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&path).map_err(BundleError::ScratchDir)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Could not remove scratch directory");
        }
    }
}

/// Errors extracting a rule bundle
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot create scratch directory: {0}")]
    ScratchDir(io::Error),

    #[error("cannot write archive: {0}")]
    WriteArchive(io::Error),

    #[error("cannot read extracted files: {0}")]
    Read(io::Error),

    #[error("corrupt archive: {0}")]
    Corrupt(#[from] ZipError),

    #[error("archive entry escapes extraction directory: {0}")]
    UnsafeEntry(String),

    #[error("cannot cache extracted file: {0}")]
    Cache(#[from] CacheError),
}
