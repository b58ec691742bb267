//! File backend: one JSON document per resource under a directory.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gridview_model::{GridPreference, SaveGridPreference};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::PreferenceBackend;
use crate::error::{Result, SyncError};

#[derive(Debug, Clone)]
pub struct FilePreferenceBackend {
    dir: PathBuf,
}

/// On-disk form of a stored document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument<'a> {
    #[serde(flatten)]
    document: &'a SaveGridPreference,
    saved_at: DateTime<Utc>,
}

impl FilePreferenceBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the document of `resource`.
    pub fn path_for(&self, resource: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(resource)))
    }
}

impl PreferenceBackend for FilePreferenceBackend {
    async fn fetch(&self, resource: &str) -> Result<Option<GridPreference>> {
        let path = self.path_for(resource);
        let owned = resource.to_string();
        tokio::task::spawn_blocking(move || read_document(&owned, &path)).await?
    }

    /// Stages the temp file and renames it in separate blocking steps. A
    /// caller aborted while staging never reaches the rename, so the stored
    /// document stays as it was.
    async fn save(&self, document: &SaveGridPreference) -> Result<()> {
        let path = self.path_for(&document.resource);
        let bytes = serde_json::to_vec_pretty(&StoredDocument {
            document,
            saved_at: Utc::now(),
        })?;
        let staged = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || stage_document(&bytes, &path)).await??
        };
        let target = path.clone();
        tokio::task::spawn_blocking(move || commit_document(&staged, &target)).await??;
        info!(resource = %document.resource, path = %path.display(), "saved grid preference");
        Ok(())
    }
}

fn read_document(resource: &str, path: &Path) -> Result<Option<GridPreference>> {
    let body = match fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(resource, path = %path.display(), "no stored grid preference");
            return Ok(None);
        }
        Err(e) => {
            return Err(SyncError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    match GridPreference::from_json_str(&body) {
        Ok(document) => Ok(document),
        Err(error) => {
            warn!(resource, path = %path.display(), %error, "malformed grid preference ignored");
            Ok(None)
        }
    }
}

/// Write `bytes` to the temp file next to `path` and return the temp path.
/// A temp file left by an earlier aborted save is overwritten.
fn stage_document(bytes: &[u8], path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SyncError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|e| SyncError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(bytes).map_err(|e| SyncError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;
    file.sync_all().map_err(|e| SyncError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;
    Ok(temp_path)
}

/// Replace `path` with the staged file in one rename.
fn commit_document(temp_path: &Path, path: &Path) -> Result<()> {
    fs::rename(temp_path, path).map_err(|e| SyncError::AtomicWriteFailed {
        temp_path: temp_path.to_path_buf(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

/// Resource keys become file names; anything outside `[A-Za-z0-9_-]` is
/// replaced.
fn file_stem(resource: &str) -> String {
    let stem: String = resource
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "_".to_string() } else { stem }
}
