//! On-disk layout for snapshot batches and the merged-table artifact.
//!
//! Each pull is stored individually as a JSON array of raw post objects,
//! keyed by source and capture stamp in the filename:
//!
//! ```text
//! data/
//!   chaosbird.20260829120000.json
//!   chaosbird.20260829180000.json
//!   quarry.20260829120104.json
//! tweets.json        (merged-table artifact, fully replaced each run)
//! ```
//!
//! Snapshot files hold the *raw* objects, so a later version of the
//! normalizer can re-derive the merged table from scratch. The merged
//! table is the authoritative accumulated dataset and is replaced, not
//! appended, on every merge run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::warn;

use crate::record::PostRecord;

/// Filename stamp layout for snapshot keys.
pub const SNAPSHOT_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const SNAPSHOT_EXTENSION: &str = "json";

/// Errors from snapshot and table persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot file {path} does not contain a JSON array")]
    NotAnArray { path: PathBuf },
}

/// Identity of one stored snapshot: which source it was pulled from and
/// when. The stamp is zone-naive in the filename; the configured local
/// offset is attached at load time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub source: String,
    pub captured_at: NaiveDateTime,
}

impl SnapshotKey {
    /// Render the filename for this key, `<source>.<YYYYMMDDHHMMSS>.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}.{SNAPSHOT_EXTENSION}",
            self.source,
            self.captured_at.format(SNAPSHOT_STAMP_FORMAT)
        )
    }

    /// Parse a snapshot filename back into a key.
    ///
    /// Returns `None` for names that don't match the layout — the store
    /// skips those on listing, so foreign files in the data dir are
    /// harmless. Sources may themselves contain dots; only the final two
    /// components are structural.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(&format!(".{SNAPSHOT_EXTENSION}"))?;
        let (source, stamp) = stem.rsplit_once('.')?;
        if source.is_empty() || stamp.len() != 14 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let captured_at = NaiveDateTime::parse_from_str(stamp, SNAPSHOT_STAMP_FORMAT).ok()?;
        Some(Self {
            source: source.to_string(),
            captured_at,
        })
    }
}

/// Manages the snapshot data directory.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `data_dir`. Does not touch the filesystem;
    /// call [`ensure_dirs`](Self::ensure_dirs) before writing.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the snapshot file for `key`.
    #[must_use]
    pub fn snapshot_path(&self, key: &SnapshotKey) -> PathBuf {
        self.data_dir.join(key.file_name())
    }

    /// Create the data directory if it doesn't exist. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        Ok(())
    }

    /// List all stored snapshots, sorted by (source, capture stamp).
    ///
    /// Files that don't match the snapshot filename layout are skipped
    /// with a warning. A missing data directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be read.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotKey>, StoreError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.data_dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            match SnapshotKey::parse(&name_str) {
                Some(key) => keys.push(key),
                None => warn!(file = %name_str, "skipping non-snapshot file in data dir"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Read the raw post objects of a stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read, is not valid
    /// JSON, or is not a JSON array.
    pub fn read_snapshot(&self, key: &SnapshotKey) -> Result<Vec<Value>, StoreError> {
        let path = self.snapshot_path(key);
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        match value {
            Value::Array(objects) => Ok(objects),
            _ => Err(StoreError::NotAnArray { path }),
        }
    }

    /// Persist one pull's raw post objects under `key`. Overwrites any
    /// previous snapshot with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn write_snapshot(&self, key: &SnapshotKey, objects: &[Value]) -> Result<PathBuf, StoreError> {
        let path = self.snapshot_path(key);
        let body = serde_json::to_string_pretty(objects).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Replace the merged-table artifact at `path`.
///
/// # Errors
///
/// Returns [`StoreError`] on serialization or write failure.
pub fn write_table(path: &Path, table: &[PostRecord]) -> Result<(), StoreError> {
    let body = serde_json::to_string_pretty(table).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the merged-table artifact back. A missing artifact reads as an
/// empty table, so `series` before any `merge` degrades gracefully.
///
/// # Errors
///
/// Returns [`StoreError`] if the file exists but cannot be read or parsed.
pub fn read_table(path: &Path) -> Result<Vec<PostRecord>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}
