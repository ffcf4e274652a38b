//! Filesystem-backed artifact store
//!
//! All reads and writes go through [`ArtifactStore::locate`], which keeps
//! every resolved path beneath the configured root. There is no index and no
//! cache: each call touches the filesystem.
//!
//! Writes go to a sibling staging file that is renamed over the target, so a
//! reader never observes a half-written artifact. Concurrent writers to the
//! same key are not serialized; the last rename wins.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::key::{category_dir, ArtifactKey, Category};
use crate::{Error, Result};

/// Marker embedded in staging file names, see [`is_staging_file`]
const STAGING_MARKER: &str = ".tmp-";

/// Available OpenSMILE feature slots for one device and date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotListing {
    pub available_slots: Vec<String>,
    pub count: usize,
    pub has_summary: bool,
    /// Absolute feature directory, present only when it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Path-keyed store rooted at a single base directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a `/`-separated relative path to an absolute path under the root
    ///
    /// Rejects absolute paths and any `..`, root or prefix component. The
    /// deepest existing ancestor of the result is canonicalized and must stay
    /// inside the canonical root, so symlinks cannot lead outside it.
    pub fn locate(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        if relative.is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            warn!(path = %relative, "Rejected path outside the store root");
            return Err(Error::Validation(
                "Invalid path components detected".to_string(),
            ));
        }

        let candidate = self.root.join(rel);

        let canonical_root = match self.root.canonicalize() {
            Ok(root) => root,
            // Nothing exists yet, so nothing can be escaped through
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(candidate),
            Err(e) => return Err(e.into()),
        };

        let mut probe = candidate.as_path();
        loop {
            match probe.canonicalize() {
                Ok(real) => {
                    if !real.starts_with(&canonical_root) {
                        warn!(
                            path = %relative,
                            resolved = %real.display(),
                            "Rejected path resolving outside the store root"
                        );
                        return Err(Error::Validation(
                            "Invalid path components detected".to_string(),
                        ));
                    }
                    break;
                }
                Err(e) if is_absent(&e) => match probe.parent() {
                    Some(parent) => probe = parent,
                    None => break,
                },
                Err(e) => return Err(e.into()),
            }
        }

        Ok(candidate)
    }

    /// Absolute path for a key
    pub fn path_for(&self, key: &ArtifactKey) -> Result<PathBuf> {
        self.locate(&key.relative_path())
    }

    /// Write `bytes` at `relative`, creating parent directories as needed
    ///
    /// Returns the absolute path written. Overwrites any existing file.
    pub async fn put(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.locate(relative)?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Validation(format!("Path has no file name: {}", relative)))?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = target.with_file_name(format!(
            ".{}{}{}",
            file_name,
            STAGING_MARKER,
            Uuid::new_v4().simple()
        ));

        if let Err(e) = tokio::fs::write(&staging, bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        debug!(path = %target.display(), bytes = bytes.len(), "Stored artifact");
        Ok(target)
    }

    pub async fn put_artifact(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<PathBuf> {
        self.put(&key.relative_path(), bytes).await
    }

    /// Read the full content of the file at `relative`
    pub async fn get(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.locate(relative)?;
        ensure_file(&path, relative).await?;

        tokio::fs::read(&path).await.map_err(|e| {
            if is_absent(&e) {
                Error::NotFound(relative.to_string())
            } else {
                e.into()
            }
        })
    }

    pub async fn get_artifact(&self, key: &ArtifactKey) -> Result<Vec<u8>> {
        self.get(&key.relative_path()).await
    }

    /// Whether a regular file exists at `relative`
    ///
    /// Paths that fail validation are reported as absent.
    pub async fn exists(&self, relative: &str) -> bool {
        match self.locate(relative) {
            Ok(path) => tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Read and parse the file at `relative` as JSON
    ///
    /// A missing file is [`Error::NotFound`]; unparseable content is
    /// [`Error::Format`].
    pub async fn read_json(&self, relative: &str) -> Result<serde_json::Value> {
        let bytes = self.get(relative).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            debug!(path = %relative, error = %e, "Stored file is not valid JSON");
            Error::Format(format!("{}: {}", relative, e))
        })
    }

    pub async fn read_artifact_json(&self, key: &ArtifactKey) -> Result<serde_json::Value> {
        self.read_json(&key.relative_path()).await
    }

    /// Slot names of the immediate `.json` files in `category_dir`, sorted
    ///
    /// `HH-MM` names sort chronologically under plain lexical order.
    pub async fn list_slots(&self, category_dir: &str) -> Result<Vec<String>> {
        let dir = self.locate(category_dir)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if is_absent(&e) => return Err(Error::NotFound(category_dir.to_string())),
            Err(e) => return Err(e.into()),
        };

        let mut slots = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(slot) = name.strip_suffix(".json") {
                slots.push(slot.to_string());
            }
        }
        slots.sort();

        debug!(dir = %category_dir, count = slots.len(), "Listed slots");
        Ok(slots)
    }

    /// OpenSMILE feature slots plus whether the day's summary exists
    ///
    /// A missing feature directory yields an empty listing, not an error.
    pub async fn opensmile_slot_listing(&self, device_id: &str, date: &str) -> Result<SlotListing> {
        let features_dir = category_dir(device_id, date, Category::Opensmile);
        let summary = ArtifactKey::singleton(device_id, date, Category::OpensmileSummary)?;
        let has_summary = self.exists(&summary.relative_path()).await;

        match self.list_slots(&features_dir).await {
            Ok(available_slots) => Ok(SlotListing {
                count: available_slots.len(),
                available_slots,
                has_summary,
                directory: Some(self.locate(&features_dir)?.display().to_string()),
            }),
            Err(Error::NotFound(_)) => Ok(SlotListing {
                available_slots: Vec::new(),
                count: 0,
                has_summary,
                directory: None,
            }),
            Err(e) => Err(e),
        }
    }
}

/// Whether `name` is an in-flight staging file written by [`ArtifactStore::put`]
pub fn is_staging_file(name: &str) -> bool {
    name.starts_with('.') && name.contains(STAGING_MARKER)
}

async fn ensure_file(path: &Path, relative: &str) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(Error::NotFound(relative.to_string())),
        Err(e) if is_absent(&e) => Err(Error::NotFound(relative.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Missing, or reached through a path segment that is a regular file
fn is_absent(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
