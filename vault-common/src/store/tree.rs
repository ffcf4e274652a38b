//! Directory tree listing for the status page
//!
//! Level ordering:
//! - device level: directories only, ascending
//! - date level: directories only, newest calendar date first, names that do
//!   not parse as `YYYY-MM-DD` last
//! - below a date: directories first, then files, each ascending
//!
//! Symlinked directories are never descended. Symlinked files are listed only
//! when their target stays inside the root.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::artifact_store::is_staging_file;
use crate::Result;

/// File classification used to pick rendering actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// `.wav`: downloadable audio
    Audio,
    /// `.json`: viewable and downloadable
    Json,
    /// Anything else: downloadable only
    Other,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(".wav") {
            Self::Audio
        } else if name.ends_with(".json") {
            Self::Json
        } else {
            Self::Other
        }
    }

    pub fn is_viewable(&self) -> bool {
        matches!(self, Self::Json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "file_kind", rename_all = "snake_case")]
pub enum NodeKind {
    Directory,
    File(FileKind),
}

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    /// `/`-separated path relative to the listed root
    pub relative_path: String,
    pub kind: NodeKind,
    /// Ordered children, always empty for files
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    pub fn file_kind(&self) -> Option<FileKind> {
        match self.kind {
            NodeKind::File(kind) => Some(kind),
            NodeKind::Directory => None,
        }
    }
}

/// Recursive lister over a store root
pub struct TreeLister {
    root: PathBuf,
}

struct Level {
    dirs: Vec<DirEntry>,
    files: Vec<DirEntry>,
}

impl TreeLister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List every device directory with its dates and their contents
    ///
    /// A missing root yields an empty listing.
    pub fn list(&self) -> Result<Vec<TreeNode>> {
        let canonical_root = match self.root.canonicalize() {
            Ok(root) => root,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "Store root missing, empty listing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut devices = Vec::new();
        for device in self.read_level(&self.root, &canonical_root)?.dirs {
            let mut dates = self.read_level(device.path(), &canonical_root)?.dirs;
            dates.sort_by(|a, b| {
                compare_dates_desc(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
            });

            let mut date_nodes = Vec::with_capacity(dates.len());
            for date in dates {
                let children = self.walk(date.path(), &canonical_root)?;
                date_nodes.push(self.dir_node(&date, children));
            }

            devices.push(self.dir_node(&device, date_nodes));
        }

        Ok(devices)
    }

    fn walk(&self, dir: &Path, canonical_root: &Path) -> Result<Vec<TreeNode>> {
        let level = self.read_level(dir, canonical_root)?;
        let mut nodes = Vec::with_capacity(level.dirs.len() + level.files.len());

        for sub in level.dirs {
            let children = self.walk(sub.path(), canonical_root)?;
            nodes.push(self.dir_node(&sub, children));
        }

        for file in level.files {
            let name = file.file_name().to_string_lossy().into_owned();
            nodes.push(TreeNode {
                kind: NodeKind::File(FileKind::from_name(&name)),
                relative_path: self.relative(file.path()),
                name,
                children: Vec::new(),
            });
        }

        Ok(nodes)
    }

    /// Immediate children of `dir`, split and sorted by name
    fn read_level(&self, dir: &Path, canonical_root: &Path) -> Result<Level> {
        let mut level = Level {
            dirs: Vec::new(),
            files: Vec::new(),
        };

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error accessing entry: {}", e);
                    continue;
                }
            };

            if is_staging_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                level.dirs.push(entry);
            } else if file_type.is_file() {
                level.files.push(entry);
            } else if file_type.is_symlink() && symlinked_file_inside(entry.path(), canonical_root) {
                level.files.push(entry);
            } else {
                debug!(path = %entry.path().display(), "Skipping entry");
            }
        }

        Ok(level)
    }

    fn dir_node(&self, entry: &DirEntry, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            name: entry.file_name().to_string_lossy().into_owned(),
            relative_path: self.relative(entry.path()),
            kind: NodeKind::Directory,
            children,
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn symlinked_file_inside(path: &Path, canonical_root: &Path) -> bool {
    match path.canonicalize() {
        Ok(target) => target.starts_with(canonical_root) && target.is_file(),
        Err(_) => false,
    }
}

/// Newest `YYYY-MM-DD` first; unparseable names after every date, by name
pub fn compare_dates_desc(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    match (parse(a), parse(b)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
