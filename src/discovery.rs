//! Source-tree discovery for the re-encode pipeline.
//!
//! We walk the source root, keep files whose extension is in the configured set, and mirror
//! each one's relative position under the destination root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// One file to re-encode and where its output goes.
///
/// Created only by [`discover`] (or tests); immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    source_path: PathBuf,
    destination_path: PathBuf,
}

impl WorkItem {
    pub fn new(source_path: impl Into<PathBuf>, destination_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path: destination_path.into(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }
}

/// Build the worklist for `source_root`.
///
/// Side effect: the parent directory of every destination path is created (idempotently).
///
/// Returns [`Error::Configuration`] when the source root is missing, is not a directory, or
/// holds no matching files. Order follows directory traversal and is not sorted.
pub fn discover<S: AsRef<str>>(
    source_root: &Path,
    destination_root: &Path,
    extensions: &[S],
) -> Result<Vec<WorkItem>> {
    if !source_root.exists() {
        return Err(Error::configuration(format!(
            "source root does not exist: {}",
            source_root.display()
        )));
    }
    if !source_root.is_dir() {
        return Err(Error::configuration(format!(
            "source root is not a directory: {}",
            source_root.display()
        )));
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|ext| normalize_extension(ext.as_ref()))
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut items = Vec::new();

    for entry in WalkDir::new(source_root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry during discovery");
                continue;
            }
        };

        if !is_regular_file(&entry) || !has_wanted_extension(entry.path(), &wanted) {
            continue;
        }

        let relative = entry.path().strip_prefix(source_root).map_err(|_| {
            Error::msg(format!(
                "{} is not under source root {}",
                entry.path().display(),
                source_root.display()
            ))
        })?;
        let destination_path = destination_root.join(relative);

        if let Some(parent) = destination_path.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!(
            source = %entry.path().display(),
            destination = %destination_path.display(),
            "queued for re-encode"
        );
        items.push(WorkItem::new(entry.path(), destination_path));
    }

    if items.is_empty() {
        return Err(Error::configuration(format!(
            "no videos with extensions [{}] found under {}",
            wanted.join(", "),
            source_root.display()
        )));
    }

    Ok(items)
}

/// Plain files, plus symlinks that resolve to one. Directory symlinks are not descended.
fn is_regular_file(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn has_wanted_extension(path: &Path, wanted: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| wanted.iter().any(|w| ext.eq_ignore_ascii_case(w)))
}
