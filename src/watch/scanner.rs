// src/watch/scanner.rs

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::watch::cursor::ScanCursor;
use crate::watch::exclude::ExcludeMatcher;
use crate::watch::WatchConfig;

/// A source file modified after the scan cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Walks the watched tree and reports the first qualifying change.
///
/// The walk is depth-first in file-name order. Excluded directories are
/// pruned, not just filtered, so nothing beneath them is visited. The walk
/// stops at the first file with the configured extension whose modification
/// time is after the cursor.
///
/// Only one change is reported per scan. Several files saved in the same
/// burst collapse into a single rebuild, and whichever file is found first in
/// walk order wins; the others are at or before the advanced cursor and are
/// not reported separately.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    matcher: ExcludeMatcher,
    extension: String,
}

impl Scanner {
    /// Build a scanner for `config`. The scan-up adjustment of the root is
    /// computed here, once.
    pub fn new(config: &WatchConfig) -> Self {
        let root = effective_root(&config.root, config.scan_lower);
        let matcher = ExcludeMatcher::new(root.clone(), &config.exclude);
        let extension = config.extension.trim_start_matches('.').to_string();

        debug!(root = ?root, extension = %extension, "scanner configured");

        Self {
            root,
            matcher,
            extension,
        }
    }

    /// Effective watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// One traversal of the tree. Returns the first change newer than
    /// `cursor`, or `None` once the whole tree has been visited.
    pub fn scan(&self, cursor: &ScanCursor) -> Option<Change> {
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.matcher.is_excluded(entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }

            let modified = match entry
                .metadata()
                .map_err(io::Error::from)
                .and_then(|m| m.modified())
            {
                Ok(modified) => modified,
                Err(err) => {
                    debug!(path = ?entry.path(), error = %err, "no modification time");
                    continue;
                }
            };

            if cursor.is_new(modified) {
                trace!(path = ?entry.path(), "change found; stopping walk");
                return Some(Change {
                    path: entry.into_path(),
                    modified,
                });
            }
        }

        None
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}

/// Root actually walked.
///
/// With `scan_lower > 0`, the absolute form of `root` loses its last
/// `scan_lower` segments, so a project can watch an ancestor directory (a
/// monorepo, for instance). If there are not enough segments the absolute
/// root is kept.
pub fn effective_root(root: &Path, scan_lower: usize) -> PathBuf {
    if scan_lower == 0 {
        return root.to_path_buf();
    }

    let absolute: PathBuf = std::path::absolute(root)
        .unwrap_or_else(|_| root.to_path_buf())
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    match absolute.ancestors().nth(scan_lower) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => absolute,
    }
}
