// src/watch/exclude.rs

use std::path::{Component, Path, PathBuf};

/// Version-control metadata directory, never scanned.
pub const VCS_DIR: &str = ".git";

/// Decides whether a path is left out of scanning.
///
/// A path is excluded when:
/// - it, or one of its ancestors, equals a configured exclusion exactly
///   (`vendor` excludes `vendor` and `vendor/lib.go`, but not `vendored`),
/// - it is inside the `.git` directory,
/// - its base name starts with a dot.
///
/// The last two rules are unconditional. Configured entries are compared
/// both against the path relative to the watched root and against the path
/// as given.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl ExcludeMatcher {
    pub fn new<I, S>(root: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = entries
            .into_iter()
            .map(|e| normalize(Path::new(e.as_ref().trim())))
            .filter(|p| !p.as_os_str().is_empty())
            .collect();

        Self {
            root: normalize(&root.into()),
            excluded,
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = normalize(path);
        let relative = path.strip_prefix(&self.root).unwrap_or(path.as_path());
        is_hidden(relative) || is_inside_vcs_dir(relative) || self.is_user_excluded(&path)
    }

    /// Exact match of the path or one of its ancestors against the
    /// configured list.
    pub fn is_user_excluded(&self, path: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }

        let path = normalize(path);
        let relative = path.strip_prefix(&self.root).ok();

        let hit = |candidate: &Path| {
            candidate
                .ancestors()
                .filter(|a| !a.as_os_str().is_empty())
                .any(|a| self.excluded.iter().any(|e| e == a))
        };

        hit(path.as_path()) || relative.is_some_and(hit)
    }
}

/// Base name starts with `.`.
///
/// Paths without a base name (`.`, `..`, `/`) are not hidden.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_inside_vcs_dir(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == VCS_DIR))
}

/// Drop `.` components so `./vendor/`, `vendor/` and `vendor` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
