// src/watch/mod.rs

//! Change detection.
//!
//! This module is responsible for:
//! - Deciding which paths are never scanned (`exclude`).
//! - Walking the watched tree once per cycle and reporting the first source
//!   file modified after the scan cursor (`scanner`, `cursor`).
//! - Optionally waking the loop early on OS filesystem events (`wake`).
//!
//! It does **not** build or run anything; it only answers "did something
//! change since last time?".

pub mod cursor;
pub mod exclude;
pub mod scanner;
pub mod wake;

use std::path::PathBuf;

pub use cursor::ScanCursor;
pub use exclude::ExcludeMatcher;
pub use scanner::{effective_root, Change, Scanner};
pub use wake::{spawn_wake_watcher, WakeSignal};

/// What to watch. Created once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Watched root as configured (before the scan-up adjustment).
    pub root: PathBuf,
    /// Number of trailing segments removed from the absolute root.
    pub scan_lower: usize,
    /// Excluded paths, compared exactly (no globbing).
    pub exclude: Vec<String>,
    /// Source file extension that counts as a change, e.g. `go`.
    pub extension: String,
}
