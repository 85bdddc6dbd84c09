// src/watch/cursor.rs

use std::time::SystemTime;

/// Boundary between modifications that were already handled and new ones.
///
/// The cursor never moves backwards. It is advanced once per detected change
/// and left alone by scans that find nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanCursor(SystemTime);

impl ScanCursor {
    /// Cursor at the current time; used at startup.
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    pub fn at(time: SystemTime) -> Self {
        Self(time)
    }

    pub fn time(&self) -> SystemTime {
        self.0
    }

    /// True if a file modified at `modified` has not been handled yet.
    pub fn is_new(&self, modified: SystemTime) -> bool {
        modified > self.0
    }

    /// Move the cursor to "now", or to `modified` if that lies in the future,
    /// so the same modification is never reported twice.
    pub fn advance_past(&mut self, modified: SystemTime) {
        let target = SystemTime::now().max(modified);
        if target > self.0 {
            self.0 = target;
        }
    }
}
