// src/engine/state.rs

use chrono::{DateTime, Local};

pub const BUILD_SUCCESSFUL_MESSAGE: &str = "Build Successful";

/// Outcome of the previous build, kept across rebuild cycles.
///
/// It only picks the message shown after a successful build; a failed build
/// never prevents the next attempt.
#[derive(Debug, Clone, Default)]
pub struct BuildState {
    last_error: Option<String>,
}

impl BuildState {
    pub fn previous_failed(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn record_failure(&mut self, diagnostics: String) {
        self.last_error = Some(diagnostics);
    }

    /// Clear the error. Returns whether the previous build had failed.
    pub fn record_success(&mut self) -> bool {
        self.last_error.take().is_some()
    }
}

/// Message for a successful build.
///
/// After a failure the user mostly wants to know the build is green again;
/// otherwise report which project was rebuilt and when.
pub fn success_message(recovered: bool, project: &str, at: DateTime<Local>) -> String {
    if recovered {
        BUILD_SUCCESSFUL_MESSAGE.to_string()
    } else {
        format!("{project} - Rebuilt at {}", at.format("%H:%M:%S%.6f"))
    }
}
