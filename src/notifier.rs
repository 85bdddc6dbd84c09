// src/notifier.rs

//! Best-effort desktop notifications.
//!
//! Notifications are a convenience: callers log delivery failures at debug
//! level and carry on.

use tokio::process::Command;

use crate::errors::{DevloopError, Result};
use crate::types::BoxFuture;

pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Used when notifications are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify<'a>(&'a self, _message: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Shows a desktop notification through `osascript` on macOS and
/// `notify-send` elsewhere.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    title: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("devloop")
    }
}

impl DesktopNotifier {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn command(&self, message: &str) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_string(message),
                applescript_string(&self.title)
            );
            let mut c = Command::new("osascript");
            c.arg("-e").arg(script);
            c
        } else {
            let mut c = Command::new("notify-send");
            c.arg(&self.title).arg(message);
            c
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let output = self.command(message).output().await?;
            if output.status.success() {
                Ok(())
            } else {
                Err(DevloopError::ProcessError(format!(
                    "notification command exited with {}",
                    output.status
                )))
            }
        })
    }
}

fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
