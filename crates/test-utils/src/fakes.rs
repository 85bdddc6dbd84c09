//! In-memory stand-ins for the builder, runner and notifier.
//!
//! All three can share one [`CallLog`], so tests can assert the exact order
//! of `kill`, `build` and `run` across collaborators.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use devloop::build::Builder;
use devloop::errors::{DevloopError, Result};
use devloop::exec::{OutputSink, Runner};
use devloop::notifier::Notifier;
use devloop::types::BoxFuture;

/// Ordered record of collaborator calls, e.g. `["kill", "build", "run"]`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Builder that replays scripted outcomes.
///
/// Each `build()` pops the next outcome; once the script is empty every
/// build succeeds. `Err(text)` fails the build with `text` as diagnostics.
pub struct FakeBuilder {
    log: CallLog,
    script: VecDeque<std::result::Result<(), String>>,
    errors: String,
    binary: PathBuf,
}

impl FakeBuilder {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            script: VecDeque::new(),
            errors: String::new(),
            binary: PathBuf::from("fake-bin"),
        }
    }

    pub fn then_fail(mut self, diagnostics: &str) -> Self {
        self.script.push_back(Err(diagnostics.to_string()));
        self
    }

    pub fn then_succeed(mut self) -> Self {
        self.script.push_back(Ok(()));
        self
    }
}

impl Builder for FakeBuilder {
    fn build(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.push("build");
            match self.script.pop_front().unwrap_or(Ok(())) {
                Ok(()) => {
                    self.errors.clear();
                    Ok(())
                }
                Err(diagnostics) => {
                    self.errors = diagnostics;
                    Err(DevloopError::BuildFailed("scripted failure".into()))
                }
            }
        })
    }

    fn errors(&self) -> String {
        self.errors.clone()
    }

    fn binary(&self) -> &Path {
        &self.binary
    }
}

#[derive(Debug, Default)]
struct FakeSlot {
    armed: bool,
    running: bool,
}

/// Runner that only tracks whether a fake process is "running".
///
/// Like the real runner it starts disarmed, `kill()` disarms it and `run()`
/// refuses to start anything until `arm()` is called.
#[derive(Default)]
pub struct FakeRunner {
    log: CallLog,
    slot: Mutex<FakeSlot>,
    fail_kill: AtomicBool,
    sink: Mutex<Option<OutputSink>>,
}

impl FakeRunner {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Make every `kill()` report an OS-level failure.
    pub fn failing_kill(self) -> Self {
        self.fail_kill.store(true, Ordering::SeqCst);
        self
    }

    pub fn running(&self) -> bool {
        self.slot.lock().unwrap().running
    }

    pub fn armed(&self) -> bool {
        self.slot.lock().unwrap().armed
    }

    pub fn sink(&self) -> Option<OutputSink> {
        *self.sink.lock().unwrap()
    }
}

impl Runner for FakeRunner {
    fn run(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            let mut slot = self.slot.lock().unwrap();
            if !slot.armed {
                return Ok(false);
            }
            if !slot.running {
                slot.running = true;
                self.log.push("run");
            }
            Ok(true)
        })
    }

    fn kill(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.log.push("kill");
            let mut slot = self.slot.lock().unwrap();
            slot.armed = false;
            if self.fail_kill.load(Ordering::SeqCst) {
                return Err(DevloopError::ProcessError("scripted kill failure".into()));
            }
            slot.running = false;
            Ok(())
        })
    }

    fn arm(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.slot.lock().unwrap().armed = true;
        })
    }

    fn is_running(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move { self.running() })
    }

    fn set_output_sink(&self, sink: OutputSink) {
        *self.sink.lock().unwrap() = Some(sink);
    }
}

/// Notifier that records every message, optionally failing delivery.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record messages but report every delivery as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.messages.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(DevloopError::ProcessError("notifier unavailable".into()));
            }
            Ok(())
        })
    }
}
