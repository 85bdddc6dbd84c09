// src/exec/runner.rs

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::RwLock;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{DevloopError, Result};
use crate::types::BoxFuture;

/// Where the application's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSink {
    /// Share devloop's own stdout/stderr (default).
    #[default]
    Inherit,
    /// Forward each line to `tracing` at info level.
    Log,
    /// Discard.
    Null,
}

/// Starts and stops the application process.
///
/// Implementations must tolerate concurrent calls: the rebuild loop and the
/// shutdown handler can both stop the process at any moment, and the proxy
/// can ask for a start at any moment.
///
/// A runner is either armed or disarmed. [`Runner::kill`] disarms it and
/// [`Runner::arm`] re-arms it once a fresh artifact exists. While disarmed,
/// [`Runner::run`] starts nothing. The flag and the process slot change
/// together, so a start requested before a rebuild can never launch a stale
/// or missing binary after the rebuild has stopped the application.
pub trait Runner: Send + Sync {
    /// Start the application unless it is already running.
    ///
    /// Returns `Ok(true)` when the application is running afterwards and
    /// `Ok(false)` when the runner is disarmed.
    fn run(&self) -> BoxFuture<'_, Result<bool>>;

    /// Disarm, then stop the application if one is running and wait for it
    /// to exit.
    ///
    /// Stopping when nothing runs is a no-op; errors are reserved for real
    /// OS-level failures. The runner is disarmed even when stopping fails.
    fn kill(&self) -> BoxFuture<'_, Result<()>>;

    /// Allow [`Runner::run`] to start the application again.
    fn arm(&self) -> BoxFuture<'_, ()>;

    fn is_running(&self) -> BoxFuture<'_, bool>;

    /// Redirect the output of processes started from now on.
    fn set_output_sink(&self, sink: OutputSink);
}

/// Process slot guarded by one lock.
#[derive(Debug, Default)]
struct Slot {
    armed: bool,
    child: Option<Child>,
}

/// Runner backed by a real child process. Starts disarmed.
#[derive(Debug)]
pub struct ProcessRunner {
    bin: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    sink: RwLock<OutputSink>,
    slot: Mutex<Slot>,
}

impl ProcessRunner {
    /// `envs` are added to the inherited environment of every started process.
    pub fn new(bin: impl Into<PathBuf>, args: Vec<String>, envs: Vec<(String, String)>) -> Self {
        Self {
            bin: bin.into(),
            args,
            envs,
            sink: RwLock::new(OutputSink::default()),
            slot: Mutex::new(Slot::default()),
        }
    }

    fn sink(&self) -> OutputSink {
        *self.sink.read().unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_child(&self) -> Result<Child> {
        let sink = self.sink();

        let mut cmd = Command::new(&self.bin);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match sink {
            OutputSink::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputSink::Log => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputSink::Null => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let mut child = cmd.spawn().map_err(|e| {
            DevloopError::ProcessError(format!("starting {:?}: {e}", self.bin))
        })?;

        if sink == OutputSink::Log {
            if let Some(stdout) = child.stdout.take() {
                forward_lines(stdout, "stdout");
            }
            if let Some(stderr) = child.stderr.take() {
                forward_lines(stderr, "stderr");
            }
        }

        Ok(child)
    }
}

impl Runner for ProcessRunner {
    fn run(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            let mut slot = self.slot.lock().await;

            if !slot.armed {
                debug!("runner disarmed; not starting application");
                return Ok(false);
            }

            if let Some(child) = slot.child.as_mut() {
                match child.try_wait() {
                    Ok(None) => {
                        debug!(pid = child.id(), "application already running");
                        return Ok(true);
                    }
                    Ok(Some(status)) => {
                        info!(status = %status, "application exited; starting it again");
                    }
                    Err(e) => {
                        warn!(error = %e, "could not query application status; replacing it");
                    }
                }
            }

            let child = self.spawn_child()?;
            info!(pid = child.id(), bin = ?self.bin, args = ?self.args, "application started");
            slot.child = Some(child);
            Ok(true)
        })
    }

    fn kill(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            // Hold the slot for the whole stop so a concurrent `run` cannot
            // start a replacement before the old process is gone.
            let mut slot = self.slot.lock().await;
            slot.armed = false;
            let Some(mut child) = slot.child.take() else {
                return Ok(());
            };

            let pid = child.id();
            match child.kill().await {
                Ok(()) => {
                    info!(pid, "application stopped");
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::InvalidInput => {
                    debug!(pid, "application had already exited");
                    Ok(())
                }
                Err(e) => Err(DevloopError::ProcessError(format!(
                    "stopping {:?} (pid {pid:?}): {e}",
                    self.bin
                ))),
            }
        })
    }

    fn arm(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.slot.lock().await.armed = true;
        })
    }

    fn is_running(&self) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            let mut slot = self.slot.lock().await;
            match slot.child.as_mut() {
                Some(child) => matches!(child.try_wait(), Ok(None)),
                None => false,
            }
        })
    }

    fn set_output_sink(&self, sink: OutputSink) {
        *self.sink.write().unwrap_or_else(|e| e.into_inner()) = sink;
    }
}

fn forward_lines<R>(stream: R, stream_name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(stream = stream_name, "app: {}", line);
        }
    });
}
