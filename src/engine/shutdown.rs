// src/engine/shutdown.rs

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::exec::Runner;

/// Exit status used when devloop is stopped by a signal.
pub const SHUTDOWN_EXIT_CODE: i32 = 1;

/// Stops the application and exits the process on SIGINT / SIGTERM.
///
/// Armed once at startup, it runs on its own task next to the scan loop and
/// fires at most once. A build in progress is not cancelled; only the
/// application process is stopped.
pub struct ShutdownHandler {
    task: JoinHandle<()>,
}

impl ShutdownHandler {
    /// Arm on real OS signals; exits via `std::process::exit`.
    pub fn arm(runner: Arc<dyn Runner>) -> Self {
        Self::arm_with(wait_for_signal(), runner, |code| std::process::exit(code))
    }

    /// Arm on an arbitrary signal future.
    ///
    /// `signal` resolves with the signal name once termination is requested.
    /// `exit` is called with [`SHUTDOWN_EXIT_CODE`] after the application
    /// has been stopped.
    pub fn arm_with<S, E>(signal: S, runner: Arc<dyn Runner>, exit: E) -> Self
    where
        S: Future<Output = io::Result<&'static str>> + Send + 'static,
        E: FnOnce(i32) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let name = match signal.await {
                Ok(name) => name,
                Err(e) => {
                    error!(error = %e, "failed to listen for termination signals");
                    return;
                }
            };

            info!(signal = name, "got signal, shutting down");
            if let Err(e) = runner.kill().await {
                error!(error = %e, "error killing application");
            }

            exit(SHUTDOWN_EXIT_CODE);
        });

        Self { task }
    }

    /// True once the handler has fired (or failed to listen).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the handler task to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "shutdown handler panicked");
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}
