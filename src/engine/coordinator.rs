// src/engine/coordinator.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::build::Builder;
use crate::engine::state::{success_message, BuildState};
use crate::exec::Runner;
use crate::notifier::Notifier;
use crate::types::{BuildStatus, RunPolicy};

pub const CHANGE_DETECTED_MESSAGE: &str = "Detected changes, rebuilding...";

/// Pause after every rebuild, bounding how fast rebuilds can follow each
/// other.
pub const REBUILD_SETTLE: Duration = Duration::from_millis(100);

/// What a single rebuild did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Build succeeded; `started` tells whether the application was started.
    Built { started: bool },
    /// Build failed with the given diagnostics; nothing is running.
    Failed(String),
}

/// Runs the kill → build → run sequence and remembers the previous build
/// outcome.
///
/// The coordinator is the only owner of the build state. The application
/// handle is shared with the shutdown handler and the proxy through
/// [`Runner`], whose stop operation is idempotent.
pub struct RebuildCoordinator {
    builder: Box<dyn Builder>,
    runner: Arc<dyn Runner>,
    notifier: Arc<dyn Notifier>,
    policy: RunPolicy,
    project: String,
    state: BuildState,
    status_tx: watch::Sender<BuildStatus>,
    settle: Duration,
}

impl RebuildCoordinator {
    /// `project` is the name shown in "Rebuilt at" messages, normally the
    /// last segment of the working directory.
    pub fn new(
        builder: Box<dyn Builder>,
        runner: Arc<dyn Runner>,
        notifier: Arc<dyn Notifier>,
        policy: RunPolicy,
        project: impl Into<String>,
    ) -> Self {
        let (status_tx, _) = watch::channel(BuildStatus::Building);
        Self {
            builder,
            runner,
            notifier,
            policy,
            project: project.into(),
            state: BuildState::default(),
            status_tx,
            settle: REBUILD_SETTLE,
        }
    }

    /// Override the pause after each rebuild (tests use zero).
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Receiver for the build status published after every build.
    pub fn subscribe(&self) -> watch::Receiver<BuildStatus> {
        self.status_tx.subscribe()
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Stop the application, build, and start it again if the build
    /// succeeded and the run policy asks for it.
    ///
    /// `changed` is the file that triggered the rebuild, `None` for the
    /// startup build. A failed stop is logged and the rebuild goes on. The
    /// runner stays disarmed after a failed build, so nothing can start the
    /// application until a later build succeeds.
    pub async fn rebuild(&mut self, changed: Option<&Path>) -> RebuildOutcome {
        if let Some(path) = changed {
            info!(path = ?path, "{}", CHANGE_DETECTED_MESSAGE);
            self.notify(CHANGE_DETECTED_MESSAGE).await;
        }

        self.status_tx.send_replace(BuildStatus::Building);

        if let Err(e) = self.runner.kill().await {
            warn!(error = %e, "failed to stop application; continuing with rebuild");
        }

        let outcome = match self.builder.build().await {
            Err(e) => {
                let diagnostics = self.builder.errors();
                error!(error = %e, "ERROR! Build failed.");
                error!("{}", diagnostics);

                self.notify(&format!("Build failed\n{diagnostics}")).await;
                self.state.record_failure(diagnostics.clone());
                self.status_tx
                    .send_replace(BuildStatus::Failed(diagnostics.clone()));

                RebuildOutcome::Failed(diagnostics)
            }
            Ok(()) => {
                let recovered = self.state.record_success();
                let message = success_message(recovered, &self.project, Local::now());
                info!("{}", message);
                self.notify(&message).await;

                // Arm before publishing, so a proxy that sees `Succeeded`
                // can start the new binary.
                self.runner.arm().await;
                self.status_tx.send_replace(BuildStatus::Succeeded);

                let started = self.start_if_immediate().await;
                RebuildOutcome::Built { started }
            }
        };

        tokio::time::sleep(self.settle).await;
        outcome
    }

    async fn start_if_immediate(&self) -> bool {
        if self.policy != RunPolicy::Immediate {
            debug!("run policy is on-demand; application starts on first request");
            return false;
        }

        match self.runner.run().await {
            Ok(started) => started,
            Err(e) => {
                error!(error = %e, "failed to start application");
                false
            }
        }
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.notifier.notify(message).await {
            debug!(error = %e, "notification not delivered");
        }
    }
}
