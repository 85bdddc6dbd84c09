// src/engine/orchestrator.rs

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::engine::coordinator::{RebuildCoordinator, RebuildOutcome};
use crate::watch::{Change, ScanCursor, Scanner, WakeSignal};

/// Result of one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A change was found and a rebuild ran.
    Rebuilt {
        change: Change,
        outcome: RebuildOutcome,
    },
    /// Nothing changed; the loop waited one interval.
    Idle,
}

/// The main loop: scan, rebuild on change, otherwise wait.
///
/// Owns the scan cursor. Two states only: scanning (including the wait
/// between scans) and building (inside [`RebuildCoordinator::rebuild`]). The
/// loop never ends on its own; the process exits through the shutdown
/// handler.
pub struct Orchestrator {
    scanner: Scanner,
    cursor: ScanCursor,
    coordinator: RebuildCoordinator,
    interval: Duration,
    wake: Option<WakeSignal>,
}

impl Orchestrator {
    /// The cursor starts at "now": files modified before startup are covered
    /// by the initial build.
    pub fn new(scanner: Scanner, coordinator: RebuildCoordinator, interval: Duration) -> Self {
        Self {
            scanner,
            cursor: ScanCursor::now(),
            coordinator,
            interval,
            wake: None,
        }
    }

    pub fn with_cursor(mut self, cursor: ScanCursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_wake(mut self, wake: Option<WakeSignal>) -> Self {
        self.wake = wake;
        self
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    pub fn coordinator(&self) -> &RebuildCoordinator {
        &self.coordinator
    }

    /// Initial build, then scan cycles forever.
    pub async fn run(mut self) -> Result<()> {
        info!(root = ?self.scanner.root(), "watching for changes");
        self.initial_build().await;

        loop {
            self.step().await?;
        }
    }

    /// Build (and maybe start) once so a freshly started loop is usable
    /// before the first edit.
    pub async fn initial_build(&mut self) -> RebuildOutcome {
        self.coordinator.rebuild(None).await
    }

    /// One cycle: scan; on a change, advance the cursor and rebuild;
    /// otherwise wait for the interval (or an earlier filesystem event).
    pub async fn step(&mut self) -> Result<CycleOutcome> {
        let scanner = self.scanner.clone();
        let cursor = self.cursor;
        let found = tokio::task::spawn_blocking(move || scanner.scan(&cursor))
            .await
            .context("scan task panicked")?;

        match found {
            Some(change) => {
                self.cursor.advance_past(change.modified);
                let outcome = self.coordinator.rebuild(Some(&change.path)).await;
                Ok(CycleOutcome::Rebuilt { change, outcome })
            }
            None => {
                self.wait().await;
                Ok(CycleOutcome::Idle)
            }
        }
    }

    async fn wait(&mut self) {
        match self.wake.as_mut() {
            Some(wake) => {
                if wake.wait(self.interval).await {
                    debug!("woken early by filesystem event");
                }
            }
            None => tokio::time::sleep(self.interval).await,
        }
    }
}
