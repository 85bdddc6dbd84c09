// src/engine/mod.rs

//! Rebuild orchestration.
//!
//! This module ties together:
//! - the scan loop (`orchestrator`), which owns the scan cursor
//! - the kill → build → run sequence (`coordinator`), which owns the build
//!   state and the application handle
//! - the signal handler (`shutdown`), the only code running concurrently
//!   with the loop
//!
//! Scanning and rebuilding run one after the other on the same task; a
//! rebuild never overlaps another rebuild or a scan.

pub mod coordinator;
pub mod orchestrator;
pub mod shutdown;
pub mod state;

pub use crate::types::{BuildStatus, RunPolicy};
pub use coordinator::{RebuildCoordinator, RebuildOutcome, CHANGE_DETECTED_MESSAGE, REBUILD_SETTLE};
pub use orchestrator::{CycleOutcome, Orchestrator};
pub use shutdown::{ShutdownHandler, SHUTDOWN_EXIT_CODE};
pub use state::{success_message, BuildState, BUILD_SUCCESSFUL_MESSAGE};
