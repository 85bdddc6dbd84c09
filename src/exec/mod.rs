// src/exec/mod.rs

//! Application process supervision.
//!
//! - [`runner`] defines the [`Runner`] seam used by the rebuild loop, the
//!   proxy and the shutdown handler, plus [`ProcessRunner`], which spawns the
//!   built binary with `tokio::process::Command`.
//!
//! At most one application process is alive at any time. Stopping is
//! idempotent, so the rebuild path and the shutdown path may both call
//! [`Runner::kill`] without coordinating.

pub mod runner;

pub use runner::{OutputSink, ProcessRunner, Runner};
