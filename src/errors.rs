// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Collaborator seams (builder, runner, notifier, proxy) return
//! [`DevloopError`]; application wiring in `lib.rs` uses `anyhow` with context.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Cannot bind proxy to port {port}: {source}")]
    ProxyBind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Process error: {0}")]
    ProcessError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DevloopError>;
