// src/build/mod.rs

//! Building the watched project.
//!
//! The rebuild loop only talks to the [`Builder`] trait, so tests can swap in
//! a scripted fake. [`GoBuilder`] is the production implementation.

pub mod go;

use std::path::Path;

use crate::errors::Result;
use crate::types::BoxFuture;

pub use go::{binary_file_name, GoBuilder};

/// Trait abstracting how the project is built.
pub trait Builder: Send {
    /// Run a full build. Returns an error if the build failed.
    fn build(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Diagnostic output of the most recent failed build; empty after a
    /// successful one.
    fn errors(&self) -> String;

    /// Path of the artifact produced by a successful build.
    fn binary(&self) -> &Path;
}
