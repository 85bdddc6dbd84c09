// src/build/go.rs

use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;
use tracing::{debug, info};

use crate::build::Builder;
use crate::errors::{DevloopError, Result};
use crate::types::BoxFuture;

/// Builds a Go project with `go build -o <binary>`, optionally through
/// `godep`.
#[derive(Debug)]
pub struct GoBuilder {
    dir: PathBuf,
    binary: PathBuf,
    use_godep: bool,
    errors: String,
}

impl GoBuilder {
    /// - `dir` is where the build runs (the configured watch path).
    /// - `binary` is the output artifact.
    pub fn new(dir: impl Into<PathBuf>, binary: impl Into<PathBuf>, use_godep: bool) -> Self {
        Self {
            dir: dir.into(),
            binary: binary.into(),
            use_godep,
            errors: String::new(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = if self.use_godep {
            let mut c = Command::new("godep");
            c.arg("go");
            c
        } else {
            Command::new("go")
        };
        cmd.arg("build").arg("-o").arg(&self.binary);
        cmd.current_dir(&self.dir).kill_on_drop(true);
        cmd
    }
}

impl Builder for GoBuilder {
    fn build(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            info!(dir = ?self.dir, godep = self.use_godep, "building");

            let output = match self.command().output().await {
                Ok(output) => output,
                Err(e) => {
                    self.errors = format!("could not run the go toolchain: {e}");
                    return Err(DevloopError::BuildFailed(self.errors.clone()));
                }
            };

            if output.status.success() {
                debug!(binary = ?self.binary, "build finished");
                self.errors.clear();
                return Ok(());
            }

            self.errors = diagnostics(&output);
            Err(DevloopError::BuildFailed(format!(
                "go build exited with {}",
                output.status
            )))
        })
    }

    fn errors(&self) -> String {
        self.errors.clone()
    }

    fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Compiler output of a failed build: stderr first, then anything on stdout.
fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    [stderr.trim_end(), stdout.trim_end()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Artifact file name for the current platform.
pub fn binary_file_name(name: &str) -> String {
    if cfg!(windows) && !name.ends_with(".exe") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}
