// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::config::model::ConfigFile;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "devloop.toml";

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; semantic checks happen on the
/// merged [`crate::config::Settings`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load the config file if there is one.
///
/// - An explicit path must exist; a missing file is an error.
/// - Without an explicit path, `devloop.toml` inside `dir` is used when it
///   exists, otherwise `None` is returned.
pub fn load_optional(explicit: Option<&Path>, dir: &Path) -> Result<Option<ConfigFile>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(anyhow!("config file {:?} does not exist", path));
        }
        return load_from_path(path).map(Some);
    }

    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        debug!(path = ?candidate, "using config file from working directory");
        return load_from_path(&candidate).map(Some);
    }

    Ok(None)
}
