// src/config/dotenv.rs

//! Minimal `.env` reader.
//!
//! The variables are handed to the application process; devloop's own
//! environment is left untouched.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

pub const DOTENV_FILE: &str = ".env";

/// Read `.env` from `dir`. A missing file yields an empty map.
pub fn load_dotenv(dir: &Path) -> Result<BTreeMap<String, String>> {
    let path = dir.join(DOTENV_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(parse_dotenv(&contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e).with_context(|| format!("reading {:?}", path)),
    }
}

/// Parse `KEY=VALUE` lines.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is allowed,
/// and one layer of matching quotes around the value is removed. Lines
/// without `=` are ignored.
pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    vars
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
