// src/config/model.rs

use serde::Deserialize;

use crate::exec::OutputSink;

/// Optional configuration file, usually `devloop.toml`.
///
/// ```toml
/// [watch]
/// path = "."
/// scan_lower = 0
/// exclude = ["vendor", "node_modules"]
/// extension = "go"
/// interval_ms = 500
///
/// [build]
/// binary = "devloop-bin"
/// godep = false
///
/// [run]
/// args = ["-env", "development"]
/// immediate = true
/// output = "inherit"
///
/// [proxy]
/// port = 3000
/// app_port = 3001
///
/// [notify]
/// enabled = false
/// ```
///
/// Every key is optional. Values left out fall back to the CLI defaults, and
/// explicit CLI flags always win over the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub proxy: ProxySection,

    #[serde(default)]
    pub notify: NotifySection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Directory to watch, relative to the working directory.
    pub path: Option<String>,

    /// Number of trailing path segments to strip from the absolute watch path.
    pub scan_lower: Option<usize>,

    /// Paths skipped during scanning. Matched exactly, not as globs.
    pub exclude: Option<Vec<String>>,

    /// Extension of source files that trigger a rebuild, with or without a dot.
    pub extension: Option<String>,

    /// Delay between two scans when nothing changed.
    pub interval_ms: Option<u64>,

    /// Use OS filesystem events to wake the scanner early.
    pub fs_events: Option<bool>,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSection {
    pub binary: Option<String>,

    #[serde(default)]
    pub godep: bool,
}

/// `[run]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunSection {
    pub args: Option<Vec<String>>,

    /// Start the application right after every successful build instead of
    /// waiting for the first proxied connection.
    #[serde(default)]
    pub immediate: bool,

    pub output: Option<OutputSink>,
}

/// `[proxy]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxySection {
    pub port: Option<u16>,
    pub app_port: Option<u16>,
}

/// `[notify]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifySection {
    #[serde(default)]
    pub enabled: bool,
}
