// src/config/settings.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::engine::RunPolicy;
use crate::exec::OutputSink;
use crate::watch::WatchConfig;

const DEFAULT_PROXY_PORT: u16 = 3000;
const DEFAULT_APP_PORT: u16 = 3001;
const DEFAULT_BINARY: &str = "devloop-bin";
const DEFAULT_WATCH_PATH: &str = ".";
const DEFAULT_EXTENSION: &str = "go";
const DEFAULT_SCAN_INTERVAL_MS: u64 = 500;

/// Fully resolved settings for one `devloop run`.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub watch: WatchConfig,
    pub scan_interval: Duration,
    pub fs_events: bool,

    pub binary: String,
    pub use_godep: bool,

    pub run_args: Vec<String>,
    pub run_policy: RunPolicy,
    pub output: OutputSink,

    pub proxy_port: u16,
    pub app_port: u16,

    pub notifications: bool,
}

impl Settings {
    /// Merge CLI flags with an optional config file.
    ///
    /// Value flags given on the command line win over the file, which wins
    /// over the built-in defaults. Boolean switches are enabled if either
    /// side enables them.
    pub fn resolve(args: &CliArgs, file: Option<&ConfigFile>) -> Self {
        let file = file.cloned().unwrap_or_default();

        let path = args
            .path
            .clone()
            .or(file.watch.path)
            .unwrap_or_else(|| DEFAULT_WATCH_PATH.to_string());

        let exclude = match &args.exclude {
            Some(list) => split_list(list),
            None => file.watch.exclude.unwrap_or_default(),
        };

        let extension = args
            .ext
            .clone()
            .or(file.watch.extension)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let watch = WatchConfig {
            root: PathBuf::from(path),
            scan_lower: args.scan_lower.or(file.watch.scan_lower).unwrap_or(0),
            exclude,
            extension,
        };

        let run_args = match &args.run_args {
            Some(list) => split_list(list),
            None => file.run.args.unwrap_or_default(),
        };

        let run_policy = if args.immediate || file.run.immediate {
            RunPolicy::Immediate
        } else {
            RunPolicy::OnDemand
        };

        Self {
            watch,
            scan_interval: Duration::from_millis(
                file.watch.interval_ms.unwrap_or(DEFAULT_SCAN_INTERVAL_MS),
            ),
            fs_events: !args.poll_only && file.watch.fs_events.unwrap_or(true),
            binary: args
                .bin
                .clone()
                .or(file.build.binary)
                .unwrap_or_else(|| DEFAULT_BINARY.to_string()),
            use_godep: args.godep || file.build.godep,
            run_args,
            run_policy,
            output: file.run.output.unwrap_or_default(),
            proxy_port: args.port.or(file.proxy.port).unwrap_or(DEFAULT_PROXY_PORT),
            app_port: args
                .app_port
                .or(file.proxy.app_port)
                .unwrap_or(DEFAULT_APP_PORT),
            notifications: args.notify || file.notify.enabled,
        }
    }
}

/// Split a comma separated CLI list, dropping blank items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
