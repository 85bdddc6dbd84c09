// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod notifier;
pub mod proxy;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::build::{binary_file_name, Builder, GoBuilder};
use crate::cli::{CliArgs, Command};
use crate::config::{load_dotenv, load_optional, validate_settings, Settings};
use crate::engine::{Orchestrator, RebuildCoordinator, ShutdownHandler};
use crate::exec::{ProcessRunner, Runner};
use crate::notifier::{DesktopNotifier, NoopNotifier, Notifier};
use crate::proxy::{Proxy, ProxyConfig};
use crate::watch::{spawn_wake_watcher, Scanner};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (CLI flags + optional `devloop.toml`)
/// - builder, runner and notifier
/// - the proxy (started in the background)
/// - the signal handler
/// - the scan / rebuild loop, which never returns under normal operation
pub async fn run(args: CliArgs) -> Result<()> {
    let wd = std::env::current_dir().context("determining working directory")?;

    match args.command.unwrap_or(Command::Run) {
        Command::Env => print_env(&wd),
        Command::Run => run_loop(&args, wd).await,
    }
}

async fn run_loop(args: &CliArgs, wd: PathBuf) -> Result<()> {
    let file = load_optional(args.config.as_deref().map(Path::new), &wd)?;
    let settings = Settings::resolve(args, file.as_ref());
    validate_settings(&settings)?;

    let mut envs: Vec<(String, String)> = load_dotenv(&wd)?.into_iter().collect();
    envs.push(("PORT".to_string(), settings.app_port.to_string()));

    let artifact = wd.join(binary_file_name(&settings.binary));
    let builder = GoBuilder::new(&settings.watch.root, &artifact, settings.use_godep);

    let runner = ProcessRunner::new(builder.binary(), settings.run_args.clone(), envs);
    runner.set_output_sink(settings.output);
    let runner: Arc<dyn Runner> = Arc::new(runner);

    let notifier: Arc<dyn Notifier> = if settings.notifications {
        Arc::new(DesktopNotifier::default())
    } else {
        Arc::new(NoopNotifier)
    };

    let coordinator = RebuildCoordinator::new(
        Box::new(builder),
        Arc::clone(&runner),
        notifier,
        settings.run_policy,
        project_name(&wd),
    );

    let proxy = Proxy::bind(
        ProxyConfig::new(settings.proxy_port, settings.app_port),
        Arc::clone(&runner),
        coordinator.subscribe(),
    )
    .await?;
    info!("listening on port {}", settings.proxy_port);
    let _proxy_task = proxy.spawn();

    let _shutdown = ShutdownHandler::arm(Arc::clone(&runner));

    let scanner = Scanner::new(&settings.watch);
    let wake = if settings.fs_events {
        match spawn_wake_watcher(scanner.root()) {
            Ok(wake) => Some(wake),
            Err(e) => {
                warn!(error = %e, "filesystem events unavailable; polling only");
                None
            }
        }
    } else {
        None
    };

    Orchestrator::new(scanner, coordinator, settings.scan_interval)
        .with_wake(wake)
        .run()
        .await
}

/// `devloop env`: print the variables from `.env`.
fn print_env(wd: &Path) -> Result<()> {
    for (key, value) in load_dotenv(wd)? {
        println!("{key}: {value}");
    }
    Ok(())
}

/// Last segment of the working directory, shown in rebuild messages.
fn project_name(wd: &Path) -> String {
    wd.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
