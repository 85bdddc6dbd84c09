// src/main.rs

use std::process::ExitCode;

use devloop::{cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("devloop error: {err:?}");
        return ExitCode::FAILURE;
    }

    // The rebuild loop never returns Ok; signals exit from the shutdown handler.
    match devloop::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("devloop error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
