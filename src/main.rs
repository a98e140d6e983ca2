//! # `gitrip`
//!
//! Download a subset of files or directories from a git repository without
//! fetching its whole history or working tree.
//!
//! ## Usage
//!
//! ```sh
//! gitrip --remote https://github.com/user/repo --paths docs,README.md --tree main --dest ./out
//! ```
//!
//! Clones are cached under the user cache directory and reused by later
//! runs; pass `--ephemeral` to clone into a temporary directory instead.

use clap::Parser as _;
use gitrip::cli::Args;
use gitrip::config::Settings;
use gitrip::error::FetchError;
use gitrip::utils::{INTERRUPTED_EXIT_CODE, watch_interrupts};
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let resolved = Settings::resolve(&args);

    // The settings file may turn on verbose output too
    let verbose = resolved
        .as_ref()
        .map_or(args.verbose, |settings| settings.verbose);
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_target(false).with_env_filter(filter).init();

    let settings = match resolved {
        Ok(settings) => settings,
        Err(err) => exit_with(&err),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(on_interrupt, tokio::signal::ctrl_c).await {
            error!("Interrupted again, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    match gitrip::run(settings, cancel).await {
        Ok(_) => std::process::exit(0),
        Err(err) => exit_with(&err),
    }
}

fn exit_with(err: &anyhow::Error) -> ! {
    error!("{err:#}");
    std::process::exit(
        err.downcast_ref::<FetchError>()
            .map_or(1, FetchError::exit_code),
    );
}
