mod cli;
mod commands;
mod progress;

use clap::Parser;
use srcpkg_core::engine::Engine;
use srcpkg_core::error::Error;
use srcpkg_core::repo::RecipeRepo;
use srcpkg_core::roots::{default_repo_root, Roots};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use progress::{SpinnerHandle, SpinnerLayer};

/// Installs the fmt subscriber plus the spinner layer and returns the
/// handle the CLI uses to drive the spinner around long-running
/// operations.
fn init_logging(verbose: u8) -> SpinnerHandle {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let (spinner_layer, spinner) = SpinnerLayer::new();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(spinner_layer)
        .init();
    spinner
}

fn main() {
    let cli = Cli::parse();
    let spinner = init_logging(cli.verbose);

    // An operator interrupt is a fatal signal to the driver; the handler
    // itself does no cleanup, leaving the build work tree exactly as it
    // was at the moment of interruption.
    ctrlc::set_handler(|| {
        eprintln!("interrupted");
        std::process::exit(130);
    })
    .expect("failed to install SIGINT handler");

    let roots = Roots::resolve(cli.root.clone(), None, None, None);
    let repo_root = cli.repo.clone().unwrap_or_else(default_repo_root);
    let repo = RecipeRepo::scan(&repo_root);

    let engine = match Engine::open(roots, repo, repo_root) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = commands::dispatch(&engine, cli.command, &spinner);
    std::process::exit(exit_code(result));
}

fn exit_code(result: srcpkg_core::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(Error::Interrupted) => 130,
        Err(Error::BuildScriptFailed { code, .. }) => code,
        Err(Error::PatchFailed { code, .. }) => code,
        Err(Error::ExternalCommandFailed { code, .. }) => code,
        Err(Error::NetworkError { code: Some(code), .. }) => code,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}
