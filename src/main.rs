//! Main entry point for bwclient.

use bwclient::cli::Cli;
use bwclient::utils::error_exit;
use clap::Parser;

#[tokio::main]
async fn main() {
    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    init_tracing();

    let cli = Cli::parse();

    // Failures, including a rejected master password, end the process here
    // rather than inside the library.
    if let Err(e) = cli.execute().await {
        error_exit(&e.to_string(), 1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
