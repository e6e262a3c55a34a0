use clap::Parser;
use gtdkit::cli::commands::Cli;
use gtdkit::cli::handlers;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr, filtered by GTD_LOG (default: warn)
fn init_logging() {
    let filter = EnvFilter::try_from_env("GTD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
