use clap::Parser;
use tally::cli::commands::Cli;
use tally::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    // Quiet by default; TALLY_LOG=debug for details. Logs go to stderr so
    // --json output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
