use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    std::process::exit(commands::run(cli));
}
