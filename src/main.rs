//! Kiln - secure environment variable management tool.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use kiln::cli::{self, runtime::Runtime, Cli};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "kiln=debug" } else { "kiln=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let runtime = Runtime::new(cli.config, cli.key, cli.verbose);

    if let Err(e) = cli::execute(cli.command, &runtime) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
