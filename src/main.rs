mod cli;

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => (),
        // A missing .env file is fine.
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => (),
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to load .env file")),
    }

    let args = cli::Args::parse();

    let default_filter = if args.global.verbose {
        "tinybird=debug"
    } else {
        "tinybird=info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    cli::run(args)
}
