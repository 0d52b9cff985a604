mod color;
mod config;
mod datasource;
mod pipe;
mod query;
mod table;

use std::{io::Write as _, str::FromStr, time};

use anyhow::bail;
use clap::{Parser, Subcommand};
use tinybird::{ApiClient, Profile};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "tinybird",
    about = "Read data sources and pipes, and run SQL against a Tinybird workspace",
    version = env!("TB_VERSION"),
    propagate_version = true
)]
pub(crate) struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to format output.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Output {
    Json,
    #[default]
    Tty,
}

/// key=value string pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyValue(String, String);

impl KeyValue {
    fn into_strings(self) -> (String, String) {
        (self.0, self.1)
    }
}

impl FromStr for KeyValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((left, right)) = s.split_once('=') else {
            bail!("Invalid key=value pair: {}", s);
        };

        Ok(KeyValue(left.to_owned(), right.to_owned()))
    }
}

#[derive(Debug, clap::Args)]
#[command(next_help_heading = "Global Options")]
pub(crate) struct GlobalArgs {
    /// Name of the profile to use
    #[arg(long, short = 'P', global = true)]
    pub profile: Option<String>,
    /// Output format
    #[arg(long, short = 'O', global = true)]
    pub output: Option<Output>,
    /// Timeout (in seconds) for every request (-1 = default of 30s)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub client_timeout: Option<i64>,
    /// Print verbose logs
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print version.
    Version,
    /// Inspect data sources
    #[command(alias = "ds")]
    Datasource(datasource::DatasourceArgs),
    /// Inspect pipes and fetch their data
    Pipe(pipe::PipeArgs),
    /// Run an SQL SELECT query
    Query(query::QueryArgs),
    /// Show the resolved configuration
    Config(config::ConfigArgs),
}

/// Per-invocation state handed to every command.
pub(crate) struct Cli<'a> {
    pub(crate) client: &'a ApiClient,
    pub(crate) output: Output,
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    // Some commands don't require a client.
    match args.command {
        Command::Version => {
            println!("tinybird {}", env!("TB_VERSION"));
            return Ok(());
        }
        Command::Config(config_args) => return config::handle(config_args, args.global),
        _ => (),
    }

    let profile = if let Some(name) = args.global.profile.as_deref() {
        Profile::from_env(name)
    } else {
        Profile::from_default_env()
    };

    let profile = profile?.with_ua_product("tinybird-cli");

    let timeout = match args.global.client_timeout {
        Some(-1) | None => None,
        Some(v) if v > 0 => Some(time::Duration::from_secs(v as _)),
        Some(v) => bail!("Invalid timeout value: {v}"),
    };

    debug!(?profile, command = ?args.command, "cli invocation");

    let client = ApiClient::from_profile(&profile, timeout)?;
    let output = args.global.output.unwrap_or_default();
    let command = args.command;

    with_rt(client.scoped(async move |client: &ApiClient| {
        let cli = Cli { client, output };
        match command {
            Command::Version | Command::Config(_) => unreachable!(),
            Command::Datasource(args) => datasource::handle(&cli, args).await,
            Command::Pipe(args) => pipe::handle(&cli, args).await,
            Command::Query(args) => query::handle(&cli, args).await,
        }
    }))?
}

fn with_rt<T, F: Future<Output = T>>(f: F) -> anyhow::Result<T> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let _guard = rt.enter();
    Ok(rt.block_on(f))
}

/// Writes a JSON value to stdout: pretty-printed for terminals, compact
/// otherwise.
pub(crate) fn print_json(output: Output, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match output {
        Output::Tty => serde_json::to_writer_pretty(&mut stdout, value)?,
        Output::Json => serde_json::to_writer(&mut stdout, value)?,
    }

    writeln!(stdout)?;
    Ok(())
}
