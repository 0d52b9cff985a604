use std::io::Write as _;

use tabwriter::TabWriter;
use tinybird::QueryParams;

use crate::cli::{Cli, KeyValue, Output, color::*, print_json, table::print_rows};

#[derive(Debug, clap::Args)]
pub(crate) struct PipeArgs {
    #[command(subcommand)]
    pub command: PipeCommand,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum PipeCommand {
    /// List all pipes
    #[clap(alias = "list")]
    Ls,
    /// Get detailed information about a pipe
    Get(PipeGetArgs),
    /// Fetch data from a pipe endpoint
    #[command(after_long_help = CliExamples("
  # Fetch a pipe's data with a parameter
  tinybird pipe data top_pages --arg year=2024

  # Fetch all columns without truncation, as JSON
  tinybird -O json pipe data top_pages
"))]
    Data(PipeDataArgs),
}

#[derive(Debug, clap::Args)]
pub(crate) struct PipeGetArgs {
    /// Pipe name
    pub pipe_name: String,
}

#[derive(Debug, clap::Args)]
pub(crate) struct PipeDataArgs {
    /// Pipe name
    pub pipe_name: String,
    /// Pipe parameters. Format: key=value
    #[arg(short, long, action = clap::ArgAction::Append)]
    pub arg: Vec<KeyValue>,
    /// Do not truncate output
    #[arg(long)]
    pub no_trunc: bool,
}

pub(crate) async fn handle(cli: &Cli<'_>, args: PipeArgs) -> anyhow::Result<()> {
    match args.command {
        PipeCommand::Ls => list_pipes(cli).await,
        PipeCommand::Get(args) => get_pipe(cli, args).await,
        PipeCommand::Data(args) => get_pipe_data(cli, args).await,
    }
}

async fn list_pipes(cli: &Cli<'_>) -> anyhow::Result<()> {
    let pipes = cli.client.list_pipes().await?;

    if cli.output == Output::Json {
        return print_json(cli.output, &pipes);
    }

    let mut tw = TabWriter::new(anstream::stdout().lock()).ansi(true);
    writeln!(tw, "{HEADER}NAME\tTYPE\tID\tENDPOINT{HEADER:#}")?;
    for pipe in &pipes {
        writeln!(
            tw,
            "{GREEN}{}{GREEN:#}\t{}\t{}\t{}",
            pipe.name,
            pipe.r#type,
            pipe.id,
            pipe.endpoint.as_deref().unwrap_or("-"),
        )?;
    }

    tw.flush()?;
    if pipes.is_empty() {
        eprintln!("No pipes found.");
    }

    Ok(())
}

async fn get_pipe(cli: &Cli<'_>, args: PipeGetArgs) -> anyhow::Result<()> {
    let pipe = cli.client.get_pipe(&args.pipe_name).await?;
    print_json(cli.output, &pipe)
}

async fn get_pipe_data(cli: &Cli<'_>, args: PipeDataArgs) -> anyhow::Result<()> {
    let params: QueryParams = args.arg.into_iter().map(KeyValue::into_strings).collect();
    let data = cli.client.get_pipe_data(&args.pipe_name, params).await?;

    if cli.output == Output::Json {
        return print_json(cli.output, &data);
    }

    let mut stdout = anstream::stdout().lock();
    let truncated = print_rows(&mut stdout, &data.meta, &data.data, !args.no_trunc)?;

    anstream::eprintln!("\n{BLUE}{} rows{BLUE:#}", data.rows);
    if truncated {
        eprintln!("Note: some values were truncated. Use --no-trunc to see full values.");
    }

    Ok(())
}
