use std::io::Write as _;

use tabwriter::TabWriter;

use crate::cli::{Cli, Output, color::*, print_json};

#[derive(Debug, clap::Args)]
pub(crate) struct DatasourceArgs {
    #[command(subcommand)]
    pub command: DatasourceCommand,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum DatasourceCommand {
    /// List all data sources
    #[clap(alias = "list")]
    Ls,
    /// Get detailed information about a data source
    #[command(after_long_help = CliExamples("
  # Show a data source, including debug column information
  tinybird datasource get t_745a260d6ae94f5088a3fd5b34d31e2a
"))]
    Get(DatasourceGetArgs),
}

#[derive(Debug, clap::Args)]
pub(crate) struct DatasourceGetArgs {
    /// Data source ID or name
    pub datasource_id: String,
}

pub(crate) async fn handle(cli: &Cli<'_>, args: DatasourceArgs) -> anyhow::Result<()> {
    match args.command {
        DatasourceCommand::Ls => list_datasources(cli).await,
        DatasourceCommand::Get(args) => get_datasource(cli, args).await,
    }
}

async fn list_datasources(cli: &Cli<'_>) -> anyhow::Result<()> {
    let datasources = cli.client.list_data_sources().await?;

    if cli.output == Output::Json {
        return print_json(cli.output, &datasources);
    }

    let mut tw = TabWriter::new(anstream::stdout().lock()).ansi(true);
    writeln!(tw, "{HEADER}NAME\tID\tENGINE\tCOLUMNS\tQUARANTINE{HEADER:#}")?;
    for ds in &datasources {
        writeln!(
            tw,
            "{GREEN}{}{GREEN:#}\t{}\t{}\t{}\t{}",
            ds.name,
            ds.id,
            ds.engine.engine,
            ds.columns.len(),
            ds.quarantine_rows
        )?;
    }

    tw.flush()?;
    if datasources.is_empty() {
        eprintln!("No data sources found.");
    }

    Ok(())
}

async fn get_datasource(cli: &Cli<'_>, args: DatasourceGetArgs) -> anyhow::Result<()> {
    let datasource = cli.client.get_data_source(&args.datasource_id).await?;
    print_json(cli.output, &datasource)
}
