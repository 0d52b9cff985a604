use std::path::PathBuf;

use anyhow::bail;
use tinybird::pipe::PipeData;

use crate::cli::{Cli, Output, color::*, print_json, table::print_rows};

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Run a query inline
  tinybird query \"SELECT * FROM events LIMIT 10\"

  # Read the query from a file
  tinybird query --file report.sql
"))]
pub(crate) struct QueryArgs {
    /// Do not truncate output
    #[arg(long)]
    pub no_trunc: bool,
    /// Read query from file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// The SELECT statement, without a FORMAT clause
    pub sql: Option<String>,
}

pub(crate) async fn handle(cli: &Cli<'_>, args: QueryArgs) -> anyhow::Result<()> {
    let QueryArgs {
        no_trunc,
        file,
        sql,
    } = args;

    let sql = match (sql, file) {
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (Some(s), None) => s,
        _ => bail!("exactly one of either '--file' or inline SQL must be specified"),
    };

    let result = cli.client.run_select_query(sql.trim_end()).await?;
    if cli.output == Output::Json {
        return print_json(cli.output, &result);
    }

    // FORMAT JSON results share the shape of pipe data; anything else is
    // printed as-is.
    let Ok(data) = serde_json::from_value::<PipeData>(result.clone().into()) else {
        return print_json(cli.output, &result);
    };

    let mut stdout = anstream::stdout().lock();
    let truncated = print_rows(&mut stdout, &data.meta, &data.data, !no_trunc)?;

    if data.data.is_empty() {
        eprintln!("No results!");
    } else {
        anstream::eprintln!("\n{BLUE}{} rows{BLUE:#}", data.rows);
    }

    if truncated {
        eprintln!("Note: some values were truncated. Use --no-trunc to see full values.");
    }

    Ok(())
}
