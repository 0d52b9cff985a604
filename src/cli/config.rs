use std::io::Write;

use tabwriter::TabWriter;
use tinybird::Profile;

use crate::cli::{GlobalArgs, Output, color::*};

#[derive(Debug, clap::Args)]
pub(crate) struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum ConfigCommand {
    /// Get the current configuration
    Get(ConfigGetArgs),
}

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Show the active profile
  tinybird config get

  # Show a specific profile
  tinybird -P eu config get
"))]
pub(crate) struct ConfigGetArgs {}

pub(crate) fn handle(args: ConfigArgs, global: GlobalArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Get(args) => config_get(args, global),
    }
}

fn config_get(_args: ConfigGetArgs, global: GlobalArgs) -> anyhow::Result<()> {
    let profile = match global.profile {
        Some(name) => Profile::from_env(&name)?,
        None => Profile::from_default_env()?,
    };

    let mut out = anstream::stdout().lock();
    match global.output.unwrap_or_default() {
        Output::Tty => {
            let mut tw = TabWriter::new(&mut out).ansi(true);
            print_profile(&mut tw, &profile)?;
            tw.flush()?;
        }
        Output::Json => {
            serde_json::to_writer(&mut out, &profile)?;
            writeln!(&mut out)?;
        }
    }

    Ok(())
}

fn print_profile(out: &mut impl Write, profile: &Profile) -> anyhow::Result<()> {
    writeln!(out, "{HEADER}Profile {:?}{HEADER:#}", profile.name)?;
    writeln!(out, "{GREEN}API URL{GREEN:#}\t{}", profile.api_url)?;
    writeln!(out, "{GREEN}Token{GREEN:#}\t*********")?;
    writeln!(
        out,
        "{GREEN}Config file{GREEN:#}\t{}",
        profile.config_path.display()
    )?;

    Ok(())
}
