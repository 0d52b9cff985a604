use std::fmt::Write as _;

use anstyle::{AnsiColor, Style};
use clap::builder::StyledStr;

pub(crate) const BOLD: Style = Style::new().bold();
pub(crate) const DIM: Style = Style::new().dimmed();
pub(crate) const GREEN: Style = AnsiColor::Green.on_default();
pub(crate) const BLUE: Style = AnsiColor::Blue.on_default();
pub(crate) const HEADER: Style = AnsiColor::White.on_default().bold();

const EXAMPLES_HEADER: Style = Style::new().bold().underline();

/// Help text listing example invocations. Lines starting with `#` are
/// rendered dimmed, as comments; other non-empty lines are commands.
pub(crate) struct CliExamples(pub &'static str);

impl From<CliExamples> for StyledStr {
    fn from(ex: CliExamples) -> Self {
        let mut s = StyledStr::new();
        let _ = write!(s, "{EXAMPLES_HEADER}Examples{EXAMPLES_HEADER:#}");

        for line in ex.0.trim_matches('\n').lines() {
            let style = match line.trim_start() {
                "" => {
                    let _ = writeln!(s);
                    continue;
                }
                l if l.starts_with('#') => DIM,
                _ => BOLD,
            };

            let _ = write!(s, "{style}\n{line}{style:#}");
        }

        s
    }
}
