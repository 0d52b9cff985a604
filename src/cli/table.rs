use std::io::Write;

use tabwriter::TabWriter;
use tinybird::{JsonObject, pipe::ColumnMeta};

use crate::cli::color::*;

const TRUNCATE_TO_COLUMN_WIDTH: usize = 32;

/// Print a result set as an aligned table. Returns true if any value was
/// truncated.
pub(crate) fn print_rows(
    out: &mut impl Write,
    meta: &[ColumnMeta],
    rows: &[JsonObject],
    truncate: bool,
) -> anyhow::Result<bool> {
    if meta.is_empty() {
        writeln!(out, "No columns to display.")?;
        return Ok(false);
    }

    let mut truncation_occurred = false;
    let mut tw = TabWriter::new(out).ansi(true);

    let headers: Vec<_> = meta
        .iter()
        .map(|col| format!("{HEADER}{}{HEADER:#}", col.name))
        .collect();
    writeln!(tw, "{}", headers.join("\t"))?;

    for row in rows {
        let cells: Vec<_> = meta
            .iter()
            .map(|col| {
                let value = format_value(row.get(&col.name));
                if truncate && value.chars().count() > TRUNCATE_TO_COLUMN_WIDTH {
                    truncation_occurred = true;
                    let head: String = value.chars().take(TRUNCATE_TO_COLUMN_WIDTH - 3).collect();
                    format!("{head}...")
                } else {
                    value
                }
            })
            .collect();

        writeln!(tw, "{}", cells.join("\t"))?;
    }

    tw.flush()?;
    Ok(truncation_occurred)
}

/// Render a JSON cell. Strings are printed without quotes, nulls as `(null)`.
fn format_value(value: Option<&serde_json::Value>) -> String {
    use serde_json::Value;

    match value {
        None | Some(Value::Null) => format!("{DIM}(null){DIM:#}"),
        Some(Value::String(s)) => s.replace(['\t', '\n'], " "),
        Some(v) => v.to_string(),
    }
}
