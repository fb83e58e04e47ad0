//! Rendering of result records

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use leakgraph_client::{render_value, Record};
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Selected fields, tab-separated, one row per line
    #[default]
    Plain,
    /// One JSON object per line
    Json,
    /// Pretty table with borders
    Table,
}

/// Write `records` to `out`. `columns` selects the fields for plain and
/// table output; JSON always carries the whole record.
pub fn write_records<W: Write>(
    out: &mut W,
    records: &[Record],
    columns: &[String],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            for record in records {
                let line = columns
                    .iter()
                    .map(|c| record.get(c).map(render_value).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("\t");
                writeln!(out, "{}", line)?;
            }
        }
        OutputFormat::Json => {
            for record in records {
                writeln!(out, "{}", serde_json::to_string(record)?)?;
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
            table.set_header(columns.iter().map(|c| Cell::new(c).fg(Color::Cyan)));
            for record in records {
                table.add_row(
                    columns
                        .iter()
                        .map(|c| Cell::new(record.get(c).map(render_value).unwrap_or_default())),
                );
            }
            writeln!(out, "{}", table)?;
            writeln!(out, "({} rows)", records.len())?;
        }
    }
    out.flush()?;
    Ok(())
}
