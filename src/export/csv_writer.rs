//! RFC 4180 CSV output.

use super::TableRows;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn needs_quoting(value: &str) -> bool {
    value.contains([',', '"', '\r', '\n'])
}

fn escape(value: &str) -> String {
    if needs_quoting(value) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_record<'a, W: Write>(
    out: &mut W,
    fields: impl IntoIterator<Item = Option<&'a str>>,
) -> std::io::Result<()> {
    let line: Vec<String> = fields
        .into_iter()
        .map(|f| f.map(escape).unwrap_or_default())
        .collect();
    out.write_all(line.join(",").as_bytes())?;
    out.write_all(b"\r\n")
}

/// Header row then one record per row. NULL cells are empty.
pub fn render_csv<W: Write>(rows: &TableRows, out: &mut W) -> Result<()> {
    write_record(out, rows.columns.iter().map(|c| Some(c.as_str())))?;
    for row in &rows.rows {
        write_record(out, row.iter().map(|c| c.as_deref()))?;
    }
    Ok(())
}

pub fn write_csv(rows: &TableRows, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    render_csv(rows, &mut out)?;
    out.flush()?;
    Ok(())
}
