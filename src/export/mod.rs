mod csv_writer;
mod format;
mod parquet_writer;
mod path;

pub use csv_writer::{render_csv, write_csv};
pub use format::ExportFormat;
pub use parquet_writer::write_parquet;
pub use path::TablePath;

use crate::client::BqClient;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// A table's rows with every cell as text; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[async_trait]
pub trait RowReader: Send + Sync {
    async fn read_rows(&self, table: &TablePath) -> Result<TableRows>;
}

#[async_trait]
impl RowReader for BqClient {
    async fn read_rows(&self, table: &TablePath) -> Result<TableRows> {
        BqClient::read_rows(self, &table.project, &table.dataset, &table.table).await
    }
}

/// Downloads `table` into `<output_dir>/<table>.<ext>` and returns the path.
pub async fn fetch_table_to_file(
    reader: &dyn RowReader,
    table: &TablePath,
    format: ExportFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    let rows = reader.read_rows(table).await?;
    std::fs::create_dir_all(output_dir)?;
    let dest = output_dir.join(format!("{}.{}", table.table, format.extension()));

    match format {
        ExportFormat::Csv => write_csv(&rows, &dest)?,
        ExportFormat::Parquet => write_parquet(&rows, &dest)?,
    }

    info!(
        "Wrote {} row(s) from {} to {}",
        rows.rows.len(),
        table,
        dest.display()
    );
    Ok(dest)
}
