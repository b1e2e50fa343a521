use super::TableRows;
use crate::error::{BqSyncError, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Every column is written as nullable UTF-8, matching the text cells the
/// table data API returns.
pub fn write_parquet(rows: &TableRows, path: &Path) -> Result<()> {
    if rows.columns.is_empty() {
        return Err(BqSyncError::Export(
            "cannot write a parquet file without columns".to_string(),
        ));
    }

    let schema = Arc::new(Schema::new(
        rows.columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let arrays: Vec<ArrayRef> = (0..rows.columns.len())
        .map(|i| {
            let column: StringArray = rows
                .rows
                .iter()
                .map(|row| row.get(i).and_then(|c| c.as_deref()))
                .collect();
            Arc::new(column) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
