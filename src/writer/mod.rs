mod humanize;
mod model;
mod sql;

pub use humanize::humanize_bytes;
pub use model::{
    render_external_definition, render_model_yaml, render_routine_model_yaml,
    render_view_model_yaml, write_external_definition, write_model_yaml,
    write_routine_model_yaml, write_view_model_yaml,
};
pub use sql::{
    render_routine_sql, render_saved_query_sql, render_scheduled_query_sql, render_view_sql,
    write_routine_sql, write_saved_query_sql, write_scheduled_query_sql, write_view_sql,
};

use crate::error::Result;
use std::path::Path;

/// Writes `contents` to `path`, creating parent directories.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
