//! Model files: flat, line-oriented, YAML-like text describing tables, views,
//! routines and external tables. Written for review and diffing; nothing
//! reads them back.

use super::humanize::humanize_bytes;
use super::write_text;
use crate::error::Result;
use crate::resource::{ExternalTableInfo, RoutineInfo, SchemaField, TableInfo, ViewInfo};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

fn quoted(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

struct ModelLines(Vec<String>);

impl ModelLines {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn line(&mut self, key: &str, value: impl AsRef<str>) -> &mut Self {
        self.0.push(format!("{}: {}", key, value.as_ref()));
        self
    }

    fn opt(&mut self, key: &str, value: Option<impl AsRef<str>>) -> &mut Self {
        if let Some(value) = value {
            self.line(key, value);
        }
        self
    }

    fn list(&mut self, key: &str, items: &[String]) -> &mut Self {
        if !items.is_empty() {
            self.line(key, bracketed(items));
        }
        self
    }

    fn bytes(&mut self, total: Option<i64>) -> &mut Self {
        if total.is_some() {
            self.line("total_logical_bytes", humanize_bytes(total));
        }
        self
    }

    fn schema(&mut self, schema: &[SchemaField]) -> &mut Self {
        self.0.push("schema:".to_string());
        for field in schema {
            self.0.push(format!(
                "  - name: {}  type: {}  mode: {}  description: {}",
                field.name,
                field.field_type,
                field.mode,
                quoted(&field.description)
            ));
        }
        self
    }

    fn finish(&mut self) -> String {
        let mut out = self.0.join("\n");
        out.push('\n');
        out
    }
}

pub fn render_model_yaml(table: &TableInfo) -> String {
    ModelLines::new()
        .line("name", &table.name)
        .line("description", quoted(&table.description))
        .line("row_count", table.row_count.to_string())
        .opt("created", table.created.as_ref().map(timestamp))
        .line("modified", timestamp(&table.modified))
        .opt("region", table.region.as_deref())
        .opt("partitioning", table.partitioning.as_deref())
        .list("clustering", &table.clustering)
        .list("primary_keys", &table.primary_keys)
        .bytes(table.total_logical_bytes)
        .schema(&table.schema)
        .finish()
}

pub fn render_view_model_yaml(view: &ViewInfo) -> String {
    ModelLines::new()
        .line("name", &view.name)
        .line("description", quoted(&view.description))
        .line("type", "VIEW")
        .opt("created", view.created.as_ref().map(timestamp))
        .line("modified", timestamp(&view.modified))
        .opt("region", view.region.as_deref())
        .schema(&view.schema)
        .finish()
}

pub fn render_routine_model_yaml(routine: &RoutineInfo) -> String {
    let mut lines = ModelLines::new();
    lines
        .line("name", &routine.name)
        .line("description", quoted(&routine.description))
        .line("language", &routine.language)
        .opt("created", routine.created.as_ref().map(timestamp))
        .line("modified", timestamp(&routine.modified))
        .opt("return_type", routine.return_type.as_deref());

    if !routine.arguments.is_empty() {
        lines.0.push("arguments:".to_string());
        for arg in &routine.arguments {
            lines.0.push(format!(
                "  - name: {}  type: {}  mode: {}",
                arg.name, arg.data_type, arg.mode
            ));
        }
    }
    lines.finish()
}

pub fn render_external_definition(ext: &ExternalTableInfo) -> String {
    let mut lines = ModelLines::new();
    lines
        .line("name", &ext.name)
        .line("description", quoted(&ext.description))
        .line("source_format", &ext.source_format);

    lines.0.push("source_uris:".to_string());
    for uri in &ext.source_uris {
        lines.0.push(format!("  - {}", uri));
    }

    lines
        .opt("created", ext.created.as_ref().map(timestamp))
        .line("modified", timestamp(&ext.modified))
        .opt("region", ext.region.as_deref())
        .line("row_count", ext.row_count.to_string())
        .opt("partitioning", ext.partitioning.as_deref())
        .list("clustering", &ext.clustering)
        .list("primary_keys", &ext.primary_keys)
        .bytes(ext.total_logical_bytes)
        .schema(&ext.schema)
        .finish()
}

pub fn write_model_yaml(path: &Path, table: &TableInfo) -> Result<()> {
    write_text(path, &render_model_yaml(table))
}

pub fn write_view_model_yaml(path: &Path, view: &ViewInfo) -> Result<()> {
    write_text(path, &render_view_model_yaml(view))
}

pub fn write_routine_model_yaml(path: &Path, routine: &RoutineInfo) -> Result<()> {
    write_text(path, &render_routine_model_yaml(routine))
}

pub fn write_external_definition(path: &Path, ext: &ExternalTableInfo) -> Result<()> {
    write_text(path, &render_external_definition(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::RoutineArgument;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn ts_created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn events_table() -> TableInfo {
        TableInfo {
            schema: vec![
                SchemaField::new("id", "INTEGER", "REQUIRED").with_description("Event ID"),
                SchemaField::new("ts", "TIMESTAMP", "NULLABLE"),
            ],
            description: "Event log".to_string(),
            row_count: 1000,
            partitioning: Some("ts".to_string()),
            clustering: vec!["id".to_string()],
            created: Some(ts_created()),
            region: Some("US".to_string()),
            primary_keys: vec!["id".to_string()],
            total_logical_bytes: Some(5 * 1024_i64.pow(3)),
            ..TableInfo::new("events", ts())
        }
    }

    #[test]
    fn test_table_model_exact_output() {
        let expected = "\
name: events
description: \"Event log\"
row_count: 1000
created: 2024-06-15T12:00:00+00:00
modified: 2025-01-01T00:00:00+00:00
region: US
partitioning: ts
clustering: [id]
primary_keys: [id]
total_logical_bytes: 5.0 GiB
schema:
  - name: id  type: INTEGER  mode: REQUIRED  description: \"Event ID\"
  - name: ts  type: TIMESTAMP  mode: NULLABLE  description: \"\"
";
        assert_eq!(render_model_yaml(&events_table()), expected);
    }

    #[test]
    fn test_table_model_omits_unknown_metadata() {
        let content = render_model_yaml(&TableInfo::new("bare", ts()));
        assert!(!content.contains("created:"));
        assert!(!content.contains("region:"));
        assert!(!content.contains("clustering:"));
        assert!(!content.contains("total_logical_bytes:"));
        assert!(content.ends_with("schema:\n"));
    }

    #[test]
    fn test_description_is_json_quoted() {
        let table = TableInfo {
            description: "say \"hi\"\nbye".to_string(),
            ..TableInfo::new("t", ts())
        };
        let content = render_model_yaml(&table);
        assert!(content.contains(r#"description: "say \"hi\"\nbye""#));
    }

    #[test]
    fn test_view_model() {
        let view = ViewInfo {
            schema: vec![SchemaField::new("id", "INTEGER", "REQUIRED").with_description("User ID")],
            description: "Active users view".to_string(),
            created: Some(ts_created()),
            region: Some("us-east1".to_string()),
            ..ViewInfo::new("active_users", "SELECT id FROM users", ts())
        };
        let content = render_view_model_yaml(&view);
        assert!(content.contains("name: active_users\n"));
        assert!(content.contains("type: VIEW\n"));
        assert!(content.contains("description: \"Active users view\"\n"));
        assert!(content.contains("created: 2024-06-15"));
        assert!(content.contains("modified: 2025-01-01"));
        assert!(content.contains("region: us-east1\n"));
        assert!(content.contains("description: \"User ID\""));
    }

    #[test]
    fn test_routine_model() {
        let routine = RoutineInfo {
            description: "Adds two numbers".to_string(),
            created: Some(ts_created()),
            arguments: vec![
                RoutineArgument {
                    name: "x".to_string(),
                    data_type: "INT64".to_string(),
                    mode: "IN".to_string(),
                },
                RoutineArgument {
                    name: "y".to_string(),
                    data_type: "INT64".to_string(),
                    mode: "IN".to_string(),
                },
            ],
            return_type: Some("INT64".to_string()),
            ..RoutineInfo::new("add_numbers", "RETURN x + y;", "SQL", ts())
        };
        let content = render_routine_model_yaml(&routine);
        assert!(content.contains("language: SQL\n"));
        assert!(content.contains("return_type: INT64\n"));
        assert!(content.contains("arguments:\n  - name: x  type: INT64  mode: IN\n"));
        assert!(content.contains("  - name: y  type: INT64  mode: IN\n"));
        assert!(!content.contains("schema:"));
    }

    #[test]
    fn test_external_definition() {
        let ext = ExternalTableInfo {
            source_uris: vec!["gs://bucket/file.csv".to_string()],
            schema: vec![SchemaField::new("col", "STRING", "NULLABLE").with_description("A column")],
            description: "External feed".to_string(),
            created: Some(ts_created()),
            region: Some("EU".to_string()),
            total_logical_bytes: Some(2048),
            row_count: 50,
            ..ExternalTableInfo::new("ext_table", "CSV", ts())
        };
        let content = render_external_definition(&ext);
        assert!(content.contains("source_format: CSV\n"));
        assert!(content.contains("source_uris:\n  - gs://bucket/file.csv\n"));
        assert!(content.contains("region: EU\n"));
        assert!(content.contains("row_count: 50\n"));
        assert!(content.contains("total_logical_bytes: 2.0 KiB\n"));
        assert!(content.contains("description: \"A column\""));
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("events.yaml");
        write_model_yaml(&path, &events_table()).unwrap();
        let first = std::fs::read(&path).unwrap();
        write_model_yaml(&path, &events_table()).unwrap();
        assert_eq!(first, std::fs::read(&path).unwrap());
    }
}
