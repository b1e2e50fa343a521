use super::write_text;
use crate::error::Result;
use crate::resource::{RoutineInfo, SavedQueryInfo, ScheduledQueryInfo, ViewInfo};
use std::path::Path;

pub fn render_view_sql(view: &ViewInfo) -> String {
    format!("-- View: {}\n\n{}", view.name, view.sql)
}

pub fn render_routine_sql(routine: &RoutineInfo) -> String {
    format!(
        "-- Routine: {}\n-- Language: {}\n\n{}",
        routine.name, routine.language, routine.sql
    )
}

pub fn render_scheduled_query_sql(query: &ScheduledQueryInfo) -> String {
    format!(
        "-- Scheduled Query: {}\n-- Schedule: {}\n\n{}",
        query.name, query.schedule, query.sql
    )
}

pub fn render_saved_query_sql(query: &SavedQueryInfo) -> String {
    format!("-- Saved Query: {}\n\n{}", query.name, query.sql)
}

pub fn write_view_sql(path: &Path, view: &ViewInfo) -> Result<()> {
    write_text(path, &render_view_sql(view))
}

pub fn write_routine_sql(path: &Path, routine: &RoutineInfo) -> Result<()> {
    write_text(path, &render_routine_sql(routine))
}

pub fn write_scheduled_query_sql(path: &Path, query: &ScheduledQueryInfo) -> Result<()> {
    write_text(path, &render_scheduled_query_sql(query))
}

pub fn write_saved_query_sql(path: &Path, query: &SavedQueryInfo) -> Result<()> {
    write_text(path, &render_saved_query_sql(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn ts() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_view_sql_header_and_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("views").join("my_view.sql");
        write_view_sql(&path, &ViewInfo::new("my_view", "SELECT 1", ts())).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "-- View: my_view\n\nSELECT 1"
        );
    }

    #[test]
    fn test_routine_sql_has_language() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routines").join("fn.sql");
        let routine = RoutineInfo::new("fn", "RETURN 1;", "SQL", ts());
        write_routine_sql(&path, &routine).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("-- Routine: fn\n-- Language: SQL\n\n"));
        assert!(content.ends_with("RETURN 1;"));
    }

    #[test]
    fn test_scheduled_query_header() {
        let query = ScheduledQueryInfo {
            name: "daily_load".to_string(),
            sql: "INSERT ...".to_string(),
            schedule: "every 24 hours".to_string(),
            modified: ts(),
        };
        let content = render_scheduled_query_sql(&query);
        assert!(content.contains("-- Scheduled Query: daily_load"));
        assert!(content.contains("-- Schedule: every 24 hours"));
        assert!(content.ends_with("\n\nINSERT ..."));
    }

    #[test]
    fn test_saved_query_header() {
        let query = SavedQueryInfo {
            name: "q1".to_string(),
            sql: "SELECT 2".to_string(),
            modified: ts(),
        };
        assert_eq!(render_saved_query_sql(&query), "-- Saved Query: q1\n\nSELECT 2");
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routines").join("fn.sql");
        let routine = RoutineInfo::new("fn", "RETURN 1;", "JAVASCRIPT", ts());

        write_routine_sql(&path, &routine).unwrap();
        let first = std::fs::read(&path).unwrap();
        write_routine_sql(&path, &routine).unwrap();
        assert_eq!(first, std::fs::read(&path).unwrap());
    }
}
