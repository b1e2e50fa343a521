use crate::error::{BqSyncError, Result};
use std::fmt;
use std::path::Path;

/// A fully qualified table reference given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePath {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TablePath {
    /// Accepts `<project>/<dataset>/<table>` or a path in the sync layout,
    /// `<project>/<dataset>/<category>/<table>[.ext]`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || BqSyncError::InvalidResourcePath(input.to_string());
        let segments: Vec<&str> = input.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        let (project, dataset, table) = match segments.as_slice() {
            [project, dataset, table] => (*project, *dataset, *table),
            [project, dataset, _category, file] => {
                let stem = Path::new(file)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|s| !s.starts_with('.'))
                    .ok_or_else(invalid)?;
                (*project, *dataset, stem)
            }
            _ => return Err(invalid()),
        };

        Ok(Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> (String, String, String) {
        let p = TablePath::parse(input).unwrap();
        (p.project, p.dataset, p.table)
    }

    #[test]
    fn test_three_segments() {
        assert_eq!(
            parsed("proj/ds/tbl"),
            ("proj".into(), "ds".into(), "tbl".into())
        );
    }

    #[test]
    fn test_local_layout_path() {
        assert_eq!(parsed("proj/ds/models/tbl").2, "tbl");
        assert_eq!(parsed("proj/ds/models/tbl.yaml").2, "tbl");
        assert_eq!(parsed("proj/ds/views/v.sql").2, "v");
    }

    #[test]
    fn test_rejects_other_segment_counts() {
        for input in [
            "tbl",
            "proj/tbl",
            "a/b/c/d/e",
            "proj//tbl",
            "",
            "proj/ds/models/.yaml",
            "proj/ds/models/.hidden",
        ] {
            let err = TablePath::parse(input).unwrap_err();
            assert!(
                matches!(err, BqSyncError::InvalidResourcePath(ref s) if s == input),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_display() {
        let p = TablePath::parse("proj/ds/tbl").unwrap();
        assert_eq!(p.to_string(), "proj.ds.tbl");
    }
}
