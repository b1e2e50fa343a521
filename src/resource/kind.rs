use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    View,
    Routine,
    Table,
    ExternalTable,
    ScheduledQuery,
    SavedQuery,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::View,
        ResourceKind::Routine,
        ResourceKind::Table,
        ResourceKind::ExternalTable,
        ResourceKind::ScheduledQuery,
        ResourceKind::SavedQuery,
    ];

    /// Directory holding the primary file of this kind, relative to the
    /// dataset directory (or the project root for project-level kinds).
    pub fn dir_name(&self) -> &'static str {
        match self {
            ResourceKind::View => "views",
            ResourceKind::Routine => "routines",
            ResourceKind::Table | ResourceKind::ExternalTable => "models",
            ResourceKind::ScheduledQuery => "scheduled_queries",
            ResourceKind::SavedQuery => "saved_queries",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ResourceKind::Table | ResourceKind::ExternalTable => "yaml",
            _ => "sql",
        }
    }

    pub fn is_project_level(&self) -> bool {
        matches!(
            self,
            ResourceKind::ScheduledQuery | ResourceKind::SavedQuery
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::View => "view",
            ResourceKind::Routine => "routine",
            ResourceKind::Table => "model",
            ResourceKind::ExternalTable => "external",
            ResourceKind::ScheduledQuery => "scheduled query",
            ResourceKind::SavedQuery => "saved query",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(ResourceKind::View.dir_name(), "views");
        assert_eq!(ResourceKind::View.extension(), "sql");
        assert_eq!(ResourceKind::ExternalTable.dir_name(), "models");
        assert_eq!(ResourceKind::Table.extension(), "yaml");
        assert!(ResourceKind::SavedQuery.is_project_level());
        assert!(!ResourceKind::Routine.is_project_level());
    }
}
