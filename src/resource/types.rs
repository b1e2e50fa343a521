use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: String,
    pub mode: String,
    pub description: String,
}

impl SchemaField {
    pub fn new(
        name: impl Into<String>,
        field_type: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            mode: mode.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineArgument {
    pub name: String,
    pub data_type: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewInfo {
    pub name: String,
    pub sql: String,
    pub modified: DateTime<Utc>,
    pub description: String,
    pub created: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub schema: Vec<SchemaField>,
}

impl ViewInfo {
    pub fn new(name: impl Into<String>, sql: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            modified,
            description: String::new(),
            created: None,
            region: None,
            schema: Vec::new(),
        }
    }
}

/// A user-defined function or stored procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineInfo {
    pub name: String,
    pub sql: String,
    pub language: String,
    pub modified: DateTime<Utc>,
    pub description: String,
    pub created: Option<DateTime<Utc>>,
    pub arguments: Vec<RoutineArgument>,
    pub return_type: Option<String>,
}

impl RoutineInfo {
    pub fn new(
        name: impl Into<String>,
        sql: impl Into<String>,
        language: impl Into<String>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            language: language.into(),
            modified,
            description: String::new(),
            created: None,
            arguments: Vec::new(),
            return_type: None,
        }
    }
}

/// Metadata of a native table, exported as a model file.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub schema: Vec<SchemaField>,
    pub description: String,
    pub row_count: u64,
    pub modified: DateTime<Utc>,
    pub partitioning: Option<String>,
    pub clustering: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub primary_keys: Vec<String>,
    pub total_logical_bytes: Option<i64>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            schema: Vec::new(),
            description: String::new(),
            row_count: 0,
            modified,
            partitioning: None,
            clustering: Vec::new(),
            created: None,
            region: None,
            primary_keys: Vec::new(),
            total_logical_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTableInfo {
    pub name: String,
    pub source_uris: Vec<String>,
    pub schema: Vec<SchemaField>,
    pub source_format: String,
    pub modified: DateTime<Utc>,
    pub description: String,
    pub created: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub row_count: u64,
    pub partitioning: Option<String>,
    pub clustering: Vec<String>,
    pub primary_keys: Vec<String>,
    pub total_logical_bytes: Option<i64>,
}

impl ExternalTableInfo {
    pub fn new(
        name: impl Into<String>,
        source_format: impl Into<String>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            source_uris: Vec::new(),
            schema: Vec::new(),
            source_format: source_format.into(),
            modified,
            description: String::new(),
            created: None,
            region: None,
            row_count: 0,
            partitioning: None,
            clustering: Vec::new(),
            primary_keys: Vec::new(),
            total_logical_bytes: None,
        }
    }
}

/// A Data Transfer config whose data source is `scheduled_query`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledQueryInfo {
    pub name: String,
    pub sql: String,
    pub schedule: String,
    pub modified: DateTime<Utc>,
}

/// A BigQuery Studio saved query, stored as a `.sql` file in a Dataform
/// workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedQueryInfo {
    pub name: String,
    pub sql: String,
    pub modified: DateTime<Utc>,
}
