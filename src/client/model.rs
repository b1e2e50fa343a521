//! Wire shapes of the REST resources we read. Only the fields the sync uses
//! are declared; everything is optional because BigQuery omits unset
//! fields.

use crate::resource::{
    ExternalTableInfo, RoutineArgument, RoutineInfo, SchemaField, TableInfo, ViewInfo,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// BigQuery encodes int64 as JSON strings; accept either form.
fn de_opt_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub(crate) fn from_millis(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::from_timestamp_millis)
}

fn modified_or_epoch(ms: Option<i64>) -> DateTime<Utc> {
    from_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableReference {
    #[serde(default)]
    pub table_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableListEntry {
    #[serde(default)]
    pub table_reference: TableReference,
    #[serde(rename = "type")]
    pub table_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableListPage {
    #[serde(default)]
    pub tables: Option<Vec<TableListEntry>>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldSchema {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    pub mode: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldSchema>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TableSchema {
    #[serde(default)]
    pub fields: Option<Vec<FieldSchema>>,
}

impl TableSchema {
    /// Flattens RECORD columns into dotted names, parents first.
    pub fn flatten(&self) -> Vec<SchemaField> {
        let mut out = Vec::new();
        if let Some(fields) = &self.fields {
            flatten_into(fields, "", &mut out);
        }
        out
    }
}

fn flatten_into(fields: &[FieldSchema], prefix: &str, out: &mut Vec<SchemaField>) {
    for field in fields {
        let name = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{}.{}", prefix, field.name)
        };
        out.push(SchemaField {
            name: name.clone(),
            field_type: field.field_type.clone(),
            mode: field.mode.clone().unwrap_or_else(|| "NULLABLE".to_string()),
            description: field.description.clone().unwrap_or_default(),
        });
        if let Some(children) = &field.fields {
            flatten_into(children, &name, out);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FieldRef {
    pub field: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Clustering {
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ViewDefinition {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExternalDataConfiguration {
    #[serde(default)]
    pub source_uris: Option<Vec<String>>,
    pub source_format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PrimaryKey {
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableConstraints {
    pub primary_key: Option<PrimaryKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Table {
    #[serde(default)]
    pub table_reference: TableReference,
    #[serde(rename = "type")]
    pub table_type: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub creation_time: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub last_modified_time: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub num_rows: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub num_total_logical_bytes: Option<i64>,
    #[serde(default)]
    pub schema: Option<TableSchema>,
    pub time_partitioning: Option<FieldRef>,
    pub range_partitioning: Option<FieldRef>,
    pub clustering: Option<Clustering>,
    pub view: Option<ViewDefinition>,
    pub external_data_configuration: Option<ExternalDataConfiguration>,
    pub table_constraints: Option<TableConstraints>,
}

impl Table {
    fn name(&self) -> String {
        self.table_reference.table_id.clone()
    }

    fn schema_fields(&self) -> Vec<SchemaField> {
        self.schema.as_ref().map(TableSchema::flatten).unwrap_or_default()
    }

    fn partitioning(&self) -> Option<String> {
        if let Some(time) = &self.time_partitioning {
            return Some(
                time.field
                    .clone()
                    .unwrap_or_else(|| "ingestion_time".to_string()),
            );
        }
        self.range_partitioning.as_ref().and_then(|r| r.field.clone())
    }

    fn clustering(&self) -> Vec<String> {
        self.clustering
            .as_ref()
            .and_then(|c| c.fields.clone())
            .unwrap_or_default()
    }

    fn primary_keys(&self) -> Vec<String> {
        self.table_constraints
            .as_ref()
            .and_then(|c| c.primary_key.as_ref())
            .and_then(|pk| pk.columns.clone())
            .unwrap_or_default()
    }

    fn row_count(&self) -> u64 {
        self.num_rows.unwrap_or(0).max(0) as u64
    }

    pub fn into_view(self) -> ViewInfo {
        ViewInfo {
            name: self.name(),
            sql: self.view.as_ref().map(|v| v.query.clone()).unwrap_or_default(),
            modified: modified_or_epoch(self.last_modified_time),
            description: self.description.clone().unwrap_or_default(),
            created: from_millis(self.creation_time),
            region: self.location.clone(),
            schema: self.schema_fields(),
        }
    }

    pub fn into_table(self) -> TableInfo {
        TableInfo {
            name: self.name(),
            schema: self.schema_fields(),
            description: self.description.clone().unwrap_or_default(),
            row_count: self.row_count(),
            modified: modified_or_epoch(self.last_modified_time),
            partitioning: self.partitioning(),
            clustering: self.clustering(),
            created: from_millis(self.creation_time),
            region: self.location.clone(),
            primary_keys: self.primary_keys(),
            total_logical_bytes: self.num_total_logical_bytes,
        }
    }

    pub fn into_external(self) -> ExternalTableInfo {
        let ext = self.external_data_configuration.clone().unwrap_or_default();
        ExternalTableInfo {
            name: self.name(),
            source_uris: ext.source_uris.unwrap_or_default(),
            schema: self.schema_fields(),
            source_format: ext.source_format.unwrap_or_default(),
            modified: modified_or_epoch(self.last_modified_time),
            description: self.description.clone().unwrap_or_default(),
            created: from_millis(self.creation_time),
            region: self.location.clone(),
            row_count: self.row_count(),
            partitioning: self.partitioning(),
            clustering: self.clustering(),
            primary_keys: self.primary_keys(),
            total_logical_bytes: self.num_total_logical_bytes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoutineReference {
    #[serde(default)]
    pub routine_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SqlDataType {
    pub type_kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Argument {
    #[serde(default)]
    pub name: String,
    pub argument_kind: Option<String>,
    pub mode: Option<String>,
    pub data_type: Option<SqlDataType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Routine {
    #[serde(default)]
    pub routine_reference: RoutineReference,
    pub language: Option<String>,
    #[serde(default)]
    pub definition_body: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub creation_time: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub last_modified_time: Option<i64>,
    #[serde(default)]
    pub arguments: Option<Vec<Argument>>,
    pub return_type: Option<SqlDataType>,
}

impl Routine {
    pub fn into_routine(self) -> RoutineInfo {
        let arguments = self
            .arguments
            .unwrap_or_default()
            .into_iter()
            .map(|arg| RoutineArgument {
                data_type: arg
                    .data_type
                    .and_then(|t| t.type_kind)
                    .or_else(|| arg.argument_kind.map(|k| k.replace('_', " ")))
                    .unwrap_or_default(),
                mode: arg.mode.unwrap_or_else(|| "IN".to_string()),
                name: arg.name,
            })
            .collect();

        RoutineInfo {
            name: self.routine_reference.routine_id,
            sql: self.definition_body.unwrap_or_default(),
            language: self.language.unwrap_or_else(|| "SQL".to_string()),
            modified: modified_or_epoch(self.last_modified_time),
            description: self.description.unwrap_or_default(),
            created: from_millis(self.creation_time),
            arguments,
            return_type: self.return_type.and_then(|t| t.type_kind),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoutineListPage {
    #[serde(default)]
    pub routines: Option<Vec<Routine>>,
    pub next_page_token: Option<String>,
}
