use super::model::{Routine, RoutineListPage, Table, TableListEntry, TableListPage};
use super::rest::{RestClient, TokenSource};
use crate::error::Result;
use crate::export::TableRows;
use crate::resource::{ExternalTableInfo, RoutineInfo, TableInfo, ViewInfo};
use async_trait::async_trait;
use gcp_bigquery_client::auth::Authenticator;
use gcp_bigquery_client::client_builder::ClientBuilder;
use gcp_bigquery_client::error::BQError;
use gcp_bigquery_client::tabledata::ListQueryParameters;
use gcp_bigquery_client::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const BIGQUERY_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const TYPE_VIEW: &str = "VIEW";
const TYPE_TABLE: &str = "TABLE";
const TYPE_EXTERNAL: &str = "EXTERNAL";

/// Re-reads a client model through its REST JSON form so only the fields we
/// declare in `model` matter.
fn reshape<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U> {
    Ok(serde_json::from_value(serde_json::to_value(value)?)?)
}

/// Hands the REST client's cached bearer token to the typed client so both
/// share one credential.
#[derive(Clone)]
struct SharedToken(RestClient);

#[async_trait]
impl Authenticator for SharedToken {
    async fn access_token(&self) -> std::result::Result<String, BQError> {
        match self.0.bearer().await {
            Ok(token) => Ok(token.to_string()),
            Err(e) => {
                debug!("no BigQuery access token: {}", e);
                Err(BQError::NoToken)
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Cell {
    v: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Row {
    #[serde(default)]
    f: Option<Vec<Cell>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowPage {
    #[serde(default)]
    rows: Option<Vec<Row>>,
    page_token: Option<String>,
}

fn cell_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Read-only access to one project's datasets. Table listings and row pages
/// go through the typed client; table and routine resources are read as raw
/// JSON because the typed models drop constraints and logical byte counts
/// and reject non-SQL routine languages.
pub struct BqClient {
    client: Client,
    rest: RestClient,
    project_id: String,
}

impl BqClient {
    pub async fn new(project_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(project_id, BIGQUERY_URL, TokenSource::from_env()).await
    }

    pub async fn with_base_url(
        project_id: impl Into<String>,
        base_url: &str,
        tokens: TokenSource,
    ) -> Result<Self> {
        let rest = RestClient::new(base_url, tokens);
        let mut builder = ClientBuilder::new();
        builder.with_v2_base_url(rest.base_url().to_string());
        let client = builder
            .build_from_authenticator(Arc::new(SharedToken(rest.clone())))
            .await?;
        Ok(Self {
            client,
            rest,
            project_id: project_id.into(),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn list_entries(&self, dataset: &str) -> Result<Vec<TableListEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut options = gcp_bigquery_client::table::ListOptions::default();
            if let Some(token) = page_token.take() {
                options = options.page_token(token);
            }
            let list = self
                .client
                .table()
                .list(&self.project_id, dataset, options)
                .await?;
            let page: TableListPage = reshape(&list)?;
            entries.extend(page.tables.unwrap_or_default());

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(entries)
    }

    /// Full table resources of the given type, in listing order.
    async fn tables_of_type(&self, dataset: &str, table_type: &str) -> Result<Vec<Table>> {
        let mut tables = Vec::new();
        for entry in self.list_entries(dataset).await? {
            if entry.table_type.as_deref() != Some(table_type) {
                continue;
            }
            tables.push(
                self.get_table(&self.project_id, dataset, &entry.table_reference.table_id)
                    .await?,
            );
        }
        debug!(
            "{}.{}: {} {} resource(s)",
            self.project_id,
            dataset,
            tables.len(),
            table_type
        );
        Ok(tables)
    }

    async fn get_table(&self, project: &str, dataset: &str, table_id: &str) -> Result<Table> {
        let path = format!("projects/{}/datasets/{}/tables/{}", project, dataset, table_id);
        self.rest.get_json(&path, &[]).await
    }

    pub async fn list_views(&self, dataset: &str) -> Result<Vec<ViewInfo>> {
        Ok(self
            .tables_of_type(dataset, TYPE_VIEW)
            .await?
            .into_iter()
            .map(Table::into_view)
            .collect())
    }

    pub async fn list_tables(&self, dataset: &str) -> Result<Vec<TableInfo>> {
        Ok(self
            .tables_of_type(dataset, TYPE_TABLE)
            .await?
            .into_iter()
            .map(Table::into_table)
            .collect())
    }

    pub async fn list_external_tables(&self, dataset: &str) -> Result<Vec<ExternalTableInfo>> {
        Ok(self
            .tables_of_type(dataset, TYPE_EXTERNAL)
            .await?
            .into_iter()
            .map(Table::into_external)
            .collect())
    }

    pub async fn list_routines(&self, dataset: &str) -> Result<Vec<RoutineInfo>> {
        let base = format!("projects/{}/datasets/{}/routines", self.project_id, dataset);
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: RoutineListPage = match page_token.take() {
                Some(token) => {
                    self.rest
                        .get_json(&base, &[("pageToken", token.as_str())])
                        .await?
                }
                None => self.rest.get_json(&base, &[]).await?,
            };
            ids.extend(
                page.routines
                    .unwrap_or_default()
                    .into_iter()
                    .map(|r| r.routine_reference.routine_id),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        // Listing omits the definition body, so fetch each routine.
        let mut routines = Vec::with_capacity(ids.len());
        for id in ids {
            let routine: Routine = self
                .rest
                .get_json(&format!("{}/{}", base, id), &[])
                .await?;
            routines.push(routine.into_routine());
        }
        Ok(routines)
    }

    /// Every row of `project.dataset.table`, cells rendered as text.
    pub async fn read_rows(&self, project: &str, dataset: &str, table: &str) -> Result<TableRows> {
        let meta = self.get_table(project, dataset, table).await?;
        let columns: Vec<String> = meta
            .schema
            .and_then(|s| s.fields)
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.name)
            .collect();

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let options = ListQueryParameters {
                start_index: None,
                max_results: None,
                page_token: page_token.take(),
                selected_fields: None,
                format_options: None,
            };
            let response = self
                .client
                .tabledata()
                .list(project, dataset, table, options)
                .await?;
            let page: RowPage = reshape(&response)?;

            for row in page.rows.unwrap_or_default() {
                let mut cells: Vec<Option<String>> = row
                    .f
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| cell_text(c.v))
                    .collect();
                cells.resize(columns.len(), None);
                rows.push(cells);
            }

            match page.page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("read {} row(s) from {}.{}.{}", rows.len(), project, dataset, table);
        Ok(TableRows { columns, rows })
    }
}
