use super::bigquery::BqClient;
use super::dataform::DataformClient;
use super::rest::TokenSource;
use super::source::ResourceSource;
use super::transfer::TransferClient;
use crate::error::Result;
use crate::resource::{
    ExternalTableInfo, RoutineInfo, SavedQueryInfo, ScheduledQueryInfo, TableInfo, ViewInfo,
};
use async_trait::async_trait;
use tracing::warn;

/// The live source: BigQuery for dataset resources, Data Transfer for
/// scheduled queries and Dataform for saved queries.
pub struct GcpSource {
    bigquery: BqClient,
    transfer: TransferClient,
    dataform: DataformClient,
    region: String,
}

impl GcpSource {
    pub async fn connect(project_id: &str, region: impl Into<String>) -> Result<Self> {
        let bigquery = BqClient::new(project_id).await?;
        let tokens = TokenSource::from_env();
        Ok(Self::from_parts(
            bigquery,
            TransferClient::new(tokens.clone()),
            DataformClient::new(tokens),
            region,
        ))
    }

    pub fn from_parts(
        bigquery: BqClient,
        transfer: TransferClient,
        dataform: DataformClient,
        region: impl Into<String>,
    ) -> Self {
        Self {
            bigquery,
            transfer,
            dataform,
            region: region.into(),
        }
    }

    pub fn bigquery(&self) -> &BqClient {
        &self.bigquery
    }
}

#[async_trait]
impl ResourceSource for GcpSource {
    async fn list_views(&self, dataset: &str) -> Result<Vec<ViewInfo>> {
        self.bigquery.list_views(dataset).await
    }

    async fn list_routines(&self, dataset: &str) -> Result<Vec<RoutineInfo>> {
        self.bigquery.list_routines(dataset).await
    }

    async fn list_tables(&self, dataset: &str) -> Result<Vec<TableInfo>> {
        self.bigquery.list_tables(dataset).await
    }

    async fn list_external_tables(&self, dataset: &str) -> Result<Vec<ExternalTableInfo>> {
        self.bigquery.list_external_tables(dataset).await
    }

    async fn list_scheduled_queries(&self) -> Result<Vec<ScheduledQueryInfo>> {
        self.transfer
            .list_scheduled_queries(self.bigquery.project_id(), &self.region)
            .await
    }

    async fn list_saved_queries(&self) -> Result<Vec<SavedQueryInfo>> {
        warn!("Saved queries are read through the Dataform API, which may change without notice");
        match self
            .dataform
            .list_saved_queries(self.bigquery.project_id(), &self.region)
            .await
        {
            Ok(saved) => Ok(saved),
            Err(e) => {
                warn!("Could not list saved queries: {}", e);
                Ok(Vec::new())
            }
        }
    }
}
