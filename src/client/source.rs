use crate::error::Result;
use crate::resource::{
    ExternalTableInfo, RoutineInfo, SavedQueryInfo, ScheduledQueryInfo, TableInfo, ViewInfo,
};
use async_trait::async_trait;

/// Lists the remote resources a pull compares against.
///
/// Dataset-scoped listings take the dataset id; scheduled and saved queries
/// belong to the project and region the source was built for.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list_views(&self, dataset: &str) -> Result<Vec<ViewInfo>>;

    async fn list_routines(&self, dataset: &str) -> Result<Vec<RoutineInfo>>;

    async fn list_tables(&self, dataset: &str) -> Result<Vec<TableInfo>>;

    async fn list_external_tables(&self, dataset: &str) -> Result<Vec<ExternalTableInfo>>;

    async fn list_scheduled_queries(&self) -> Result<Vec<ScheduledQueryInfo>>;

    /// Best effort: implementations return an empty list rather than fail.
    async fn list_saved_queries(&self) -> Result<Vec<SavedQueryInfo>>;
}

#[async_trait]
impl<T: ResourceSource + ?Sized> ResourceSource for std::sync::Arc<T> {
    async fn list_views(&self, dataset: &str) -> Result<Vec<ViewInfo>> {
        (**self).list_views(dataset).await
    }

    async fn list_routines(&self, dataset: &str) -> Result<Vec<RoutineInfo>> {
        (**self).list_routines(dataset).await
    }

    async fn list_tables(&self, dataset: &str) -> Result<Vec<TableInfo>> {
        (**self).list_tables(dataset).await
    }

    async fn list_external_tables(&self, dataset: &str) -> Result<Vec<ExternalTableInfo>> {
        (**self).list_external_tables(dataset).await
    }

    async fn list_scheduled_queries(&self) -> Result<Vec<ScheduledQueryInfo>> {
        (**self).list_scheduled_queries().await
    }

    async fn list_saved_queries(&self) -> Result<Vec<SavedQueryInfo>> {
        (**self).list_saved_queries().await
    }
}
