use super::source::ResourceSource;
use crate::error::Result;
use crate::resource::{
    ExternalTableInfo, RoutineInfo, SavedQueryInfo, ScheduledQueryInfo, TableInfo, ViewInfo,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory source keyed by dataset. Counts every listing call.
#[derive(Debug, Default)]
pub struct MockSource {
    views: HashMap<String, Vec<ViewInfo>>,
    routines: HashMap<String, Vec<RoutineInfo>>,
    tables: HashMap<String, Vec<TableInfo>>,
    external_tables: HashMap<String, Vec<ExternalTableInfo>>,
    scheduled_queries: Vec<ScheduledQueryInfo>,
    saved_queries: Vec<SavedQueryInfo>,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, dataset: &str, view: ViewInfo) -> Self {
        self.views.entry(dataset.to_string()).or_default().push(view);
        self
    }

    pub fn with_routine(mut self, dataset: &str, routine: RoutineInfo) -> Self {
        self.routines
            .entry(dataset.to_string())
            .or_default()
            .push(routine);
        self
    }

    pub fn with_table(mut self, dataset: &str, table: TableInfo) -> Self {
        self.tables.entry(dataset.to_string()).or_default().push(table);
        self
    }

    pub fn with_external_table(mut self, dataset: &str, table: ExternalTableInfo) -> Self {
        self.external_tables
            .entry(dataset.to_string())
            .or_default()
            .push(table);
        self
    }

    pub fn with_scheduled_query(mut self, query: ScheduledQueryInfo) -> Self {
        self.scheduled_queries.push(query);
        self
    }

    pub fn with_saved_query(mut self, query: SavedQueryInfo) -> Self {
        self.saved_queries.push(query);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn in_dataset<T: Clone>(map: &HashMap<String, Vec<T>>, dataset: &str) -> Vec<T> {
    map.get(dataset).cloned().unwrap_or_default()
}

#[async_trait]
impl ResourceSource for MockSource {
    async fn list_views(&self, dataset: &str) -> Result<Vec<ViewInfo>> {
        self.record();
        Ok(in_dataset(&self.views, dataset))
    }

    async fn list_routines(&self, dataset: &str) -> Result<Vec<RoutineInfo>> {
        self.record();
        Ok(in_dataset(&self.routines, dataset))
    }

    async fn list_tables(&self, dataset: &str) -> Result<Vec<TableInfo>> {
        self.record();
        Ok(in_dataset(&self.tables, dataset))
    }

    async fn list_external_tables(&self, dataset: &str) -> Result<Vec<ExternalTableInfo>> {
        self.record();
        Ok(in_dataset(&self.external_tables, dataset))
    }

    async fn list_scheduled_queries(&self) -> Result<Vec<ScheduledQueryInfo>> {
        self.record();
        Ok(self.scheduled_queries.clone())
    }

    async fn list_saved_queries(&self) -> Result<Vec<SavedQueryInfo>> {
        self.record();
        Ok(self.saved_queries.clone())
    }
}
