pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pull;
pub mod push;
pub mod resource;
pub mod writer;

pub use client::{BqClient, GcpSource, MockSource, ResourceSource, TokenSource};
pub use config::{discover_config, load_config, resolve_output_dir, SyncConfig};
pub use error::{BqSyncError, Result};
pub use export::{fetch_table_to_file, ExportFormat, RowReader, TablePath, TableRows};
pub use fetch::{decide, FetchAction, FetchDecision, GitCli, LocalFile, VersionControl};
pub use pull::{ensure_clean, PullOptions, PullReport, Puller};
pub use push::push_project;
pub use resource::{
    ExternalTableInfo, ResourceKind, RoutineArgument, RoutineInfo, SavedQueryInfo,
    ScheduledQueryInfo, SchemaField, TableInfo, ViewInfo,
};
pub use writer::humanize_bytes;
