mod kind;
mod types;

pub use kind::ResourceKind;
pub use types::{
    ExternalTableInfo, RoutineArgument, RoutineInfo, SavedQueryInfo, ScheduledQueryInfo,
    SchemaField, TableInfo, ViewInfo,
};
