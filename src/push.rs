use crate::error::{BqSyncError, Result};

/// Deploying local definitions back to BigQuery is not supported yet.
pub fn push_project() -> Result<()> {
    Err(BqSyncError::NotImplemented("push".to_string()))
}
