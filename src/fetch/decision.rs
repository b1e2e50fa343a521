use super::git::VersionControl;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchAction {
    Fetch,
    Skip,
    Warn,
}

impl fmt::Display for FetchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchAction::Fetch => write!(f, "FETCH"),
            FetchAction::Skip => write!(f, "SKIP"),
            FetchAction::Warn => write!(f, "WARN"),
        }
    }
}

/// Outcome of [`decide`]. `diagnostic` is set whenever the caller should
/// surface a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDecision {
    pub action: FetchAction,
    pub diagnostic: Option<String>,
}

impl FetchDecision {
    fn quiet(action: FetchAction) -> Self {
        Self {
            action,
            diagnostic: None,
        }
    }

    fn noisy(action: FetchAction, diagnostic: String) -> Self {
        Self {
            action,
            diagnostic: Some(diagnostic),
        }
    }
}

/// What is known about the local copy of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub exists: bool,
    pub committed: Option<DateTime<Utc>>,
}

impl LocalFile {
    /// Looks at the file on disk, asking version control for history only
    /// when the file is there.
    pub fn inspect(path: impl Into<PathBuf>, vcs: &dyn VersionControl) -> Self {
        let path = path.into();
        let exists = path.is_file();
        let committed = if exists {
            vcs.committed_time(&path)
        } else {
            None
        };
        Self {
            path,
            exists,
            committed,
        }
    }

    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exists: false,
            committed: None,
        }
    }

    pub fn uncommitted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exists: true,
            committed: None,
        }
    }

    pub fn committed(path: impl Into<PathBuf>, at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            exists: true,
            committed: Some(at),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The fetch decision matrix.
///
/// | remote | file | commit | condition       | action |
/// |--------|------|--------|-----------------|--------|
/// | no     | no   | –      | –               | SKIP   |
/// | no     | yes  | –      | –               | WARN   |
/// | yes    | no   | –      | –               | FETCH  |
/// | yes    | yes  | no     | –               | WARN   |
/// | yes    | yes  | yes    | remote <= commit| SKIP   |
/// | yes    | yes  | yes    | remote > commit | FETCH  |
///
/// `force` short-circuits to FETCH.
pub fn decide(
    remote_modified: Option<DateTime<Utc>>,
    local: &LocalFile,
    force: bool,
) -> FetchDecision {
    if force {
        return FetchDecision::quiet(FetchAction::Fetch);
    }

    let remote = match (remote_modified, local.exists) {
        (None, false) => return FetchDecision::quiet(FetchAction::Skip),
        (None, true) => {
            return FetchDecision::noisy(
                FetchAction::Warn,
                format!(
                    "Resource deleted on BigQuery but local file exists: {}",
                    local.path.display()
                ),
            )
        }
        (Some(_), false) => return FetchDecision::quiet(FetchAction::Fetch),
        (Some(remote), true) => remote,
    };

    match local.committed {
        None => FetchDecision::noisy(
            FetchAction::Warn,
            format!(
                "Local file not committed, cannot compare: {}",
                local.path.display()
            ),
        ),
        Some(committed) if remote <= committed => FetchDecision::quiet(FetchAction::Skip),
        Some(committed) => FetchDecision::noisy(
            FetchAction::Fetch,
            format!(
                "BigQuery resource is more recent than committed version: {} (BigQuery: {}, committed: {})",
                local.path.display(),
                remote.to_rfc3339(),
                committed.to_rfc3339()
            ),
        ),
    }
}
