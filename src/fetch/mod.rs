mod decision;
mod git;

pub use decision::{decide, FetchAction, FetchDecision, LocalFile};
pub use git::{GitCli, VersionControl};
