mod layout;
mod orchestrator;
mod report;

pub use layout::{sanitize_name, ForceFilter, SyncLayout};
pub use orchestrator::{ensure_clean, PullOptions, Puller};
pub use report::{KindCounts, PullReport};
