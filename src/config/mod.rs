mod loader;

pub use loader::{
    discover_config, load_config, resolve_output_dir, ProjectConfig, SyncConfig, SyncSection,
    CONFIG_FILENAME,
};
