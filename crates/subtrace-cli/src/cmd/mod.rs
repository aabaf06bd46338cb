pub mod analyze;
pub mod hook;
pub mod pending;
pub mod prune;

use std::path::Path;
use subtrace_core::diagnostics::Diagnostics;
use subtrace_core::{Config, Coordinator, JsonFileStore};

/// Effective config for `root`: file, then environment.
pub fn load_config(root: &Path) -> Config {
    Config::resolve(root)
}

pub fn open_store(root: &Path, config: &Config) -> JsonFileStore {
    JsonFileStore::new(config.store_path(root))
}

pub fn coordinator(root: &Path, config: &Config) -> Coordinator<JsonFileStore> {
    Coordinator::new(open_store(root, config))
        .with_tools(config.tools.clone())
        .with_diagnostics(Diagnostics::from_path(config.diagnostics_path(root)))
}
