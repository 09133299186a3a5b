//! Data directory layout.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "LYRIA_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `LYRIA_DATA_DIR` environment variable
/// 2. `~/.lyria`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".lyria");
    }

    // Last resort: current directory
    PathBuf::from(".lyria")
}

/// Path of the local key/value store file: `{data_dir}/store.json`.
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("store.json")
}

/// Path of the configuration file: `{data_dir}/config.toml`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}
