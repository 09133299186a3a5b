//! Client configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.lyria/` in production)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use lyria_types::config::ClientConfig;

use crate::filesystem::config_path;

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "LYRIA_BASE_URL";

/// Load client configuration from `{data_dir}/config.toml`, then apply
/// environment overrides.
///
/// - If the file does not exist, starts from [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and uses the default.
/// - A zero `revalidate_interval_secs` or `request_timeout_secs` is replaced
///   by its default, with a warning.
/// - `LYRIA_BASE_URL`, when set and non-empty, replaces `base_url`.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config = read_config_file(data_dir).await;
    apply_base_url_override(config, std::env::var(BASE_URL_ENV).ok())
}

async fn read_config_file(data_dir: &Path) -> ClientConfig {
    let config_path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => reset_zero_durations(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

fn reset_zero_durations(mut config: ClientConfig) -> ClientConfig {
    let defaults = ClientConfig::default();
    if config.revalidate_interval_secs == 0 {
        tracing::warn!(
            default = defaults.revalidate_interval_secs,
            "revalidate_interval_secs must be positive, using the default"
        );
        config.revalidate_interval_secs = defaults.revalidate_interval_secs;
    }
    if config.request_timeout_secs == 0 {
        tracing::warn!(
            default = defaults.request_timeout_secs,
            "request_timeout_secs must be positive, using the default"
        );
        config.request_timeout_secs = defaults.request_timeout_secs;
    }
    config
}

fn apply_base_url_override(mut config: ClientConfig, base_url: Option<String>) -> ClientConfig {
    if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
        tracing::debug!(base_url = %url, "base URL overridden from environment");
        config.base_url = url;
    }
    config
}
