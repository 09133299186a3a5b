//! Client configuration types.
//!
//! `ClientConfig` represents `config.toml` in the data directory: which
//! backend to talk to and the timing knobs of the session lifecycle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest pause between background session checks.
pub const MIN_REVALIDATE_INTERVAL_SECS: u64 = 1;

/// Shortest timeout a backend call may be given.
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Top-level configuration for the Lyria client.
///
/// Loaded from `~/.lyria/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds between background session checks while signed in.
    #[serde(default = "default_revalidate_interval_secs")]
    pub revalidate_interval_secs: u64,

    /// Pause after a successful login before confirming the session, so the
    /// server-side cookie has committed.
    #[serde(default = "default_login_settle_ms")]
    pub login_settle_ms: u64,

    /// Upper bound for any single backend call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Repeated expiry signals inside this window produce one notification.
    #[serde(default = "default_expiry_notice_window_ms")]
    pub expiry_notice_window_ms: u64,
}

fn default_base_url() -> String {
    "https://lyria-back.onrender.com/Lyria".to_string()
}

fn default_revalidate_interval_secs() -> u64 {
    300
}

fn default_login_settle_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_expiry_notice_window_ms() -> u64 {
    1_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            revalidate_interval_secs: default_revalidate_interval_secs(),
            login_settle_ms: default_login_settle_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            expiry_notice_window_ms: default_expiry_notice_window_ms(),
        }
    }
}

impl ClientConfig {
    /// Never shorter than [`MIN_REVALIDATE_INTERVAL_SECS`].
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate_interval_secs.max(MIN_REVALIDATE_INTERVAL_SECS))
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    /// Never shorter than [`MIN_REQUEST_TIMEOUT_SECS`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS))
    }

    pub fn expiry_notice_window(&self) -> Duration {
        Duration::from_millis(self.expiry_notice_window_ms)
    }
}
