//! Local key/value store trait.
//!
//! The client's only persistence: a handful of optional string keys that
//! survive restarts. Every value is safely regenerable, so readers treat a
//! missing or unreadable entry as absent. Implementations live in lyria-infra.

use lyria_types::error::StoreError;

/// Cached user profile (JSON-encoded `UserProfile`).
pub const USER_KEY: &str = "lyriaUser";
/// Selected persona key.
pub const PERSONA_KEY: &str = "lyriaPersona";
/// Selected synthesis voice.
pub const VOICE_KEY: &str = "lyriaVoice";
/// RFC 3339 timestamp of the last confirmed session check.
pub const LAST_CHECK_KEY: &str = "lyriaLastSessionCheck";

/// Trait for the client's persistent string key/value store.
///
/// Writes are whole-value overwrites (last write wins).
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait LocalStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Delete a key. No-op if the key does not exist.
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
