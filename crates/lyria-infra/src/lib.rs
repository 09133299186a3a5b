//! Infrastructure layer for Lyria.
//!
//! Implements the ports defined in `lyria-core`: the reqwest-based HTTP
//! backend (with a cookie jar that can be persisted between runs), the
//! JSON-file local store, plus configuration loading and data directory
//! resolution.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod storage;
