//! Shared domain types for the Lyria assistant client.
//!
//! This crate contains the types used across the workspace: session and
//! user profile records, conversation and transcript types, preference
//! catalogs, configuration, and the error enums.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod preferences;
pub mod session;
