//! HTTP backend for the Lyria API.

pub mod client;
pub mod types;

pub use client::{COOKIE_KEY, HttpLyriaBackend};
