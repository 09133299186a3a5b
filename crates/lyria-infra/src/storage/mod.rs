//! Local key/value storage.
//!
//! Implements the `LocalStore` trait from `lyria-core` on top of a single
//! JSON file in the data directory.

pub mod json_file;

pub use json_file::JsonFileStore;
