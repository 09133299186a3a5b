//! Authentication state and its lifecycle.
//!
//! The `SessionManager` owns the only mutable copy of the session. Everything
//! else works from `SessionSnapshot`s and reports authorization failures back
//! through [`SessionManager::on_unauthorized`].

pub mod expiry;
pub mod manager;
pub mod state;

pub use manager::SessionManager;
