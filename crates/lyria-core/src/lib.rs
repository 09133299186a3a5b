//! Session lifecycle and conversation request coordination for Lyria.
//!
//! This crate defines the "ports" (backend and local store traits) that the
//! infrastructure layer implements, plus the two stateful components built on
//! them: the [`session::SessionManager`] and the
//! [`chat::ConversationCoordinator`]. It depends only on `lyria-types` --
//! never on `lyria-infra` or any HTTP/IO crate.

pub mod backend;
pub mod chat;
pub mod event;
pub mod preferences;
pub mod session;
pub mod speech;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
