//! Event distribution for session and conversation notifications.
//!
//! Collaborators (the terminal UI, a speech synthesizer, a conversation list
//! view) subscribe here instead of polling component state.

pub mod bus;

pub use bus::EventBus;
