//! Interactive chat in the terminal.
//!
//! Replies are rendered as markdown, a spinner runs while a request is
//! pending and Ctrl+C cancels it. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
