//! CLI command definitions for the `lyria` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod auth;
pub mod chat;
pub mod conversations;
pub mod preferences;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Talk to the Lyria assistant from the terminal.
#[derive(Parser)]
#[command(name = "lyria", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password.
    Login {
        /// Account email (prompted when omitted).
        #[arg(long, short)]
        email: Option<String>,
    },

    /// Sign out and forget the cached profile.
    Logout,

    /// Show who is signed in.
    Status,

    /// Start an interactive chat.
    Chat {
        /// Open an existing conversation instead of a new one.
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Manage saved conversations.
    #[command(alias = "conv")]
    Conversations {
        #[command(subcommand)]
        action: Option<ConversationCommand>,
    },

    /// List personas, or select one.
    Persona {
        /// Persona key to select.
        key: Option<String>,
    },

    /// List voices, or select one.
    Voice {
        /// Voice name to select (e.g. pt-BR-AntonioNeural).
        value: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConversationCommand {
    /// List conversations (default).
    #[command(alias = "ls")]
    List,

    /// Print a conversation's messages.
    Show {
        /// Conversation id.
        id: String,
    },

    /// Delete a conversation.
    #[command(alias = "rm")]
    Delete {
        /// Conversation id.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_conversations_defaults_to_list() {
        let cli = Cli::try_parse_from(["lyria", "conversations"]).unwrap();
        assert!(matches!(cli.command, Commands::Conversations { action: None }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lyria", "status", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}
