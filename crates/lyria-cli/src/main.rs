//! Lyria terminal client entry point.
//!
//! Binary name: `lyria`
//!
//! Parses CLI arguments, restores the session, then dispatches to the
//! command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, ConversationCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,lyria_core=debug,lyria_infra=debug",
        _ => "trace",
    };
    lyria_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "lyria", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(&state, cli).await;

    state.shutdown().await;
    lyria_observe::tracing_setup::shutdown_tracing();
    result
}

async fn dispatch(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Login { email } => cli::auth::login(state, email, cli.json).await,
        Commands::Logout => cli::auth::logout(state, cli.json).await,
        Commands::Status => cli::auth::status(state, cli.json).await,
        Commands::Chat { conversation } => {
            cli::chat::loop_runner::run_chat_loop(state, conversation).await
        }
        Commands::Conversations { action } => match action.unwrap_or(ConversationCommand::List) {
            ConversationCommand::List => {
                cli::conversations::list_conversations(state, cli.json).await
            }
            ConversationCommand::Show { id } => {
                cli::conversations::show_conversation(state, &id, cli.json).await
            }
            ConversationCommand::Delete { id, force } => {
                cli::conversations::delete_conversation(state, &id, force, cli.json).await
            }
        },
        Commands::Persona { key } => cli::preferences::persona(state, key, cli.json).await,
        Commands::Voice { value } => cli::preferences::voice(state, value, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}
