//! Main chat loop.
//!
//! Resolves the persona, optionally opens a saved conversation, then reads
//! lines until Ctrl+D or `/exit`. While a reply is pending the loop keeps
//! reading input so Ctrl+C can cancel it.

use std::io::Write;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline_async::SharedWriter;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use lyria_types::chat::{
    ConversationId, CoordinatorEvent, PROMPT_SUGGESTIONS, RejectReason, SendOutcome, Sender,
    TranscriptMessage,
};
use lyria_types::preferences::PersonaCatalog;
use lyria_types::session::SessionEvent;

use crate::state::AppState;

use super::banner::{print_suggestions, print_welcome_banner};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

const EXPIRED_NOTICE: &str = "Sua sessão expirou. Faça login novamente para salvar suas conversas.";

struct ChatLoop<'a> {
    state: &'a AppState,
    input: ChatInput,
    writer: SharedWriter,
    renderer: ChatRenderer,
    catalog: PersonaCatalog,
    session_events: Receiver<SessionEvent>,
    chat_events: Receiver<CoordinatorEvent>,
    speak: bool,
}

enum Flow {
    Continue,
    Exit,
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop, optionally opening `conversation` first.
pub async fn run_chat_loop(state: &AppState, conversation: Option<String>) -> anyhow::Result<()> {
    let catalog = match state.preferences.personas().await {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!(error = %err, "failed to load persona catalog");
            PersonaCatalog::new()
        }
    };
    let persona = state.preferences.resolve_persona(&catalog).await;
    state.coordinator.set_persona(persona.clone());

    if let Some(id) = conversation {
        let id = ConversationId(id);
        state
            .coordinator
            .load_conversation(&id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open conversation '{id}': {e}"))?;
    }

    let snapshot = state.session.snapshot();
    let voice = state.preferences.voice().await;
    let active = state.coordinator.active_conversation();
    print_welcome_banner(
        snapshot.authenticated_user(),
        &persona,
        voice.label,
        active.as_ref().map(ConversationId::as_str),
    );

    let prompt = format!("  {} ", style("Você >").green().bold());
    let (input, writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let mut chat = ChatLoop {
        state,
        input,
        writer,
        renderer: ChatRenderer::new(),
        catalog,
        session_events: state.session.subscribe(),
        chat_events: state.coordinator.subscribe(),
        speak: false,
    };

    let transcript = state.coordinator.transcript();
    if transcript.is_empty() {
        print_suggestions();
    } else {
        chat.print_transcript(&transcript);
    }
    chat.run().await;
    println!("\n  {}", style("Chat ended.").dim());
    Ok(())
}

impl ChatLoop<'_> {
    async fn run(&mut self) {
        loop {
            let event = tokio::select! {
                event = self.input.read_line() => event,
                Ok(event) = self.session_events.recv() => {
                    self.on_session_event(event);
                    continue;
                }
            };

            let flow = match event {
                InputEvent::Eof => Flow::Exit,
                InputEvent::Interrupted => {
                    println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                    Flow::Continue
                }
                InputEvent::Message(text) if text.is_empty() => Flow::Continue,
                InputEvent::Message(text) => match commands::parse(&text) {
                    Some(command) => self.run_command(command).await,
                    None => self.send(&text, false).await,
                },
            };

            if let Flow::Exit = flow {
                self.state.coordinator.cancel_pending();
                break;
            }
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Expired => {
                let _ = writeln!(
                    self.writer,
                    "\n  {} {}\n",
                    style("!").yellow().bold(),
                    style(EXPIRED_NOTICE).yellow()
                );
            }
            SessionEvent::Authenticated { user } => {
                debug!(user = %user.name, "session confirmed");
            }
            SessionEvent::LoggedOut => {}
        }
    }

    /// Send `text` and wait for the outcome, reading input meanwhile:
    /// Ctrl+C cancels the request and `/resend <text>` replaces it.
    async fn send(&mut self, text: &str, supersede: bool) -> Flow {
        let state = self.state;
        let mut flow = Flow::Continue;
        let mut next = Some((text.to_string(), supersede));

        while let Some((text, supersede)) = next.take() {
            let snapshot = state.session.snapshot();
            let sent_from = state.coordinator.active_conversation();
            let spinner = thinking_spinner();

            let outcome = {
                let send = async {
                    if supersede {
                        state.coordinator.supersede(&text, &snapshot).await
                    } else {
                        state.coordinator.send(&text, &snapshot).await
                    }
                };
                tokio::pin!(send);

                loop {
                    tokio::select! {
                        outcome = &mut send => break outcome,
                        event = self.input.read_line() => match event {
                            InputEvent::Interrupted => {
                                state.coordinator.cancel_pending();
                            }
                            InputEvent::Eof => {
                                state.coordinator.cancel_pending();
                                flow = Flow::Exit;
                            }
                            InputEvent::Message(line) => match commands::parse(&line) {
                                Some(ChatCommand::Resend(replacement)) => {
                                    state.coordinator.cancel_pending();
                                    next = Some((replacement, true));
                                }
                                _ => {
                                    let _ = writeln!(
                                        self.writer,
                                        "  {}",
                                        style("Still waiting for the reply. Ctrl+C cancels it, /resend <text> replaces it.").dim()
                                    );
                                }
                            },
                        },
                    }
                }
            };
            spinner.finish_and_clear();

            self.show_outcome(&outcome).await;
            self.drain_chat_events(sent_from.as_ref());
            if let Flow::Exit = flow {
                break;
            }
        }
        flow
    }

    async fn show_outcome(&self, outcome: &SendOutcome) {
        match outcome {
            SendOutcome::Fulfilled { reply } => {
                self.renderer.print_reply(reply);
            }
            SendOutcome::Failed { message } => {
                self.renderer.print_failure(message);
            }
            SendOutcome::Cancelled => {
                println!("  {}", style("Reply cancelled.").dim());
            }
            SendOutcome::Discarded => {
                debug!("reply arrived for another conversation and was dropped");
            }
            SendOutcome::Rejected(reason) => {
                let message = match reason {
                    RejectReason::EmptyInput => "Nothing to send.",
                    RejectReason::Busy => "A reply is still pending.",
                    RejectReason::VoiceInputActive => "Voice capture is in progress.",
                };
                println!("  {} {}", style("?").yellow().bold(), message);
            }
        }

        if self.speak {
            if let Some(text) = outcome.spoken_text() {
                let voice = self.state.preferences.voice().await;
                self.renderer.print_spoken(voice.label, text);
            }
        }
    }

    /// Report a conversation the backend created for the last send.
    fn drain_chat_events(&mut self, sent_from: Option<&ConversationId>) {
        let mut list_changed = false;
        while let Ok(event) = self.chat_events.try_recv() {
            if let CoordinatorEvent::ConversationListChanged = event {
                list_changed = true;
            }
        }
        let active = self.state.coordinator.active_conversation();
        if list_changed && active.as_ref() != sent_from {
            if let Some(id) = active {
                println!("  {}", style(format!("Saved as conversation {id}")).dim());
                println!();
            }
        }
    }

    async fn run_command(&mut self, command: ChatCommand) -> Flow {
        let state = self.state;
        match command {
            ChatCommand::Help => commands::print_help(),
            ChatCommand::Clear => self.input.clear(),
            ChatCommand::Exit => return Flow::Exit,
            ChatCommand::New => {
                state.coordinator.start_new_conversation();
                println!("\n  {} New conversation\n", style("*").cyan().bold());
                print_suggestions();
            }
            ChatCommand::History => self.print_transcript(&state.coordinator.transcript()),
            ChatCommand::Conversations => self.list_conversations().await,
            ChatCommand::Load(id) => {
                let id = ConversationId(id);
                match state.coordinator.load_conversation(&id).await {
                    Ok(()) => self.print_transcript(&state.coordinator.transcript()),
                    Err(e) => println!("\n  {} Could not open '{id}': {e}\n", style("!").red().bold()),
                }
            }
            ChatCommand::Delete(id) => {
                let id = ConversationId(id);
                match state.coordinator.delete_conversation(&id).await {
                    Ok(()) => println!("\n  {} Deleted {id}\n", style("✓").green().bold()),
                    Err(e) => println!("\n  {} Could not delete '{id}': {e}\n", style("!").red().bold()),
                }
            }
            ChatCommand::Persona(None) => {
                println!("\n  {} {}", style("Persona:").bold(), state.coordinator.persona());
                for (key, description) in &self.catalog {
                    println!("    {} {}", style(key).cyan(), style(description).dim());
                }
                println!();
            }
            ChatCommand::Persona(Some(key)) => {
                match state.preferences.select_persona(&key, &self.catalog).await {
                    Ok(()) => {
                        state.coordinator.set_persona(key.clone());
                        println!("\n  {} Persona set to {}\n", style("✓").green().bold(), style(&key).cyan());
                    }
                    Err(e) => println!("\n  {} {e}\n", style("!").red().bold()),
                }
            }
            ChatCommand::Voice(None) => {
                let voice = state.preferences.voice().await;
                println!("\n  {} {} ({})\n", style("Voice:").bold(), voice.label, style(voice.value).dim());
            }
            ChatCommand::Voice(Some(value)) => match state.preferences.select_voice(&value).await {
                Ok(voice) => println!("\n  {} Voice set to {}\n", style("✓").green().bold(), style(voice.label).cyan()),
                Err(e) => println!("\n  {} {e}\n", style("!").red().bold()),
            },
            ChatCommand::Speak => {
                self.speak = !self.speak;
                let label = if self.speak { "on" } else { "off" };
                println!("\n  {} Speech text {label}\n", style("*").cyan().bold());
            }
            ChatCommand::Resend(text) => return self.send(&text, true).await,
            ChatCommand::Suggestion(index) => {
                let (prompt, _) = PROMPT_SUGGESTIONS[index];
                println!("  {} {}", style("Você").green().bold(), prompt);
                return self.send(prompt, false).await;
            }
            ChatCommand::Unknown(name) => {
                println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                );
            }
        }
        Flow::Continue
    }

    async fn list_conversations(&self) {
        let snapshot = self.state.session.snapshot();
        if !snapshot.is_authenticated {
            println!("\n  {} Sign in to keep conversation history.\n", style("i").blue().bold());
            return;
        }
        match self.state.coordinator.refresh_conversations(&snapshot).await {
            Ok(conversations) if conversations.is_empty() => {
                println!("\n  {}\n", style("No saved conversations.").dim());
            }
            Ok(conversations) => {
                let active = self.state.coordinator.active_conversation();
                println!();
                for conversation in &conversations {
                    let marker = if active.as_ref() == Some(&conversation.id) { "●" } else { " " };
                    println!(
                        "  {} {}  {}",
                        style(marker).green(),
                        style(&conversation.id).dim(),
                        conversation.display_title()
                    );
                }
                println!();
            }
            Err(e) => println!("\n  {} Could not list conversations: {e}\n", style("!").red().bold()),
        }
    }

    fn print_transcript(&self, transcript: &[TranscriptMessage]) {
        if transcript.is_empty() {
            return;
        }
        println!();
        for message in transcript {
            match message.sender {
                Sender::User => {
                    println!("  {} {}", style("Você").green().bold(), message.text);
                    println!();
                }
                Sender::Bot => self.renderer.print_reply(&message.text),
            }
        }
    }
}
