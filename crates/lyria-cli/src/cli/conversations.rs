//! Conversation history commands: list, show, delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use lyria_types::chat::{ConversationId, Sender};

use crate::state::AppState;

fn require_sign_in(state: &AppState) -> Result<()> {
    if !state.session.is_authenticated() {
        anyhow::bail!("Conversation history needs a signed-in account. Run: lyria login");
    }
    Ok(())
}

/// List the signed-in user's conversations.
///
/// # Examples
///
/// ```bash
/// lyria conversations
/// lyria conversations list --json
/// ```
pub async fn list_conversations(state: &AppState, json: bool) -> Result<()> {
    require_sign_in(state)?;
    let conversations = state
        .coordinator
        .refresh_conversations(&state.session.snapshot())
        .await
        .context("Failed to load conversations")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!();
        println!(
            "  {} No conversations yet. Start one with: {}",
            style("i").blue().bold(),
            style("lyria chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Title").fg(Color::White),
    ]);

    for conversation in &conversations {
        let title = conversation.display_title();
        let title_display = if title.chars().count() > 50 {
            format!("{}...", title.chars().take(47).collect::<String>())
        } else {
            title.to_string()
        };
        table.add_row(vec![
            Cell::new(conversation.id.as_str()).fg(Color::DarkGrey),
            Cell::new(title_display).fg(Color::Cyan),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(conversations.len()).bold(),
        if conversations.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Print every message of a conversation.
pub async fn show_conversation(state: &AppState, id: &str, json: bool) -> Result<()> {
    require_sign_in(state)?;
    let id = ConversationId(id.to_string());
    state
        .coordinator
        .load_conversation(&id)
        .await
        .with_context(|| format!("Failed to load conversation '{id}'"))?;
    let transcript = state.coordinator.transcript();

    if json {
        let messages: Vec<_> = transcript
            .iter()
            .map(|m| serde_json::json!({ "sender": m.sender, "text": m.text }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!();
    for message in &transcript {
        let label = match message.sender {
            Sender::User => style("You").green().bold(),
            Sender::Bot => style("Lyria").cyan().bold(),
        };
        println!("  {label}: {}", message.text);
        println!();
    }
    Ok(())
}

pub async fn delete_conversation(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    require_sign_in(state)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete conversation '{}'?", style(id).red().bold()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let id = ConversationId(id.to_string());
    state
        .coordinator
        .delete_conversation(&id)
        .await
        .with_context(|| format!("Failed to delete conversation '{id}'"))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "deleted": id }))?
        );
    } else {
        println!();
        println!("  {} Deleted conversation {}", style("✓").green().bold(), style(&id).dim());
        println!();
    }
    Ok(())
}
