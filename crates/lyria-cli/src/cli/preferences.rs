//! Persona and voice selection commands.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use lyria_types::preferences::VOICES;

use crate::state::AppState;

/// List the persona catalog with the current choice marked, or select `key`.
///
/// # Examples
///
/// ```bash
/// lyria persona
/// lyria persona empresarial
/// ```
pub async fn persona(state: &AppState, key: Option<String>, json: bool) -> Result<()> {
    let catalog = state
        .preferences
        .personas()
        .await
        .context("Failed to load personas")?;

    if let Some(key) = key {
        state.preferences.select_persona(&key, &catalog).await?;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "persona": key }))?
            );
        } else {
            println!();
            println!("  {} Persona set to {}", style("✓").green().bold(), style(&key).cyan());
            println!();
        }
        return Ok(());
    }

    let current = state.preferences.resolve_persona(&catalog).await;

    if json {
        let status = serde_json::json!({ "current": current, "personas": catalog });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("Persona").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);
    for (key, description) in &catalog {
        let marker = if *key == current { "●" } else { "" };
        table.add_row(vec![
            Cell::new(marker).fg(Color::Green),
            Cell::new(key).fg(Color::Cyan),
            Cell::new(description).fg(Color::White),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// List the voices with the current choice marked, or select `value`.
pub async fn voice(state: &AppState, value: Option<String>, json: bool) -> Result<()> {
    if let Some(value) = value {
        let voice = state.preferences.select_voice(&value).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&voice)?);
        } else {
            println!();
            println!(
                "  {} Voice set to {} ({})",
                style("✓").green().bold(),
                style(voice.label).cyan(),
                style(voice.value).dim()
            );
            println!();
        }
        return Ok(());
    }

    let current = state.preferences.voice().await;

    if json {
        let status = serde_json::json!({ "current": current, "voices": VOICES });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("Voice").fg(Color::White),
        Cell::new("Name").fg(Color::White),
    ]);
    for voice in VOICES {
        let marker = if *voice == current { "●" } else { "" };
        table.add_row(vec![
            Cell::new(marker).fg(Color::Green),
            Cell::new(voice.label).fg(Color::Cyan),
            Cell::new(voice.value).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}
