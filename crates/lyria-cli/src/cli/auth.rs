//! Sign in, sign out and session status.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use lyria_types::error::SessionError;
use lyria_types::session::Credentials;

use crate::state::AppState;

/// Log in, prompting for whatever was not given on the command line.
///
/// # Examples
///
/// ```bash
/// lyria login --email ana@example.com
/// ```
pub async fn login(state: &AppState, email: Option<String>, json: bool) -> Result<()> {
    let email = match email {
        Some(e) => e,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;
    let credentials = Credentials::new(email, password);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("signing in...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = state.session.login(&credentials).await;
    spinner.finish_and_clear();

    let user = match result {
        Ok(user) => user,
        Err(SessionError::LoginRejected(status)) => {
            anyhow::bail!("Email or password not accepted (status: {status})")
        }
        Err(SessionError::CreationFailed) => {
            anyhow::bail!("Signed in, but the server did not confirm the session. Try again.")
        }
        Err(err) => return Err(err).context("Login failed"),
    };
    state.save_session_cookie().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Signed in as {}",
        style("✓").green().bold(),
        style(&user.name).cyan().bold()
    );
    if let Some(persona) = &user.persona {
        println!("  {}  {}", style("Persona:").bold(), style(persona).dim());
    }
    println!();
    Ok(())
}

pub async fn logout(state: &AppState, json: bool) -> Result<()> {
    let was_signed_in = state.session.is_authenticated();
    state.session.logout().await;
    state.save_session_cookie().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "logged_out": was_signed_in }))?
        );
    } else if was_signed_in {
        println!();
        println!("  {} Signed out", style("✓").green().bold());
        println!();
    } else {
        println!();
        println!("  {} Not signed in", style("i").blue().bold());
        println!();
    }
    Ok(())
}

/// Show the confirmed session, as of the check made at startup.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let snapshot = state.session.snapshot();
    let voice = state.preferences.voice().await;
    let persona = state.preferences.stored_persona().await;

    if json {
        let status = serde_json::json!({
            "authenticated": snapshot.is_authenticated,
            "user": snapshot.user,
            "last_checked_at": snapshot.last_checked_at,
            "voice": voice.value,
            "persona": persona,
            "base_url": state.config.base_url,
            "data_dir": state.data_dir,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    match snapshot.user.as_ref().filter(|_| snapshot.is_authenticated) {
        Some(user) => {
            println!(
                "  {} Signed in as {}",
                style("●").green(),
                style(&user.name).cyan().bold()
            );
            if let Some(email) = &user.email {
                println!("  {}    {}", style("Email:").bold(), email);
            }
        }
        None => println!(
            "  {} Not signed in. Chats use the anonymous endpoint. Sign in with: {}",
            style("○").dim(),
            style("lyria login").yellow()
        ),
    }
    if let Some(checked) = snapshot.last_checked_at {
        println!(
            "  {}  {}",
            style("Checked:").bold(),
            style(checked.format("%Y-%m-%d %H:%M:%S UTC")).dim()
        );
    }
    println!("  {}    {} ({})", style("Voice:").bold(), voice.label, style(voice.value).dim());
    println!(
        "  {}  {}",
        style("Persona:").bold(),
        persona.as_deref().unwrap_or("(default)")
    );
    println!("  {}   {}", style("Server:").bold(), style(&state.config.base_url).dim());
    println!();
    Ok(())
}
