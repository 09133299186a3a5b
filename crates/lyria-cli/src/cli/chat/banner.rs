//! Welcome banner printed when a chat starts.

use console::style;

use lyria_types::chat::PROMPT_SUGGESTIONS;

/// Print who is chatting, with which persona and voice, and where.
pub fn print_welcome_banner(
    user: Option<&str>,
    persona: &str,
    voice_label: &str,
    conversation: Option<&str>,
) {
    println!();
    println!("  {} {}", "*", style("LyrIA").cyan().bold());
    match user {
        Some(name) => println!("  {}", style(format!("Signed in as {name}")).dim()),
        None => println!(
            "  {}",
            style("Anonymous chat. Sign in with `lyria login` to keep history.").dim()
        ),
    }
    println!();
    println!("  {}  {}", style("Persona:").bold(), style(persona).dim());
    println!("  {}    {}", style("Voice:").bold(), style(voice_label).dim());
    if let Some(id) = conversation {
        println!("  {}  {}", style("Conversation:").bold(), style(id).dim());
    }
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+C cancels a reply, Ctrl+D exits").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

/// Print the starter prompts shown while a conversation is empty.
pub fn print_suggestions() {
    println!("  {}", style("Como posso ajudar hoje?").bold());
    println!();
    for (i, (prompt, hint)) in PROMPT_SUGGESTIONS.iter().enumerate() {
        println!(
            "  {}  {}  {}",
            style(format!("/{}", i + 1)).cyan(),
            prompt,
            style(hint).dim()
        );
    }
    println!();
}
