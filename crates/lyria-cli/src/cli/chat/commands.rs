//! Slash command parsing for the chat loop.

use console::style;

use lyria_types::chat::PROMPT_SUGGESTIONS;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Clear,
    Exit,
    /// Start a new conversation.
    New,
    /// Reprint the active transcript.
    History,
    /// List saved conversations.
    Conversations,
    /// Open a saved conversation.
    Load(String),
    /// Delete a saved conversation.
    Delete(String),
    /// Show or select a persona.
    Persona(Option<String>),
    /// Show or select a voice.
    Voice(Option<String>),
    /// Toggle printing the speech text of each reply.
    Speak,
    /// Send even if a reply is pending, cancelling it.
    Resend(String),
    /// Send the numbered starter prompt (`/1` is the first).
    Suggestion(usize),
    /// Unknown command, or a known one missing its argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts
        .get(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let required = |arg: Option<String>, make: fn(String) -> ChatCommand, usage: &str| {
        arg.map(make)
            .unwrap_or_else(|| ChatCommand::Unknown(usage.to_string()))
    };

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/conversations" | "/list" => Some(ChatCommand::Conversations),
        "/load" | "/open" => Some(required(arg, ChatCommand::Load, "/load requires an id")),
        "/delete" | "/rm" => Some(required(arg, ChatCommand::Delete, "/delete requires an id")),
        "/persona" => Some(ChatCommand::Persona(arg)),
        "/voice" => Some(ChatCommand::Voice(arg)),
        "/speak" => Some(ChatCommand::Speak),
        "/resend" | "/force" => Some(required(arg, ChatCommand::Resend, "/resend requires a message")),
        other => match other[1..].parse::<usize>() {
            Ok(n) if (1..=PROMPT_SUGGESTIONS.len()).contains(&n) => Some(ChatCommand::Suggestion(n - 1)),
            _ => Some(ChatCommand::Unknown(other.to_string())),
        },
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat"),
        ("/new", "Start a new conversation"),
        ("/history", "Show the current conversation"),
        ("/conversations", "List saved conversations"),
        ("/load <id>", "Open a saved conversation"),
        ("/delete <id>", "Delete a saved conversation"),
        ("/persona [key]", "Show or select the persona"),
        ("/voice [name]", "Show or select the voice"),
        ("/speak", "Toggle speech text for replies"),
        ("/resend <text>", "Cancel the pending reply and send this"),
        ("/1 .. /4", "Send a starter prompt"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (command, description) in rows {
        println!("  {:<18} {}", style(command).cyan(), description);
    }
    println!();
    println!(
        "  {}",
        style("Ctrl+C cancels a pending reply, Ctrl+D exits").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/Q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_load_and_delete() {
        assert_eq!(parse("/load 42"), Some(ChatCommand::Load("42".to_string())));
        assert_eq!(
            parse("/delete  abc "),
            Some(ChatCommand::Delete("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        assert_eq!(
            parse("/load"),
            Some(ChatCommand::Unknown("/load requires an id".to_string()))
        );
        assert_eq!(
            parse("/resend   "),
            Some(ChatCommand::Unknown("/resend requires a message".to_string()))
        );
    }

    #[test]
    fn test_parse_optional_argument() {
        assert_eq!(parse("/persona"), Some(ChatCommand::Persona(None)));
        assert_eq!(
            parse("/persona empresarial"),
            Some(ChatCommand::Persona(Some("empresarial".to_string())))
        );
        assert_eq!(
            parse("/voice pt-BR-AntonioNeural"),
            Some(ChatCommand::Voice(Some("pt-BR-AntonioNeural".to_string())))
        );
    }

    #[test]
    fn test_parse_resend_keeps_text() {
        assert_eq!(
            parse("/resend qual é a capital?"),
            Some(ChatCommand::Resend("qual é a capital?".to_string()))
        );
    }

    #[test]
    fn test_parse_suggestion_numbers() {
        assert_eq!(parse("/1"), Some(ChatCommand::Suggestion(0)));
        assert_eq!(parse("/4"), Some(ChatCommand::Suggestion(3)));
        assert_eq!(parse("/5"), Some(ChatCommand::Unknown("/5".to_string())));
        assert_eq!(parse("/0"), Some(ChatCommand::Unknown("/0".to_string())));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("olá, tudo bem?"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
