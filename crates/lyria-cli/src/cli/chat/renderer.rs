//! Terminal rendering of replies.
//!
//! Replies are markdown and go through `termimad`. The speech line shows the
//! same reply reduced to the plain text a speech synthesizer would read.

use console::style;
use termimad::MadSkin;
use termimad::crossterm::style::Color;

use lyria_core::speech::plain_text;

pub struct ChatRenderer {
    skin: MadSkin,
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(Color::Cyan);
        skin.headers[0].set_fg(Color::Cyan);
        skin.headers[1].set_fg(Color::Cyan);
        skin.inline_code.set_fg(Color::Yellow);
        Self { skin }
    }

    /// Render markdown for the terminal.
    pub fn render(&self, markdown: &str) -> String {
        self.skin.term_text(markdown).to_string()
    }

    pub fn print_reply(&self, markdown: &str) {
        println!();
        println!("  {}", style("Lyria").cyan().bold());
        for line in self.render(markdown).trim_end().lines() {
            println!("  {line}");
        }
        println!();
    }

    /// Print a failure message shown in place of a reply.
    pub fn print_failure(&self, message: &str) {
        println!();
        println!("  {} {}", style("!").red().bold(), style(message).red());
        println!();
    }

    /// Print the speech text for `markdown`, labelled with the voice.
    pub fn print_spoken(&self, voice_label: &str, markdown: &str) {
        let spoken = plain_text(markdown);
        if spoken.is_empty() {
            return;
        }
        println!(
            "  {} {}",
            style(format!("[{voice_label}]")).magenta(),
            style(spoken).dim()
        );
        println!();
    }
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}
