//! Reply text preparation for speech synthesis.
//!
//! Replies are markdown. The synthesizer reads whatever it is given, so
//! formatting characters are removed first.

use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid code block regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]+\)").expect("valid image regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link regex"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#{1,6}\s").expect("valid heading regex"));

/// Strip markdown from `markdown`, leaving text fit to be read aloud.
///
/// Code blocks and images become a single space, link text is kept, inline
/// code ticks, emphasis markers and heading markers are dropped.
pub fn plain_text(markdown: &str) -> String {
    let text = CODE_BLOCK.replace_all(markdown, " ");
    let text = text.replace('`', "");
    let text = text.replace("**", "").replace('*', "");
    let text = HEADING.replace_all(&text, "");
    // Images first: their alt text would otherwise match as a link.
    let text = IMAGE.replace_all(&text, " ");
    let text = LINK.replace_all(&text, "$1");
    text.trim().to_string()
}
