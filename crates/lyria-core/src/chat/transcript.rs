//! The message list of the active conversation.

use lyria_types::chat::{StoredMessage, TranscriptMessage};

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: TranscriptMessage) {
        self.messages.push(message);
    }

    /// Replace the contents with messages loaded from the backend. History
    /// never animates.
    pub fn replace_with_history(&mut self, history: Vec<StoredMessage>) {
        self.messages = history
            .into_iter()
            .map(|m| TranscriptMessage {
                id: uuid::Uuid::now_v7(),
                sender: m.sender,
                text: m.text,
                animate: false,
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
