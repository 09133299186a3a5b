//! Conversation, transcript, and chat request types.
//!
//! These types model the chat side of the client: server-side conversations,
//! the transcript of the active conversation, and the lifecycle of a single
//! outbound chat request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Text shown (and spoken) when a send fails for any reason other than
/// cancellation.
pub const SEND_FAILURE_MESSAGE: &str = "Desculpe, ocorreu um erro.";

/// Starter prompts offered while the transcript is empty: (prompt, hint).
pub const PROMPT_SUGGESTIONS: [(&str, &str); 4] = [
    ("Quem é você?", "Descubra a identidade da LyrIA"),
    ("Me conte uma curiosidade", "Descubra algo interessante"),
    ("Me conte uma piada", "Para dar boas risadas"),
    ("Como você funciona?", "Explore os bastidores da IA"),
];

/// Identifier of a server-side conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Who wrote a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// One message bubble in the active transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    /// Fresh bot replies animate in; history loaded from the backend does not.
    pub animate: bool,
}

impl TranscriptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender: Sender::User,
            text: text.into(),
            animate: false,
        }
    }

    pub fn bot(text: impl Into<String>, animate: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender: Sender::Bot,
            text: text.into(),
            animate,
        }
    }
}

/// A message as stored server-side (`GET /conversations/{id}/messages`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub sender: Sender,
    pub text: String,
}

/// An entry of the user's conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: Option<String>,
}

impl ConversationSummary {
    /// Title for display, with the web client's fallback for untitled chats.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Conversa sem título")
    }
}

/// The backend's answer to a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReply {
    pub text: String,
    /// Set when the backend created a conversation for this message.
    pub new_conversation_id: Option<ConversationId>,
}

/// Lifecycle status of a single chat request.
///
/// `Idle -> Pending -> {Fulfilled | Cancelled | Failed}`; no request may skip
/// `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Idle,
    Pending,
    Fulfilled,
    Cancelled,
    Failed,
}

impl RequestStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Idle, RequestStatus::Pending)
                | (RequestStatus::Pending, RequestStatus::Fulfilled)
                | (RequestStatus::Pending, RequestStatus::Cancelled)
                | (RequestStatus::Pending, RequestStatus::Failed)
                | (RequestStatus::Fulfilled, RequestStatus::Idle)
                | (RequestStatus::Cancelled, RequestStatus::Idle)
                | (RequestStatus::Failed, RequestStatus::Idle)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Fulfilled | RequestStatus::Cancelled | RequestStatus::Failed
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Idle => write!(f, "idle"),
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Fulfilled => write!(f, "fulfilled"),
            RequestStatus::Cancelled => write!(f, "cancelled"),
            RequestStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Why a send was refused without contacting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyInput,
    /// Another request is still pending.
    Busy,
    /// Voice capture is in progress.
    VoiceInputActive,
}

/// What happened to a send, from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Refused up front; nothing was sent and the transcript is unchanged.
    Rejected(RejectReason),
    /// The reply was appended to the active transcript.
    Fulfilled { reply: String },
    /// The reply arrived for a conversation that is no longer active and was
    /// dropped.
    Discarded,
    /// The request was cancelled before it produced a result. Silent.
    Cancelled,
    /// The send failed; `message` was appended to the transcript.
    Failed { message: String },
}

impl SendOutcome {
    /// Terminal request status for this outcome (`Idle` for rejections,
    /// which never enter `Pending`).
    pub fn status(&self) -> RequestStatus {
        match self {
            SendOutcome::Rejected(_) => RequestStatus::Idle,
            SendOutcome::Fulfilled { .. } => RequestStatus::Fulfilled,
            SendOutcome::Discarded | SendOutcome::Cancelled => RequestStatus::Cancelled,
            SendOutcome::Failed { .. } => RequestStatus::Failed,
        }
    }

    /// Text a speech collaborator should read aloud, if any.
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            SendOutcome::Fulfilled { reply } => Some(reply),
            SendOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Notifications published by the conversation coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// The conversation list changed server-side and should be refetched.
    ConversationListChanged,
    /// A reply (or failure message) was applied to the active transcript.
    ReplyReady { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_roundtrip() {
        for sender in [Sender::User, Sender::Bot] {
            let parsed: Sender = sender.to_string().parse().unwrap();
            assert_eq!(parsed, sender);
        }
        assert!("robot".parse::<Sender>().is_err());
    }

    #[test]
    fn test_sender_serde() {
        let json = serde_json::to_string(&Sender::Bot).unwrap();
        assert_eq!(json, "\"bot\"");
    }

    #[test]
    fn test_conversation_id_is_transparent() {
        let id = ConversationId::from("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_request_status_transitions() {
        use RequestStatus::*;
        assert!(Idle.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Failed.can_transition_to(Idle));
        // No request may skip pending.
        assert!(!Idle.can_transition_to(Fulfilled));
        assert!(!Idle.can_transition_to(Cancelled));
        assert!(!Fulfilled.can_transition_to(Pending));
    }

    #[test]
    fn test_outcome_status_and_speech() {
        let ok = SendOutcome::Fulfilled {
            reply: "Olá".to_string(),
        };
        assert_eq!(ok.status(), RequestStatus::Fulfilled);
        assert_eq!(ok.spoken_text(), Some("Olá"));

        assert_eq!(SendOutcome::Discarded.status(), RequestStatus::Cancelled);
        assert_eq!(SendOutcome::Cancelled.spoken_text(), None);
        assert_eq!(
            SendOutcome::Rejected(RejectReason::Busy).status(),
            RequestStatus::Idle
        );
    }

    #[test]
    fn test_untitled_conversation_fallback() {
        let summary = ConversationSummary {
            id: ConversationId::from("1"),
            title: None,
        };
        assert_eq!(summary.display_title(), "Conversa sem título");
    }
}
