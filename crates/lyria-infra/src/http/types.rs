//! Lyria backend wire types.
//!
//! These mirror the JSON bodies of the backend (Portuguese field names) and
//! convert into the domain types of `lyria-types`. They are not used outside
//! the HTTP client.

use std::fmt;

use serde::{Deserialize, Serialize};

use lyria_types::chat::{ConversationId, ConversationSummary, MessageReply, Sender, StoredMessage};
use lyria_types::preferences::PersonaCatalog;
use lyria_types::session::{LoginResult, SessionCheck};

/// Body of `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub senha: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    #[serde(default)]
    pub usuario: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
}

impl From<LoginResponse> for LoginResult {
    fn from(value: LoginResponse) -> Self {
        LoginResult {
            status: value.status,
            user_name: value.usuario,
            persona: value.persona,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSessionResponse {
    #[serde(default)]
    pub autenticado: bool,
    #[serde(default)]
    pub usuario: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<CheckSessionResponse> for SessionCheck {
    fn from(value: CheckSessionResponse) -> Self {
        SessionCheck {
            authenticated: value.autenticado,
            user_name: value.usuario,
            email: value.email,
        }
    }
}

/// Body of `POST /message`.
#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub pergunta: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversa_id: Option<&'a str>,
    pub usuario: &'a str,
}

/// Body of `POST /message/anonymous`.
#[derive(Debug, Serialize)]
pub struct AnonymousMessageRequest<'a> {
    pub pergunta: &'a str,
    pub persona: &'a str,
}

/// Conversation ids arrive as strings or as numbers depending on the
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireId::Text(s) => f.write_str(s),
            WireId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<WireId> for ConversationId {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(s) => ConversationId(s),
            WireId::Number(n) => ConversationId(n.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub resposta: String,
    #[serde(default)]
    pub new_conversa_id: Option<WireId>,
}

impl From<MessageResponse> for MessageReply {
    fn from(value: MessageResponse) -> Self {
        MessageReply {
            text: value.resposta,
            new_conversation_id: value.new_conversa_id.map(ConversationId::from),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireConversation {
    pub id: WireId,
    #[serde(default)]
    pub titulo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsResponse {
    #[serde(default)]
    pub conversas: Vec<WireConversation>,
}

impl From<ConversationsResponse> for Vec<ConversationSummary> {
    fn from(value: ConversationsResponse) -> Self {
        value
            .conversas
            .into_iter()
            .map(|c| ConversationSummary {
                id: c.id.into(),
                title: c.titulo.filter(|t| !t.trim().is_empty()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub mensagens: Vec<WireMessage>,
}

impl From<MessagesResponse> for Vec<StoredMessage> {
    fn from(value: MessagesResponse) -> Self {
        value
            .mensagens
            .into_iter()
            .map(|m| StoredMessage {
                // Anything that is not the bot was typed by the user.
                sender: if m.sender.eq_ignore_ascii_case("bot") {
                    Sender::Bot
                } else {
                    Sender::User
                },
                text: m.text,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonasResponse {
    #[serde(default)]
    pub personas: PersonaCatalog,
}

/// Body of `GET /persona` and `PUT /persona`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaBody {
    #[serde(default)]
    pub persona: Option<String>,
}
