//! LyriaBackend trait definition.
//!
//! The remote assistant backend as seen by the client. Every authenticated
//! call relies on an ambient cookie attached by the transport; a 401 from any
//! of them surfaces as [`ApiError::Unauthorized`].

use lyria_types::chat::{ConversationId, ConversationSummary, MessageReply, StoredMessage};
use lyria_types::error::ApiError;
use lyria_types::preferences::PersonaCatalog;
use lyria_types::session::{Credentials, LoginResult, SessionCheck};
use tokio_util::sync::CancellationToken;

/// Trait for the Lyria HTTP backend.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in lyria-infra (e.g., `HttpLyriaBackend`).
pub trait LyriaBackend: Send + Sync {
    /// `POST /login`.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<LoginResult, ApiError>> + Send;

    /// `GET /check-session`.
    fn check_session(
        &self,
    ) -> impl std::future::Future<Output = Result<SessionCheck, ApiError>> + Send;

    /// `POST /logout`.
    fn logout(&self) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;

    /// `POST /message` for a signed-in user.
    ///
    /// `conversation_id` is `None` for the first message of a new
    /// conversation. Must return [`ApiError::Cancelled`] promptly once
    /// `cancel` fires.
    fn send_message(
        &self,
        user: &str,
        conversation_id: Option<&ConversationId>,
        text: &str,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<MessageReply, ApiError>> + Send;

    /// Anonymous equivalent of [`send_message`](Self::send_message).
    fn send_anonymous(
        &self,
        text: &str,
        persona: &str,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<MessageReply, ApiError>> + Send;

    /// `GET /conversations?user=...`.
    fn list_conversations(
        &self,
        user: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, ApiError>> + Send;

    /// `GET /conversations/{id}/messages`.
    fn conversation_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, ApiError>> + Send;

    /// `DELETE /conversations/{id}`.
    fn delete_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;

    /// `GET /personas`.
    fn list_personas(
        &self,
    ) -> impl std::future::Future<Output = Result<PersonaCatalog, ApiError>> + Send;

    /// `GET /persona` for the signed-in user.
    fn get_persona(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>, ApiError>> + Send;

    /// `PUT /persona` for the signed-in user.
    fn put_persona(
        &self,
        persona: &str,
    ) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;
}
