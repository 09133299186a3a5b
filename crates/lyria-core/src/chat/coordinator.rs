//! Conversation request coordinator.
//!
//! Owns the active conversation, its transcript, and the single chat request
//! that may be in flight for it. A reply is only applied if the conversation
//! it was sent from is still the active one when it arrives; anything else is
//! dropped. Switching conversations cancels the pending request.

use std::sync::{Arc, Mutex, MutexGuard};

use lyria_types::chat::{
    ConversationId, ConversationSummary, CoordinatorEvent, RejectReason, RequestStatus,
    SEND_FAILURE_MESSAGE, SendOutcome, TranscriptMessage,
};
use lyria_types::error::{ApiError, ChatError};
use lyria_types::preferences::DEFAULT_PERSONA;
use lyria_types::session::SessionSnapshot;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::backend::LyriaBackend;
use crate::chat::request::RequestTracker;
use crate::chat::transcript::Transcript;
use crate::event::EventBus;
use crate::session::SessionManager;
use crate::store::LocalStore;

struct ChatState {
    active: Option<ConversationId>,
    transcript: Transcript,
    requests: RequestTracker,
    voice_input: bool,
    persona: String,
}

pub struct ConversationCoordinator<B, S> {
    backend: Arc<B>,
    session: Arc<SessionManager<B, S>>,
    state: Mutex<ChatState>,
    events: EventBus<CoordinatorEvent>,
}

impl<B, S> ConversationCoordinator<B, S>
where
    B: LyriaBackend + 'static,
    S: LocalStore + 'static,
{
    pub fn new(backend: Arc<B>, session: Arc<SessionManager<B, S>>) -> Self {
        Self {
            backend,
            session,
            state: Mutex::new(ChatState {
                active: None,
                transcript: Transcript::new(),
                requests: RequestTracker::new(),
                voice_input: false,
                persona: DEFAULT_PERSONA.to_string(),
            }),
            events: EventBus::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().expect("chat state lock poisoned")
    }

    /// Send `text` in the active conversation.
    ///
    /// Refused while another request is pending, while voice input is
    /// active, or for blank input. Signed-in sessions use the authenticated
    /// endpoint with the session's user name; otherwise the anonymous
    /// endpoint with the selected persona.
    pub async fn send(&self, text: &str, session: &SessionSnapshot) -> SendOutcome {
        self.dispatch(text, session, false).await
    }

    /// Like [`send`](Self::send), but cancels a pending request instead of
    /// being refused by it.
    pub async fn supersede(&self, text: &str, session: &SessionSnapshot) -> SendOutcome {
        self.dispatch(text, session, true).await
    }

    async fn dispatch(&self, text: &str, session: &SessionSnapshot, replace: bool) -> SendOutcome {
        let text = text.trim();
        let (generation, token, sent_from, persona) = {
            let mut state = self.lock();
            if text.is_empty() {
                return SendOutcome::Rejected(RejectReason::EmptyInput);
            }
            if state.voice_input {
                return SendOutcome::Rejected(RejectReason::VoiceInputActive);
            }
            if state.requests.is_pending() && !replace {
                debug!("send refused, a request is already pending");
                return SendOutcome::Rejected(RejectReason::Busy);
            }

            let sent_from = state.active.clone();
            state.transcript.push(TranscriptMessage::user(text));
            let (generation, token) = state.requests.begin(sent_from.clone());
            (generation, token, sent_from, state.persona.clone())
        };

        let authenticated_user = session.authenticated_user();
        debug!(
            generation,
            conversation = ?sent_from,
            authenticated = authenticated_user.is_some(),
            "sending message"
        );

        let call = async {
            match authenticated_user {
                Some(user) => {
                    self.backend
                        .send_message(user, sent_from.as_ref(), text, &token)
                        .await
                }
                None => self.backend.send_anonymous(text, &persona, &token).await,
            }
        };
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ApiError::Cancelled),
            result = call => result,
        };
        let result = self.session.intercept(result).await;

        let mut events = Vec::new();
        let outcome = {
            let mut state = self.lock();
            if state.active != sent_from {
                state.requests.finish(generation, RequestStatus::Cancelled);
                debug!(generation, "reply arrived for an inactive conversation, discarding");
                SendOutcome::Discarded
            } else if token.is_cancelled() || matches!(result, Err(ApiError::Cancelled)) {
                state.requests.finish(generation, RequestStatus::Cancelled);
                debug!(generation, "request cancelled");
                SendOutcome::Cancelled
            } else {
                match result {
                    Ok(reply) => {
                        state.requests.finish(generation, RequestStatus::Fulfilled);
                        if authenticated_user.is_some() && sent_from.is_none() {
                            if let Some(id) = reply.new_conversation_id {
                                info!(conversation = %id, "new conversation created");
                                state.active = Some(id);
                                events.push(CoordinatorEvent::ConversationListChanged);
                            }
                        }
                        state
                            .transcript
                            .push(TranscriptMessage::bot(reply.text.clone(), true));
                        events.push(CoordinatorEvent::ReplyReady {
                            text: reply.text.clone(),
                        });
                        SendOutcome::Fulfilled { reply: reply.text }
                    }
                    Err(err) => {
                        state.requests.finish(generation, RequestStatus::Failed);
                        warn!(generation, error = %err, "send failed");
                        state
                            .transcript
                            .push(TranscriptMessage::bot(SEND_FAILURE_MESSAGE, true));
                        events.push(CoordinatorEvent::ReplyReady {
                            text: SEND_FAILURE_MESSAGE.to_string(),
                        });
                        SendOutcome::Failed {
                            message: SEND_FAILURE_MESSAGE.to_string(),
                        }
                    }
                }
            }
        };

        for event in events {
            self.events.publish(event);
        }
        outcome
    }

    /// Cancel the pending request, if any. Returns true if one was cancelled.
    pub fn cancel_pending(&self) -> bool {
        self.lock().requests.cancel_pending()
    }

    /// Leave the active conversation for a fresh, unidentified one.
    pub fn start_new_conversation(&self) {
        let mut state = self.lock();
        state.requests.cancel_pending();
        state.active = None;
        state.transcript.clear();
        debug!("started new conversation");
    }

    /// Make `id` the active conversation and load its history.
    ///
    /// A pending request is cancelled first. On a fetch failure the current
    /// conversation is left as it was.
    pub async fn load_conversation(&self, id: &ConversationId) -> Result<(), ChatError> {
        self.cancel_pending();

        let result = self.backend.conversation_messages(id).await;
        let history = self.session.intercept(result).await?;

        let mut state = self.lock();
        state.requests.cancel_pending();
        state.active = Some(id.clone());
        state.transcript.replace_with_history(history);
        debug!(conversation = %id, messages = state.transcript.len(), "loaded conversation");
        Ok(())
    }

    /// Delete a conversation server-side. Deleting the active conversation
    /// resets to a fresh one.
    pub async fn delete_conversation(&self, id: &ConversationId) -> Result<(), ChatError> {
        let result = self.backend.delete_conversation(id).await;
        self.session.intercept(result).await?;

        let was_active = self.lock().active.as_ref() == Some(id);
        if was_active {
            self.start_new_conversation();
        }
        info!(conversation = %id, "deleted conversation");
        self.events.publish(CoordinatorEvent::ConversationListChanged);
        Ok(())
    }

    /// The signed-in user's conversations. Empty when signed out.
    pub async fn refresh_conversations(
        &self,
        session: &SessionSnapshot,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let Some(user) = session.authenticated_user() else {
            return Ok(Vec::new());
        };
        let result = self.backend.list_conversations(user).await;
        Ok(self.session.intercept(result).await?)
    }

    /// Mark voice capture as in progress (sends are refused meanwhile).
    ///
    /// Driven by whatever speech capture front end is attached; the terminal
    /// client has none and leaves it off.
    pub fn set_voice_input(&self, active: bool) {
        self.lock().voice_input = active;
    }

    /// Persona used for anonymous sends.
    pub fn set_persona(&self, persona: impl Into<String>) {
        self.lock().persona = persona.into();
    }

    pub fn persona(&self) -> String {
        self.lock().persona.clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptMessage> {
        self.lock().transcript.messages().to_vec()
    }

    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.lock().active.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().requests.is_pending()
    }

    pub fn status(&self) -> RequestStatus {
        self.lock().requests.status()
    }

    pub fn last_status(&self) -> Option<RequestStatus> {
        self.lock().requests.last_status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }
}
