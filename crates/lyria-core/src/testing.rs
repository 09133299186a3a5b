//! Hand-written test doubles for the backend and local store ports.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lyria_types::chat::{ConversationId, ConversationSummary, MessageReply, StoredMessage};
use lyria_types::config::ClientConfig;
use lyria_types::error::{ApiError, StoreError};
use lyria_types::preferences::PersonaCatalog;
use lyria_types::session::{Credentials, LoginResult, SessionCheck, UserProfile};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::backend::LyriaBackend;
use crate::session::SessionManager;
use crate::store::LocalStore;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login(String),
    CheckSession,
    Logout,
    SendMessage {
        user: String,
        conversation_id: Option<ConversationId>,
        text: String,
    },
    SendAnonymous {
        text: String,
        persona: String,
    },
    ListConversations(String),
    ConversationMessages(ConversationId),
    DeleteConversation(ConversationId),
    ListPersonas,
    GetPersona,
    PutPersona(String),
}

/// Scriptable backend.
///
/// Session checks pop from a queue and fall back to `check_default` once it
/// is empty. With `hold_checks` set, a check waits for
/// [`MockBackend::release_check`] before answering. Sends can be held until [`MockBackend::release`] is called; a
/// held send honours its cancellation token unless `ignore_cancel` is set.
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    pub login_result: Mutex<Result<LoginResult, ApiError>>,
    pub check_queue: Mutex<VecDeque<Result<SessionCheck, ApiError>>>,
    pub check_default: Mutex<Result<SessionCheck, ApiError>>,
    pub logout_result: Mutex<Result<(), ApiError>>,
    pub replies: Mutex<VecDeque<Result<MessageReply, ApiError>>>,
    pub conversations: Mutex<Result<Vec<ConversationSummary>, ApiError>>,
    pub history: Mutex<Result<Vec<StoredMessage>, ApiError>>,
    pub delete_result: Mutex<Result<(), ApiError>>,
    pub personas: Mutex<PersonaCatalog>,
    pub persona: Mutex<Result<Option<String>, ApiError>>,
    pub put_persona_result: Mutex<Result<(), ApiError>>,
    pub hold_sends: AtomicBool,
    pub ignore_cancel: AtomicBool,
    pub hold_checks: AtomicBool,
    release: Notify,
    send_started: Notify,
    check_release: Notify,
    check_started: Notify,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            login_result: Mutex::new(Ok(LoginResult {
                status: "ok".to_string(),
                user_name: Some("ana".to_string()),
                persona: Some("professor".to_string()),
            })),
            check_queue: Mutex::new(VecDeque::new()),
            check_default: Mutex::new(Ok(SessionCheck::default())),
            logout_result: Mutex::new(Ok(())),
            replies: Mutex::new(VecDeque::new()),
            conversations: Mutex::new(Ok(Vec::new())),
            history: Mutex::new(Ok(Vec::new())),
            delete_result: Mutex::new(Ok(())),
            personas: Mutex::new(PersonaCatalog::new()),
            persona: Mutex::new(Ok(None)),
            put_persona_result: Mutex::new(Ok(())),
            hold_sends: AtomicBool::new(false),
            ignore_cancel: AtomicBool::new(false),
            hold_checks: AtomicBool::new(false),
            release: Notify::new(),
            send_started: Notify::new(),
            check_release: Notify::new(),
            check_started: Notify::new(),
        }
    }

    /// Backend whose check-session always confirms `name`.
    pub fn signed_in(name: &str) -> Self {
        let backend = Self::new();
        *backend.check_default.lock().unwrap() = Ok(confirmed(name));
        backend
    }

    pub fn push_check(&self, result: Result<SessionCheck, ApiError>) {
        self.check_queue.lock().unwrap().push_back(result);
    }

    pub fn set_check_default(&self, result: Result<SessionCheck, ApiError>) {
        *self.check_default.lock().unwrap() = result;
    }

    pub fn push_reply(&self, result: Result<MessageReply, ApiError>) {
        self.replies.lock().unwrap().push_back(result);
    }

    /// Let one held send complete.
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Wait until a send has reached the backend.
    pub async fn wait_for_send(&self) {
        self.send_started.notified().await;
    }

    /// Let one held session check answer.
    pub fn release_check(&self) {
        self.check_release.notify_one();
    }

    /// Wait until a session check has reached the backend.
    pub async fn wait_for_check(&self) {
        self.check_started.notified().await;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_reply(&self) -> Result<MessageReply, ApiError> {
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(MessageReply {
                text: "Olá!".to_string(),
                new_conversation_id: None,
            })
        })
    }

    async fn complete_send(&self, cancel: &CancellationToken) -> Result<MessageReply, ApiError> {
        self.send_started.notify_one();
        if self.hold_sends.load(Ordering::SeqCst) {
            if self.ignore_cancel.load(Ordering::SeqCst) {
                self.release.notified().await;
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = self.release.notified() => {}
                }
            }
        }
        self.next_reply()
    }
}

pub fn confirmed(name: &str) -> SessionCheck {
    SessionCheck {
        authenticated: true,
        user_name: Some(name.to_string()),
        email: None,
    }
}

pub fn profile(name: &str) -> UserProfile {
    UserProfile {
        name: name.to_string(),
        email: Some(format!("{name}@example.com")),
        persona: Some("professor".to_string()),
    }
}

impl LyriaBackend for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, ApiError> {
        self.record(Call::Login(credentials.email.clone()));
        self.login_result.lock().unwrap().clone()
    }

    async fn check_session(&self) -> Result<SessionCheck, ApiError> {
        self.record(Call::CheckSession);
        self.check_started.notify_one();
        if self.hold_checks.load(Ordering::SeqCst) {
            self.check_release.notified().await;
        }
        let queued = self.check_queue.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.check_default.lock().unwrap().clone())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record(Call::Logout);
        self.logout_result.lock().unwrap().clone()
    }

    async fn send_message(
        &self,
        user: &str,
        conversation_id: Option<&ConversationId>,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<MessageReply, ApiError> {
        self.record(Call::SendMessage {
            user: user.to_string(),
            conversation_id: conversation_id.cloned(),
            text: text.to_string(),
        });
        self.complete_send(cancel).await
    }

    async fn send_anonymous(
        &self,
        text: &str,
        persona: &str,
        cancel: &CancellationToken,
    ) -> Result<MessageReply, ApiError> {
        self.record(Call::SendAnonymous {
            text: text.to_string(),
            persona: persona.to_string(),
        });
        self.complete_send(cancel).await
    }

    async fn list_conversations(&self, user: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        self.record(Call::ListConversations(user.to_string()));
        self.conversations.lock().unwrap().clone()
    }

    async fn conversation_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, ApiError> {
        self.record(Call::ConversationMessages(conversation_id.clone()));
        self.history.lock().unwrap().clone()
    }

    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<(), ApiError> {
        self.record(Call::DeleteConversation(conversation_id.clone()));
        self.delete_result.lock().unwrap().clone()
    }

    async fn list_personas(&self) -> Result<PersonaCatalog, ApiError> {
        self.record(Call::ListPersonas);
        Ok(self.personas.lock().unwrap().clone())
    }

    async fn get_persona(&self) -> Result<Option<String>, ApiError> {
        self.record(Call::GetPersona);
        self.persona.lock().unwrap().clone()
    }

    async fn put_persona(&self, persona: &str) -> Result<(), ApiError> {
        self.record(Call::PutPersona(persona.to_string()));
        self.put_persona_result.lock().unwrap().clone()
    }
}

/// In-memory `LocalStore`.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut values = store.values.lock().unwrap();
            for (k, v) in entries {
                values.insert(k.to_string(), v.to_string());
            }
        }
        store
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Timing suitable for tests: no login pause, short expiry window.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        login_settle_ms: 0,
        expiry_notice_window_ms: 1_000,
        ..ClientConfig::default()
    }
}

pub fn manager(
    backend: Arc<MockBackend>,
    store: Arc<MemoryStore>,
) -> Arc<SessionManager<MockBackend, MemoryStore>> {
    SessionManager::new(backend, store, &test_config())
}
