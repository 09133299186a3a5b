//! Session manager: owns the authentication state and keeps it honest.
//!
//! The manager hydrates a cached profile from the local store at startup,
//! confirms it against `GET /check-session`, re-checks it periodically while
//! signed in, and clears it when any backend call reports a 401. All state
//! mutation goes through this type; consumers read [`SessionSnapshot`]s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lyria_types::config::ClientConfig;
use lyria_types::error::{ApiError, SessionError, StoreError};
use lyria_types::session::{Credentials, SessionEvent, SessionSnapshot, UserProfile};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backend::LyriaBackend;
use crate::event::EventBus;
use crate::session::expiry::ExpiryGuard;
use crate::session::state::SessionState;
use crate::store::{LAST_CHECK_KEY, LocalStore, PERSONA_KEY, USER_KEY, VOICE_KEY};

/// Keys owned by the session itself. Cleared on expiry.
const SESSION_KEYS: [&str; 2] = [USER_KEY, LAST_CHECK_KEY];

/// Everything the client persists. Cleared on logout.
const ALL_KEYS: [&str; 4] = [USER_KEY, PERSONA_KEY, VOICE_KEY, LAST_CHECK_KEY];

pub struct SessionManager<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    revalidate_interval: Duration,
    login_settle: Duration,
    state: Mutex<SessionState>,
    /// Bumped whenever the session is cleared, so a check that was in flight
    /// across a logout or expiry cannot resurrect the old session.
    epoch: AtomicU64,
    expiry: ExpiryGuard,
    events: EventBus<SessionEvent>,
    revalidation: Mutex<Option<CancellationToken>>,
    this: Weak<Self>,
}

impl<B, S> SessionManager<B, S>
where
    B: LyriaBackend + 'static,
    S: LocalStore + 'static,
{
    pub fn new(backend: Arc<B>, store: Arc<S>, config: &ClientConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            backend,
            store,
            revalidate_interval: config.revalidate_interval(),
            login_settle: config.login_settle(),
            state: Mutex::new(SessionState::new()),
            epoch: AtomicU64::new(0),
            expiry: ExpiryGuard::new(config.expiry_notice_window()),
            events: EventBus::default(),
            revalidation: Mutex::new(None),
            this: this.clone(),
        })
    }

    /// Restore the persisted session and confirm it with the backend.
    ///
    /// A cached user is trusted optimistically, then checked exactly once
    /// before `loading` clears. Nothing cached means no backend call at all.
    pub async fn initialize(&self) -> SessionSnapshot {
        if let Some(user) = self.load_persisted_user().await {
            let last_checked_at = self.load_last_check().await;
            debug!(user = %user.name, "restored persisted session");
            self.lock_state().hydrate(user, last_checked_at);
            // A restored session that fails its first check was never live,
            // so it ends without an expiry notice.
            self.confirm(None, true, false).await;
        }
        self.lock_state().finish_loading();
        self.snapshot()
    }

    /// Ask the backend whether the session is still valid.
    ///
    /// Returns the resulting authenticated flag.
    pub async fn validate(&self, log_events: bool) -> bool {
        self.confirm(None, log_events, true).await
    }

    /// Sign in and confirm the new session.
    ///
    /// The backend sets the session cookie on `POST /login`; the manager
    /// waits `login_settle` before checking it so the server has committed
    /// the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, SessionError> {
        let result = self.backend.login(credentials).await?;
        if !result.is_accepted() {
            warn!(status = %result.status, "login rejected by backend");
            return Err(SessionError::LoginRejected(result.status));
        }

        let seed = UserProfile {
            name: result
                .user_name
                .unwrap_or_else(|| credentials.email.clone()),
            email: Some(credentials.email.clone()),
            persona: result.persona,
        };

        if !self.login_settle.is_zero() {
            tokio::time::sleep(self.login_settle).await;
        }

        // The new cookie replaces whatever session was active.
        self.clear(false, &SESSION_KEYS).await;

        if !self.confirm(Some(seed), true, false).await {
            warn!(email = %credentials.email, "login accepted but session was not confirmed");
            self.clear(false, &SESSION_KEYS).await;
            return Err(SessionError::CreationFailed);
        }

        let user = self.current_user().ok_or(SessionError::CreationFailed)?;
        info!(user = %user.name, "logged in");
        Ok(user)
    }

    /// Sign out. Local state is cleared even when the backend call fails.
    pub async fn logout(&self) {
        if let Err(err) = self.backend.logout().await {
            warn!(error = %err, "logout request failed, clearing local session anyway");
        }
        self.clear(false, &ALL_KEYS).await;
        info!("logged out");
        self.events.publish(SessionEvent::LoggedOut);
    }

    /// Report a 401 seen by any backend call.
    ///
    /// Returns true if this call ended an authenticated session. A 401 while
    /// signed out is ignored.
    ///
    /// Only the session keys are cleared: no `/logout` is posted and the
    /// persona and voice preferences stay on disk. Use [`Self::logout`] to
    /// forget everything.
    pub async fn on_unauthorized(&self) -> bool {
        if !self.is_authenticated() {
            trace!("ignoring 401 while signed out");
            return false;
        }
        self.clear(true, &SESSION_KEYS).await
    }

    /// Pass a backend result through, running expiry handling on a 401.
    pub async fn intercept<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if matches!(result, Err(ApiError::Unauthorized)) {
            self.on_unauthorized().await;
        }
        result
    }

    /// Replace the signed-in user's cached profile, in memory and on disk.
    ///
    /// Returns false (and changes nothing) when signed out.
    pub async fn update_user(&self, user: UserProfile) -> Result<bool, SessionError> {
        let replaced = self.lock_state().replace_user(user.clone());
        if !replaced {
            return Ok(false);
        }
        let json = serde_json::to_string(&user)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(USER_KEY, &json).await?;
        debug!(user = %user.name, "updated cached profile");
        Ok(true)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_state().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock_state().user().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Stop background revalidation without touching the session.
    pub fn shutdown(&self) {
        self.stop_revalidation();
    }

    /// Whether the periodic check is currently scheduled.
    pub fn is_revalidating(&self) -> bool {
        self.revalidation
            .lock()
            .expect("revalidation lock poisoned")
            .is_some()
    }

    // -- internals -----------------------------------------------------------

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }

    /// Run one check-session round trip and apply its answer.
    ///
    /// `seed` is the identity to confirm when the state holds none yet
    /// (login); otherwise the cached user is merged with the server's answer.
    /// `notify_expiry` controls whether a rejected session publishes `Expired`.
    async fn confirm(&self, seed: Option<UserProfile>, log_events: bool, notify_expiry: bool) -> bool {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = self.backend.check_session().await;

        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("session changed during check, discarding result");
            return self.is_authenticated();
        }

        match result {
            Ok(check) if check.authenticated => {
                let cached = seed.or_else(|| self.current_user());
                let user = match (cached, check.user_name) {
                    (Some(cached), name) => {
                        cached.merged_with(name.as_deref(), check.email.as_deref())
                    }
                    (None, Some(name)) => UserProfile {
                        name,
                        email: check.email,
                        persona: None,
                    },
                    (None, None) => {
                        warn!("check-session confirmed a session without a user");
                        self.clear(false, &SESSION_KEYS).await;
                        return false;
                    }
                };
                if log_events {
                    debug!(user = %user.name, "session confirmed");
                } else {
                    trace!(user = %user.name, "session confirmed");
                }
                self.apply_authenticated(user).await;
                true
            }
            Ok(_) | Err(ApiError::Unauthorized) => {
                if log_events {
                    info!("backend reports no active session");
                }
                self.clear(notify_expiry, &SESSION_KEYS).await;
                false
            }
            Err(err) => {
                if self.is_authenticated() {
                    warn!(error = %err, "session check failed, keeping current session");
                    self.start_revalidation();
                    true
                } else {
                    warn!(error = %err, "session check failed");
                    self.clear(false, &SESSION_KEYS).await;
                    false
                }
            }
        }
    }

    async fn apply_authenticated(&self, user: UserProfile) {
        let now = Utc::now();
        let newly = self.lock_state().authenticate(user.clone(), now);

        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(err) = self.store.set(USER_KEY, &json).await {
                    warn!(error = %err, "failed to persist user");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize user"),
        }
        if let Err(err) = self.store.set(LAST_CHECK_KEY, &now.to_rfc3339()).await {
            warn!(error = %err, "failed to persist last session check");
        }

        if newly {
            self.expiry.reset();
            self.events.publish(SessionEvent::Authenticated { user });
        }
        self.start_revalidation();
    }

    /// Clear memory and the given keys, stop the timer. With `notify`, an
    /// authenticated session ending here publishes `Expired` (at most once
    /// per window). Returns whether the state was authenticated.
    async fn clear(&self, notify: bool, keys: &[&str]) -> bool {
        let was_authenticated = self.lock_state().clear();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.stop_revalidation();

        for key in keys {
            if let Err(err) = self.store.remove(key).await {
                warn!(key, error = %err, "failed to remove persisted key");
            }
        }

        if notify && was_authenticated && self.expiry.try_fire() {
            warn!("session expired");
            self.events.publish(SessionEvent::Expired);
        }
        was_authenticated
    }

    async fn load_persisted_user(&self) -> Option<UserProfile> {
        let raw = match self.store.get(USER_KEY).await {
            Ok(value) => value?,
            Err(err) => {
                warn!(error = %err, "failed to read persisted user");
                return None;
            }
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) if !user.name.trim().is_empty() => Some(user),
            Ok(_) => {
                warn!("discarding persisted user without a name");
                self.remove_quietly(USER_KEY).await;
                None
            }
            Err(err) => {
                warn!(error = %err, "discarding corrupt persisted user");
                self.remove_quietly(USER_KEY).await;
                None
            }
        }
    }

    async fn load_last_check(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(LAST_CHECK_KEY).await.ok()??;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .ok()
    }

    async fn remove_quietly(&self, key: &str) {
        if let Err(err) = self.store.remove(key).await {
            warn!(key, error = %err, "failed to remove persisted key");
        }
    }

    /// Schedule the periodic check. Idempotent.
    fn start_revalidation(&self) {
        let mut slot = self.revalidation.lock().expect("revalidation lock poisoned");
        if slot.is_some() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime, periodic session checks disabled");
            return;
        };

        let token = CancellationToken::new();
        handle.spawn(revalidation_loop(
            self.this.clone(),
            self.revalidate_interval,
            token.clone(),
        ));
        *slot = Some(token);
        debug!(interval_secs = self.revalidate_interval.as_secs(), "periodic session check started");
    }

    fn stop_revalidation(&self) {
        let token = self
            .revalidation
            .lock()
            .expect("revalidation lock poisoned")
            .take();
        if let Some(token) = token {
            token.cancel();
            debug!("periodic session check stopped");
        }
    }
}

async fn revalidation_loop<B, S>(
    manager: Weak<SessionManager<B, S>>,
    interval: Duration,
    token: CancellationToken,
) where
    B: LyriaBackend + 'static,
    S: LocalStore + 'static,
{
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        let Some(manager) = manager.upgrade() else {
            break;
        };
        if !manager.validate(false).await {
            break;
        }
    }
}

impl<B, S> Drop for SessionManager<B, S> {
    fn drop(&mut self) {
        if let Ok(slot) = self.revalidation.get_mut() {
            if let Some(token) = slot.take() {
                token.cancel();
            }
        }
    }
}
