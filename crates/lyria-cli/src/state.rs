//! Application state wiring the session manager, conversation coordinator
//! and preferences to the concrete HTTP backend and JSON file store.

use std::path::PathBuf;
use std::sync::Arc;

use lyria_core::chat::ConversationCoordinator;
use lyria_core::preferences::Preferences;
use lyria_core::session::SessionManager;
use lyria_core::store::LocalStore;
use lyria_infra::config::load_client_config;
use lyria_infra::filesystem::{resolve_data_dir, store_path};
use lyria_infra::http::{COOKIE_KEY, HttpLyriaBackend};
use lyria_infra::storage::JsonFileStore;
use lyria_types::config::ClientConfig;
use tracing::{debug, warn};

pub type ConcreteSessionManager = SessionManager<HttpLyriaBackend, JsonFileStore>;
pub type ConcreteCoordinator = ConversationCoordinator<HttpLyriaBackend, JsonFileStore>;
pub type ConcretePreferences = Preferences<HttpLyriaBackend, JsonFileStore>;

/// Shared state for every CLI command.
pub struct AppState {
    pub backend: Arc<HttpLyriaBackend>,
    pub store: Arc<JsonFileStore>,
    pub session: Arc<ConcreteSessionManager>,
    pub coordinator: Arc<ConcreteCoordinator>,
    pub preferences: ConcretePreferences,
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Build the state and restore the previous session.
    ///
    /// The backend's session cookie is reloaded from the store before the
    /// session manager runs its first check, so a login survives between
    /// invocations.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_client_config(&data_dir).await;
        let store = Arc::new(JsonFileStore::new(store_path(&data_dir)));
        let backend = Arc::new(HttpLyriaBackend::new(&config)?);

        match store.get(COOKIE_KEY).await {
            Ok(Some(header)) => {
                backend.restore_session_cookies(&header);
                debug!("restored session cookie");
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to read stored session cookie"),
        }

        let session = SessionManager::new(backend.clone(), store.clone(), &config);
        let coordinator = Arc::new(ConversationCoordinator::new(
            backend.clone(),
            session.clone(),
        ));
        let preferences = Preferences::new(backend.clone(), store.clone(), session.clone());

        session.initialize().await;

        Ok(Self {
            backend,
            store,
            session,
            coordinator,
            preferences,
            config,
            data_dir,
        })
    }

    /// Persist the backend cookie while signed in; drop it otherwise.
    pub async fn save_session_cookie(&self) {
        let result = match self.backend.session_cookies() {
            Some(header) if self.session.is_authenticated() => {
                self.store.set(COOKIE_KEY, &header).await
            }
            _ => self.store.remove(COOKIE_KEY).await,
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to persist session cookie");
        }
    }

    /// Stop background revalidation and persist the cookie.
    pub async fn shutdown(&self) {
        self.coordinator.cancel_pending();
        self.session.shutdown();
        self.save_session_cookie().await;
    }
}
