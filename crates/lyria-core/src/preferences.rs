//! Voice and persona selection.
//!
//! Both choices live in the local store. The persona is also kept
//! server-side for signed-in users, and the backend's answer wins when it
//! names a persona the catalog knows.

use std::sync::Arc;

use lyria_types::error::PreferenceError;
use lyria_types::preferences::{DEFAULT_PERSONA, PersonaCatalog, VoiceOption, default_voice, find_voice};
use tracing::{debug, warn};

use crate::backend::LyriaBackend;
use crate::session::SessionManager;
use crate::store::{LocalStore, PERSONA_KEY, VOICE_KEY};

pub struct Preferences<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    session: Arc<SessionManager<B, S>>,
}

impl<B, S> Preferences<B, S>
where
    B: LyriaBackend + 'static,
    S: LocalStore + 'static,
{
    pub fn new(backend: Arc<B>, store: Arc<S>, session: Arc<SessionManager<B, S>>) -> Self {
        Self {
            backend,
            store,
            session,
        }
    }

    /// The selected voice, or the default when none (or an unknown one) is
    /// stored.
    pub async fn voice(&self) -> VoiceOption {
        match self.store.get(VOICE_KEY).await {
            Ok(Some(value)) => find_voice(&value).unwrap_or_else(|| {
                warn!(voice = %value, "ignoring unknown stored voice");
                default_voice()
            }),
            Ok(None) => default_voice(),
            Err(err) => {
                warn!(error = %err, "failed to read stored voice");
                default_voice()
            }
        }
    }

    pub async fn select_voice(&self, value: &str) -> Result<VoiceOption, PreferenceError> {
        let voice = find_voice(value).ok_or_else(|| PreferenceError::UnknownVoice(value.to_string()))?;
        self.store.set(VOICE_KEY, voice.value).await?;
        debug!(voice = voice.value, "voice selected");
        Ok(voice)
    }

    /// Persona catalog served by the backend.
    pub async fn personas(&self) -> Result<PersonaCatalog, PreferenceError> {
        let result = self.backend.list_personas().await;
        Ok(self.session.intercept(result).await?)
    }

    pub async fn stored_persona(&self) -> Option<String> {
        self.store.get(PERSONA_KEY).await.ok().flatten()
    }

    /// Select a persona. Stored locally first; signed-in users also have it
    /// saved server-side, and a failure there is returned with the local
    /// choice kept.
    pub async fn select_persona(
        &self,
        key: &str,
        catalog: &PersonaCatalog,
    ) -> Result<(), PreferenceError> {
        if !catalog.is_empty() && !catalog.contains_key(key) {
            return Err(PreferenceError::UnknownPersona(key.to_string()));
        }
        self.store.set(PERSONA_KEY, key).await?;

        if !self.session.is_authenticated() {
            debug!(persona = key, "persona selected");
            return Ok(());
        }

        let result = self.backend.put_persona(key).await;
        self.session.intercept(result).await?;

        if let Some(mut user) = self.session.current_user() {
            user.persona = Some(key.to_string());
            if let Err(err) = self.session.update_user(user).await {
                warn!(error = %err, "failed to update cached profile persona");
            }
        }
        debug!(persona = key, "persona saved");
        Ok(())
    }

    /// Decide which persona to use: the account's persona when signed in and
    /// known to the catalog, then the stored choice, then `professor`, then
    /// the first catalog entry.
    pub async fn resolve_persona(&self, catalog: &PersonaCatalog) -> String {
        if self.session.is_authenticated() {
            let result = self.backend.get_persona().await;
            match self.session.intercept(result).await {
                Ok(Some(persona)) if catalog.contains_key(&persona) => return persona,
                Ok(Some(persona)) => debug!(persona = %persona, "account persona not in catalog"),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "failed to fetch account persona"),
            }
        }

        if let Some(stored) = self.stored_persona().await {
            if catalog.is_empty() || catalog.contains_key(&stored) {
                return stored;
            }
        }
        if catalog.is_empty() || catalog.contains_key(DEFAULT_PERSONA) {
            return DEFAULT_PERSONA.to_string();
        }
        catalog
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| DEFAULT_PERSONA.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MemoryStore, MockBackend, manager};
    use lyria_types::error::ApiError;
    use lyria_types::session::Credentials;

    fn catalog(keys: &[&str]) -> PersonaCatalog {
        keys.iter()
            .map(|k| (k.to_string(), format!("persona {k}")))
            .collect()
    }

    fn setup(
        backend: MockBackend,
        store: MemoryStore,
    ) -> (
        Arc<MockBackend>,
        Arc<MemoryStore>,
        Arc<SessionManager<MockBackend, MemoryStore>>,
        Preferences<MockBackend, MemoryStore>,
    ) {
        let backend = Arc::new(backend);
        let store = Arc::new(store);
        let session = manager(backend.clone(), store.clone());
        let prefs = Preferences::new(backend.clone(), store.clone(), session.clone());
        (backend, store, session, prefs)
    }

    #[tokio::test]
    async fn voice_defaults_and_ignores_unknown_values() {
        let (_, _, _, prefs) = setup(
            MockBackend::new(),
            MemoryStore::with(&[(VOICE_KEY, "en-US-Robot")]),
        );
        assert_eq!(prefs.voice().await, default_voice());
    }

    #[tokio::test]
    async fn select_voice_validates_and_persists() {
        let (_, store, _, prefs) = setup(MockBackend::new(), MemoryStore::default());

        let err = prefs.select_voice("en-US-Robot").await.unwrap_err();
        assert!(matches!(err, PreferenceError::UnknownVoice(_)));
        assert!(store.value(VOICE_KEY).is_none());

        let voice = prefs.select_voice("pt-BR-AntonioNeural").await.unwrap();
        assert_eq!(voice.label, "Antonio");
        assert_eq!(prefs.voice().await, voice);
    }

    #[tokio::test]
    async fn anonymous_persona_selection_stays_local() {
        let (backend, store, _, prefs) = setup(MockBackend::new(), MemoryStore::default());

        prefs
            .select_persona("empresarial", &catalog(&["professor", "empresarial"]))
            .await
            .unwrap();

        assert_eq!(store.value(PERSONA_KEY).as_deref(), Some("empresarial"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_persona_is_rejected() {
        let (_, store, _, prefs) = setup(MockBackend::new(), MemoryStore::default());

        let err = prefs
            .select_persona("pirata", &catalog(&["professor"]))
            .await
            .unwrap_err();

        assert!(matches!(err, PreferenceError::UnknownPersona(p) if p == "pirata"));
        assert!(store.value(PERSONA_KEY).is_none());
    }

    #[tokio::test]
    async fn signed_in_persona_selection_is_saved_remotely() {
        let (backend, store, session, prefs) =
            setup(MockBackend::signed_in("ana"), MemoryStore::default());
        session
            .login(&Credentials::new("ana@example.com", "pw"))
            .await
            .unwrap();
        session.shutdown();

        prefs
            .select_persona("empresarial", &catalog(&["professor", "empresarial"]))
            .await
            .unwrap();

        assert!(backend.calls().contains(&Call::PutPersona("empresarial".to_string())));
        assert_eq!(store.value(PERSONA_KEY).as_deref(), Some("empresarial"));
        assert_eq!(
            session.current_user().unwrap().persona.as_deref(),
            Some("empresarial")
        );
    }

    #[tokio::test]
    async fn remote_failure_keeps_local_choice() {
        let (backend, store, session, prefs) =
            setup(MockBackend::signed_in("ana"), MemoryStore::default());
        session
            .login(&Credentials::new("ana@example.com", "pw"))
            .await
            .unwrap();
        session.shutdown();
        *backend.put_persona_result.lock().unwrap() = Err(ApiError::Timeout);

        let err = prefs
            .select_persona("empresarial", &PersonaCatalog::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PreferenceError::Api(ApiError::Timeout)));
        assert_eq!(store.value(PERSONA_KEY).as_deref(), Some("empresarial"));
    }

    #[tokio::test]
    async fn resolve_prefers_account_persona() {
        let (backend, _, session, prefs) = setup(
            MockBackend::signed_in("ana"),
            MemoryStore::with(&[(PERSONA_KEY, "professor")]),
        );
        session
            .login(&Credentials::new("ana@example.com", "pw"))
            .await
            .unwrap();
        session.shutdown();
        *backend.persona.lock().unwrap() = Ok(Some("empresarial".to_string()));

        let persona = prefs
            .resolve_persona(&catalog(&["professor", "empresarial"]))
            .await;
        assert_eq!(persona, "empresarial");
    }

    #[tokio::test]
    async fn resolve_falls_back_in_order() {
        let (_, store, _, prefs) = setup(
            MockBackend::new(),
            MemoryStore::with(&[(PERSONA_KEY, "empresarial")]),
        );
        let full = catalog(&["professor", "empresarial"]);
        assert_eq!(prefs.resolve_persona(&full).await, "empresarial");

        store.remove(PERSONA_KEY).await.unwrap();
        assert_eq!(prefs.resolve_persona(&full).await, "professor");

        assert_eq!(
            prefs.resolve_persona(&catalog(&["tecnico", "amigavel"])).await,
            "amigavel"
        );
    }
}
