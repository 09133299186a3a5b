//! HttpLyriaBackend -- concrete [`LyriaBackend`] implementation over reqwest.
//!
//! Authenticated endpoints rely on the session cookie set by `POST /login`.
//! The client keeps it in a [`Jar`] that can be exported and restored, so a
//! session survives between CLI invocations the way it survives page reloads
//! in a browser.
//!
//! The password is only exposed while the login body is serialized.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use lyria_core::backend::LyriaBackend;
use lyria_types::chat::{ConversationId, ConversationSummary, MessageReply, StoredMessage};
use lyria_types::config::ClientConfig;
use lyria_types::error::ApiError;
use lyria_types::preferences::PersonaCatalog;
use lyria_types::session::{Credentials, LoginResult, SessionCheck};

use super::types::{
    AnonymousMessageRequest, CheckSessionResponse, ConversationsResponse, LoginRequest,
    LoginResponse, MessageRequest, MessageResponse, MessagesResponse, PersonaBody,
    PersonasResponse,
};

/// Local store key holding the exported session cookie header.
pub const COOKIE_KEY: &str = "lyriaSessionCookie";

/// Lyria backend over HTTP.
///
/// Not `Debug`: the cookie jar holds the session credential.
pub struct HttpLyriaBackend {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl HttpLyriaBackend {
    /// Create a backend for `config.base_url` with the configured timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base = config.base_url.trim_end_matches('/');
        let base_url = Url::parse(base)
            .map_err(|e| ApiError::Transport(format!("invalid base URL '{base}': {e}")))?;

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `Cookie` header the backend would receive, if any cookie is set.
    pub fn session_cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Load cookies previously exported with [`session_cookies`](Self::session_cookies).
    pub fn restore_session_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &self.base_url);
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Send a request and map non-success statuses. A 401 is always
    /// [`ApiError::Unauthorized`].
    async fn fetch(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.fetch(request).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Decode(format!("failed to parse response: {e}"))
            }
        })
    }

    /// Like [`fetch_json`](Self::fetch_json), but gives up as soon as
    /// `cancel` fires. Dropping the in-flight future closes the connection.
    async fn fetch_json_cancellable<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.fetch_json(request) => result,
        }
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}

impl LyriaBackend for HttpLyriaBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, ApiError> {
        tracing::debug!(email = %credentials.email, "POST /login");
        let body = LoginRequest {
            email: &credentials.email,
            senha: credentials.password.expose_secret(),
        };
        let response: LoginResponse = self
            .fetch_json(self.client.post(self.url("/login")).json(&body))
            .await?;
        Ok(response.into())
    }

    async fn check_session(&self) -> Result<SessionCheck, ApiError> {
        tracing::trace!("GET /check-session");
        let response: CheckSessionResponse = self
            .fetch_json(self.client.get(self.url("/check-session")))
            .await?;
        Ok(response.into())
    }

    async fn logout(&self) -> Result<(), ApiError> {
        tracing::debug!("POST /logout");
        self.fetch(self.client.post(self.url("/logout"))).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        user: &str,
        conversation_id: Option<&ConversationId>,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<MessageReply, ApiError> {
        tracing::debug!(conversation = ?conversation_id, "POST /message");
        let body = MessageRequest {
            pergunta: text,
            conversa_id: conversation_id.map(ConversationId::as_str),
            usuario: user,
        };
        let response: MessageResponse = self
            .fetch_json_cancellable(self.client.post(self.url("/message")).json(&body), cancel)
            .await?;
        Ok(response.into())
    }

    async fn send_anonymous(
        &self,
        text: &str,
        persona: &str,
        cancel: &CancellationToken,
    ) -> Result<MessageReply, ApiError> {
        tracing::debug!(persona, "POST /message/anonymous");
        let body = AnonymousMessageRequest {
            pergunta: text,
            persona,
        };
        let response: MessageResponse = self
            .fetch_json_cancellable(
                self.client.post(self.url("/message/anonymous")).json(&body),
                cancel,
            )
            .await?;
        Ok(response.into())
    }

    async fn list_conversations(&self, user: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        tracing::debug!("GET /conversations");
        let response: ConversationsResponse = self
            .fetch_json(
                self.client
                    .get(self.url("/conversations"))
                    .query(&[("user", user)]),
            )
            .await?;
        Ok(response.into())
    }

    async fn conversation_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<StoredMessage>, ApiError> {
        tracing::debug!(conversation = %conversation_id, "GET /conversations/{{id}}/messages");
        let path = format!("/conversations/{conversation_id}/messages");
        let response: MessagesResponse = self.fetch_json(self.client.get(self.url(&path))).await?;
        Ok(response.into())
    }

    async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<(), ApiError> {
        tracing::debug!(conversation = %conversation_id, "DELETE /conversations/{{id}}");
        let path = format!("/conversations/{conversation_id}");
        self.fetch(self.client.delete(self.url(&path))).await?;
        Ok(())
    }

    async fn list_personas(&self) -> Result<PersonaCatalog, ApiError> {
        tracing::debug!("GET /personas");
        let response: PersonasResponse = self
            .fetch_json(self.client.get(self.url("/personas")))
            .await?;
        Ok(response.personas)
    }

    async fn get_persona(&self) -> Result<Option<String>, ApiError> {
        tracing::debug!("GET /persona");
        let response: PersonaBody = self.fetch_json(self.client.get(self.url("/persona"))).await?;
        Ok(response.persona.filter(|p| !p.is_empty()))
    }

    async fn put_persona(&self, persona: &str) -> Result<(), ApiError> {
        tracing::debug!(persona, "PUT /persona");
        let body = PersonaBody {
            persona: Some(persona.to_string()),
        };
        self.fetch(self.client.put(self.url("/persona")).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpLyriaBackend {
        let config = ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        };
        HttpLyriaBackend::new(&config).unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpLyriaBackend::new(&config),
            Err(ApiError::Transport(_))
        ));
    }

    #[test]
    fn test_url_keeps_base_path() {
        let config = ClientConfig {
            base_url: "https://lyria-back.onrender.com/Lyria/".to_string(),
            ..ClientConfig::default()
        };
        let backend = HttpLyriaBackend::new(&config).unwrap();
        assert_eq!(
            backend.url("/check-session"),
            "https://lyria-back.onrender.com/Lyria/check-session"
        );
    }

    #[tokio::test]
    async fn test_login_sends_credentials_and_keeps_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(json!({"email": "ana@example.com", "senha": "segredo"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "session=abc123; Path=/")
                    .set_body_json(json!({"status": "ok", "usuario": "ana", "persona": "professor"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/check-session"))
            .and(header("cookie", "session=abc123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"autenticado": true, "usuario": "ana"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let result = backend
            .login(&Credentials::new("ana@example.com", "segredo"))
            .await
            .unwrap();
        assert!(result.is_accepted());
        assert_eq!(result.user_name.as_deref(), Some("ana"));

        let check = backend.check_session().await.unwrap();
        assert!(check.authenticated);
        assert_eq!(backend.session_cookies().as_deref(), Some("session=abc123"));
    }

    #[tokio::test]
    async fn test_restored_cookie_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-session"))
            .and(header("cookie", "session=restored"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"autenticado": true})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert_eq!(backend.session_cookies(), None);
        backend.restore_session_cookies("session=restored");

        assert!(backend.check_session().await.unwrap().authenticated);
    }

    #[tokio::test]
    async fn test_status_401_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .list_conversations("ana")
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Unauthorized);
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend_for(&server).logout().await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                body: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-session"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = backend_for(&server).check_session().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_send_message_body_and_new_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/message"))
            .and(body_json(json!({"pergunta": "oi", "conversa_id": "c-1", "usuario": "ana"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"resposta": "Olá, Ana!", "new_conversa_id": null})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend_for(&server)
            .send_message(
                "ana",
                Some(&ConversationId::from("c-1")),
                "oi",
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.text, "Olá, Ana!");
        assert_eq!(reply.new_conversation_id, None);
    }

    #[tokio::test]
    async fn test_send_anonymous_uses_persona() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/message/anonymous"))
            .and(body_json(json!({"pergunta": "oi", "persona": "professor"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resposta": "Olá!"})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend_for(&server)
            .send_anonymous("oi", "professor", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.text, "Olá!");
    }

    #[tokio::test]
    async fn test_cancelled_send_returns_promptly() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/message/anonymous"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"resposta": "tarde demais"}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = backend
            .send_anonymous("oi", "professor", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/check-session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"autenticado": true}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = ClientConfig {
            base_url: server.uri(),
            request_timeout_secs: 1,
            ..ClientConfig::default()
        };
        let err = HttpLyriaBackend::new(&config)
            .unwrap()
            .check_session()
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout);
    }

    #[tokio::test]
    async fn test_conversation_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations"))
            .and(query_param("user", "ana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversas": [{"id": 12, "titulo": "Revolução Francesa"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversations/12/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "mensagens": [
                    {"sender": "user", "text": "Quando começou?"},
                    {"sender": "bot", "text": "Em 1789."}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/conversations/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let list = backend.list_conversations("ana").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, ConversationId::from("12"));
        assert_eq!(list[0].display_title(), "Revolução Francesa");

        let history = backend.conversation_messages(&list[0].id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text, "Em 1789.");

        backend.delete_conversation(&list[0].id).await.unwrap();
    }

    #[tokio::test]
    async fn test_persona_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/personas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "personas": {"professor": "Didático", "empresarial": "Objetivo"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/persona"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"persona": "empresarial"})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/persona"))
            .and(body_json(json!({"persona": "professor"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let catalog = backend.list_personas().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["professor"], "Didático");
        assert_eq!(
            backend.get_persona().await.unwrap().as_deref(),
            Some("empresarial")
        );
        backend.put_persona("professor").await.unwrap();
    }
}
