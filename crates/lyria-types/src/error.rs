use thiserror::Error;

/// Errors from backend HTTP calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered 401. The only authorization-failure signal.
    #[error("session is not authorized")]
    Unauthorized,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The caller's cancellation token fired before the call finished.
    #[error("request cancelled")]
    Cancelled,
}

/// Errors from the local key/value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(String),

    #[error("store serialization error: {0}")]
    Serialization(String),
}

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login was accepted but check-session did not confirm a session.
    #[error("session could not be created")]
    CreationFailed,

    /// The backend refused the credentials (`status` other than `ok`).
    #[error("login rejected: {0}")]
    LoginRejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from conversation history operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors from voice and persona selection.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("unknown voice '{0}'")]
    UnknownVoice(String),

    #[error("unknown persona '{0}'")]
    UnknownPersona(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
