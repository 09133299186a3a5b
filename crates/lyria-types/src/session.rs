//! Session and identity types.
//!
//! A session is the authenticated identity shared between this client and the
//! backend. The client only ever holds a cached copy of it; the backend's
//! check-session answer is authoritative.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The cached profile of the signed-in user.
///
/// Persisted as JSON under the `lyriaUser` key. Field names match the records
/// written by the web client so an existing store keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
}

impl UserProfile {
    /// Merge a server-confirmed identity over this cached profile.
    ///
    /// Server values win when present; cached fields fill the gaps. The
    /// persona is never reported by check-session, so it is always kept.
    pub fn merged_with(&self, confirmed_name: Option<&str>, confirmed_email: Option<&str>) -> Self {
        Self {
            name: confirmed_name
                .map(str::to_string)
                .unwrap_or_else(|| self.name.clone()),
            email: confirmed_email
                .map(str::to_string)
                .or_else(|| self.email.clone()),
            persona: self.persona.clone(),
        }
    }
}

/// Email and password for `POST /login`.
///
/// The password never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Outcome of `POST /login` as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    /// Raw `status` field. Only `"ok"` means the credentials were accepted.
    pub status: String,
    pub user_name: Option<String>,
    pub persona: Option<String>,
}

impl LoginResult {
    pub fn is_accepted(&self) -> bool {
        self.status == "ok"
    }
}

/// Answer of `GET /check-session`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCheck {
    pub authenticated: bool,
    pub user_name: Option<String>,
    pub email: Option<String>,
}

/// Read-only copy of the session state handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// A signed-out snapshot that is not loading.
    pub fn anonymous() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            loading: false,
            last_checked_at: None,
        }
    }

    /// The user name to send with authenticated calls, if signed in.
    pub fn authenticated_user(&self) -> Option<&str> {
        if self.is_authenticated {
            self.user.as_ref().map(|u| u.name.as_str())
        } else {
            None
        }
    }
}

/// Lifecycle notifications published by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session became authenticated (login or first confirmation).
    Authenticated { user: UserProfile },
    /// The user asked to sign out.
    LoggedOut,
    /// The backend no longer recognises the session. Published at most once
    /// per expiry window.
    Expired,
}
