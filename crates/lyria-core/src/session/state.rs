//! In-memory session record.
//!
//! Fields are private so the authenticated flag can only change together
//! with the user: `is_authenticated` implies `user.is_some()`, and clearing
//! drops both at once.

use chrono::{DateTime, Utc};
use lyria_types::session::{SessionSnapshot, UserProfile};

#[derive(Debug, Clone)]
pub struct SessionState {
    user: Option<UserProfile>,
    is_authenticated: bool,
    loading: bool,
    last_checked_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Fresh state at startup: signed out, loading until the first check.
    pub fn new() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            loading: true,
            last_checked_at: None,
        }
    }

    /// Optimistically restore a persisted user before the backend confirms it.
    pub fn hydrate(&mut self, user: UserProfile, last_checked_at: Option<DateTime<Utc>>) {
        self.user = Some(user);
        self.is_authenticated = true;
        self.last_checked_at = last_checked_at;
    }

    /// Record a confirmed session. Returns true if the state was signed out.
    pub fn authenticate(&mut self, user: UserProfile, checked_at: DateTime<Utc>) -> bool {
        let was_authenticated = self.is_authenticated;
        self.user = Some(user);
        self.is_authenticated = true;
        self.last_checked_at = Some(checked_at);
        !was_authenticated
    }

    /// Replace the profile of a signed-in user. No-op when signed out.
    pub fn replace_user(&mut self, user: UserProfile) -> bool {
        if !self.is_authenticated {
            return false;
        }
        self.user = Some(user);
        true
    }

    /// Drop the user and the authenticated flag. Returns true if the state
    /// was authenticated.
    pub fn clear(&mut self) -> bool {
        let was_authenticated = self.is_authenticated;
        self.user = None;
        self.is_authenticated = false;
        self.last_checked_at = None;
        was_authenticated
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            is_authenticated: self.is_authenticated,
            loading: self.loading,
            last_checked_at: self.last_checked_at,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
