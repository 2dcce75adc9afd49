//! Two-phase authentication: trust stored credentials immediately, then let
//! the backend confirm or revoke them.

use crate::User;
use crate::client::HoopsApi;
use crate::store::CredentialStore;
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Credentials found locally; the backend has not confirmed them yet.
    Unverified(User),
    Authenticated(User),
    Unauthenticated,
}

impl SessionState {
    /// Optimistic: an unverified session already counts.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, SessionState::Unauthenticated)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Unverified(user) | SessionState::Authenticated(user) => Some(user),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unverified(_) => "verifying",
            SessionState::Authenticated(_) => "signed in",
            SessionState::Unauthenticated => "signed out",
        }
    }
}

/// Raised by the HTTP layer whenever the backend answers 401. The stored
/// credentials are already gone by the time subscribers see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
}

/// Local check only. No token means not authenticated, whatever user record
/// happens to be cached.
pub fn is_authenticated(stored_token: Option<&str>, stored_user: Option<&User>) -> bool {
    stored_token.is_some_and(|t| !t.trim().is_empty()) && stored_user.is_some()
}

#[derive(Debug)]
pub struct SessionGate {
    store: Arc<dyn CredentialStore>,
    state: SessionState,
}

impl SessionGate {
    /// Build the initial state from whatever the store holds. A corrupt user
    /// record wipes the stored credentials.
    pub fn restore(store: Arc<dyn CredentialStore>) -> Self {
        let token = store.token();
        let state = match store.user() {
            Ok(user) if is_authenticated(token.as_deref(), user.as_ref()) => {
                // is_authenticated guarantees the user is present
                user.map(SessionState::Unverified)
                    .unwrap_or(SessionState::Unauthenticated)
            }
            Ok(_) => SessionState::Unauthenticated,
            Err(e) => {
                warn!("discarding stored session: {e}");
                clear_credentials(store.as_ref());
                SessionState::Unauthenticated
            }
        };
        debug!("session restored as {}", state.label());
        Self { store, state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn needs_validation(&self) -> bool {
        matches!(self.state, SessionState::Unverified(_))
    }

    /// A fresh login is confirmed by definition; the client has already
    /// written the credentials.
    pub fn on_login(&mut self, user: User) {
        self.state = SessionState::Authenticated(user);
    }

    /// Apply the backend's verdict. Can confirm an unverified session or
    /// revoke any session, but never revives a signed-out one.
    pub fn apply_validation(&mut self, valid: bool) -> &SessionState {
        if !valid {
            self.expire();
            return &self.state;
        }
        if let SessionState::Unverified(user) = &self.state {
            if self.store.token().is_some() {
                self.state = SessionState::Authenticated(user.clone());
            } else {
                // credentials were cleared while the check was in flight
                self.state = SessionState::Unauthenticated;
            }
        }
        &self.state
    }

    /// Run the remote check. Transport failures leave the session unverified.
    pub async fn validate(&mut self, api: &HoopsApi) -> &SessionState {
        if !self.state.is_authenticated() {
            return &self.state;
        }
        match api.verify_token().await {
            Ok(valid) => self.apply_validation(valid),
            Err(e) => {
                warn!("token check unavailable: {e}");
                &self.state
            }
        }
    }

    pub fn expire(&mut self) {
        clear_credentials(self.store.as_ref());
        self.state = SessionState::Unauthenticated;
    }

    pub fn logout(&mut self) {
        debug!("logging out");
        self.expire();
    }
}

fn clear_credentials(store: &dyn CredentialStore) {
    if let Err(e) = store.clear() {
        warn!("failed to clear stored credentials: {e}");
    }
}
