//! Authenticated session: who is signed in and with which credential.
//!
//! The session lives in one [`SessionContext`] that is created at startup and
//! handed to the gateway and the [`SessionManager`]. The gateway reads the
//! credential before every call and invalidates the context when the backend
//! rejects it; the manager is the only other writer.

pub mod store;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};

use crate::api::ConsoleApi;
use crate::api::models::{Credentials, User};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials and try again.";
const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

/// Snapshot of the session. Authenticated only when both the credential and
/// the resolved user are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// Shared handle to the process-wide session.
#[derive(Clone)]
pub struct SessionContext {
    state: Arc<RwLock<Session>>,
    store: Arc<dyn CredentialStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            state: Arc::new(RwLock::new(Session::default())),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().authenticated()
    }

    /// Credential to attach to the next request, if any.
    pub fn credential(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// Credential left in durable storage by an earlier run.
    pub fn persisted_credential(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!("Failed to read stored credential: {}", err);
                None
            }
        }
    }

    /// Holds a stored credential in memory while its owner is being resolved.
    /// The session stays unauthenticated until [`establish`](Self::establish).
    pub(crate) fn adopt_credential(&self, token: String) {
        let mut state = self.write();
        state.token = Some(token);
        state.user = None;
    }

    /// Signs the session in and persists the credential.
    pub fn establish(&self, token: String, user: User) {
        if let Err(err) = self.store.save(&token) {
            warn!("Failed to persist credential: {}", err);
        }
        let mut state = self.write();
        state.token = Some(token);
        state.user = Some(user);
    }

    /// Signs out: forgets the in-memory session and the stored credential.
    pub fn clear(&self) {
        if let Err(err) = self.store.clear() {
            warn!("Failed to remove stored credential: {}", err);
        }
        *self.write() = Session::default();
    }

    /// The backend rejected the credential.
    pub fn invalidate(&self) {
        if self.read().token.is_some() {
            info!("Credential rejected by the server, signing out");
        }
        self.clear();
    }
}

/// Human readable reason an auth operation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct AuthError(pub String);

/// Drives the session lifecycle against the backend.
pub struct SessionManager {
    context: SessionContext,
    api: Arc<dyn ConsoleApi>,
}

impl SessionManager {
    pub fn new(context: SessionContext, api: Arc<dyn ConsoleApi>) -> Self {
        Self { context, api }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.context.current_user()
    }

    /// Resumes a previous session from the stored credential. Any failure,
    /// network errors included, discards the credential.
    pub async fn restore(&self) -> bool {
        let Some(token) = self.context.persisted_credential() else {
            debug!("No stored credential, starting signed out");
            return false;
        };
        self.context.adopt_credential(token.clone());
        match self.api.me().await {
            Ok(user) => {
                info!("Restored session for {}", user.email);
                self.context.establish(token, user);
                true
            }
            Err(err) => {
                warn!("Could not restore session: {}", err);
                self.context.clear();
                false
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = Credentials::new(email, password);
        match self.api.login(&credentials).await {
            Ok(grant) => {
                info!("Signed in as {}", grant.user.email);
                self.context.establish(grant.token, grant.user.clone());
                Ok(grant.user)
            }
            Err(err) => {
                warn!("Login failed for {}: {}", credentials.email, err);
                Err(AuthError(err.user_message(LOGIN_FALLBACK)))
            }
        }
    }

    /// Creates an account. The session is left untouched; the operator signs
    /// in separately afterwards.
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let credentials = Credentials::new(email, password);
        match self.api.register(&credentials).await {
            Ok(()) => {
                info!("Registered account {}", credentials.email);
                Ok(())
            }
            Err(err) => {
                warn!("Registration failed for {}: {}", credentials.email, err);
                Err(AuthError(err.user_message(REGISTER_FALLBACK)))
            }
        }
    }

    pub fn logout(&self) {
        info!("Signed out");
        self.context.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: String::from("u1"),
            email: String::from("ops@distributo.io"),
        }
    }

    #[test]
    fn authenticated_requires_token_and_user() {
        let context = SessionContext::in_memory();
        assert!(!context.is_authenticated());

        context.adopt_credential(String::from("tok"));
        assert!(!context.is_authenticated());
        assert_eq!(context.credential().as_deref(), Some("tok"));

        context.establish(String::from("tok"), user());
        assert!(context.is_authenticated());
        assert_eq!(context.persisted_credential().as_deref(), Some("tok"));
    }

    #[test]
    fn invalidate_strips_credential_everywhere() {
        let context = SessionContext::in_memory();
        context.establish(String::from("tok"), user());
        let reader = context.clone();

        context.invalidate();
        assert!(!reader.is_authenticated());
        assert_eq!(reader.credential(), None);
        assert_eq!(reader.persisted_credential(), None);
        assert_eq!(reader.snapshot(), Session::default());
    }
}
