//! Sign-in state for backend calls.
//!
//! An [`AuthContext`] is an ordinary value: the CLI resolves one at startup
//! and hands it to the [`ApiClient`](crate::api::ApiClient), which attaches
//! the bearer token to every request. Tokens live in the system keyring,
//! with `BLINDERFIT_AUTH_TOKEN` as a fallback.

use std::error::Error;
use std::fmt;

use keyring::Entry;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use tracing::{debug, warn};

pub const AUTH_TOKEN_ENV: &str = "BLINDERFIT_AUTH_TOKEN";
const KEYRING_SERVICE: &str = "blinderfit";
const KEYRING_USER: &str = "auth-token";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let mut context = Self::default();
        context.login(token);
        context
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Blank tokens leave the context signed out.
    pub fn login(&mut self, token: impl Into<String>) {
        let token = token.into().trim().to_string();
        self.token = (!token.is_empty()).then_some(token);
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    fn from_env() -> Self {
        match std::env::var(AUTH_TOKEN_ENV) {
            Ok(token) => Self::with_token(token),
            Err(_) => Self::signed_out(),
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

/// Failures when reaching the system keyring.
///
/// Recoverable errors mean the credential backend was temporarily
/// unavailable, e.g. a locked keychain or no secret service running.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "credential store unavailable: {}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

pub trait TokenStore {
    fn load_token(&self) -> Result<Option<String>, KeyringAccessError>;
    fn store_token(&self, token: &str) -> Result<(), KeyringAccessError>;
    /// Returns false when there was nothing to delete.
    fn delete_token(&self) -> Result<bool, KeyringAccessError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry(&self) -> Result<Entry, KeyringAccessError> {
        Ok(Entry::new(KEYRING_SERVICE, KEYRING_USER)?)
    }
}

impl TokenStore for KeyringTokenStore {
    fn load_token(&self) -> Result<Option<String>, KeyringAccessError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store_token(&self, token: &str) -> Result<(), KeyringAccessError> {
        Ok(self.entry()?.set_password(token)?)
    }

    fn delete_token(&self) -> Result<bool, KeyringAccessError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Stored token first, then the environment. A keyring outage falls back
/// to the environment; any other keyring failure is returned.
pub fn resolve_auth<S: TokenStore>(store: &S) -> Result<AuthContext, KeyringAccessError> {
    match store.load_token() {
        Ok(Some(token)) => {
            debug!("using auth token from keyring");
            Ok(AuthContext::with_token(token))
        }
        Ok(None) => Ok(AuthContext::from_env()),
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "falling back to {AUTH_TOKEN_ENV}");
            Ok(AuthContext::from_env())
        }
        Err(err) => Err(err),
    }
}
