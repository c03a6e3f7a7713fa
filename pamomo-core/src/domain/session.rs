//! Session domain model

use serde::{Deserialize, Serialize};

/// Client-held authentication and verification status
///
/// `verified` is deliberately absent from [`StoredCredentials`]: every new
/// process starts unverified, even when a previous run was verified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    pub verified: bool,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub token: String,
}

/// The subset of a session that survives a restart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub token: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Session {
    /// Rebuild the session from durable storage
    ///
    /// Authenticated iff a token was stored; never verified.
    pub fn restore(stored: &StoredCredentials) -> Self {
        let token = stored.token.clone().filter(|t| !t.is_empty());
        Self {
            authenticated: token.is_some(),
            verified: false,
            username: stored.username.clone().unwrap_or_default(),
            email: stored.email.clone().unwrap_or_default(),
            token: token.unwrap_or_default(),
        }
    }

    /// Session after a successful login round-trip
    pub fn logged_in(
        username: impl Into<String>,
        token: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            authenticated: true,
            verified: false,
            username: username.into(),
            email: email.into(),
            token: token.into(),
        }
    }

    /// Session after logout
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Same session with the identity flag raised
    pub fn verified(&self) -> Self {
        Self {
            verified: true,
            ..self.clone()
        }
    }

    /// Email used as the join key for the remote balance, if any
    pub fn email(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }

    /// Token for authenticated calls, if any
    pub fn token(&self) -> Option<&str> {
        (!self.token.is_empty()).then_some(self.token.as_str())
    }

    pub fn credentials(&self) -> StoredCredentials {
        StoredCredentials {
            token: self.token().map(str::to_string),
            username: (!self.username.is_empty()).then(|| self.username.clone()),
            email: self.email().map(str::to_string),
        }
    }
}
