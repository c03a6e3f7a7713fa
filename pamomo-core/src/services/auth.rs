//! Auth service - login and registration round-trips

use std::sync::Arc;

use crate::domain::input::is_valid_email;
use crate::domain::result::{Result, ValidationError};
use crate::domain::AppState;
use crate::ports::{AccountService, LoginRequest, RegisterRequest};

use super::SessionStore;

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountService>,
    sessions: SessionStore,
}

fn check_credentials(username: &str, email: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials.into());
    }
    if !is_valid_email(email.trim()) {
        return Err(ValidationError::InvalidEmail.into());
    }
    Ok(())
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountService>, sessions: SessionStore) -> Self {
        Self { accounts, sessions }
    }

    /// Exchange credentials for a token and persist the new session
    pub async fn login(&self, state: &AppState, request: &LoginRequest) -> Result<AppState> {
        check_credentials(&request.username, &request.email, &request.password)?;

        let request = LoginRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            password: request.password.clone(),
        };
        let token = self.accounts.login(&request).await?;
        tracing::info!("login accepted");

        self.sessions
            .login(state, &request.username, &token, &request.email)
    }

    /// Create an account and sign straight in with the returned token
    pub async fn register(&self, state: &AppState, request: &RegisterRequest) -> Result<AppState> {
        check_credentials(&request.username, &request.email, &request.password)?;
        if request.password != request.password_confirmation {
            return Err(ValidationError::PasswordMismatch.into());
        }

        let request = RegisterRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            password: request.password.clone(),
            password_confirmation: request.password_confirmation.clone(),
        };
        let token = self.accounts.register(&request).await?;
        tracing::info!("registration accepted");

        self.sessions
            .login(state, &request.username, &token, &request.email)
    }
}
