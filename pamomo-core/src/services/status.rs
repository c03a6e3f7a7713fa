//! Status service - session and wallet summary

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Config;
use crate::domain::{AppState, VerificationGating};

#[derive(Debug, Clone)]
pub struct StatusService {
    base_url: String,
    gating: VerificationGating,
}

impl StatusService {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            gating: config.verification_gating,
        }
    }

    /// Summarize a state without any network call
    ///
    /// `balance` is `None` until a fetch has happened in this process.
    pub fn get_status(&self, state: &AppState, balance_known: bool) -> StatusSummary {
        let session = &state.session;
        StatusSummary {
            authenticated: session.authenticated,
            verified: session.verified,
            username: (!session.username.is_empty()).then(|| session.username.clone()),
            email: session.email().map(str::to_string),
            balance: balance_known.then_some(state.wallet.balance),
            balance_stale: state.wallet.stale,
            transaction_count: state.wallet.transactions.len(),
            api_base_url: self.base_url.clone(),
            verification_gating: self.gating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub authenticated: bool,
    pub verified: bool,
    pub username: Option<String>,
    pub email: Option<String>,
    pub balance: Option<Decimal>,
    pub balance_stale: bool,
    pub transaction_count: usize,
    pub api_base_url: String,
    pub verification_gating: VerificationGating,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, Session};

    #[test]
    fn test_status_of_anonymous_session() {
        let status = StatusService::new(&Config::default()).get_status(&AppState::default(), false);
        assert!(!status.authenticated);
        assert_eq!(status.username, None);
        assert_eq!(status.balance, None);
        assert_eq!(status.api_base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_status_with_balance() {
        let state = AppState::new(Session::logged_in("alice", "tok", "alice@example.com"))
            .reduce(Action::BalanceLoaded(Decimal::new(5000, 0)));
        let status = StatusService::new(&Config::default()).get_status(&state, true);

        assert!(status.authenticated);
        assert!(!status.verified);
        assert_eq!(status.email.as_deref(), Some("alice@example.com"));
        assert_eq!(status.balance, Some(Decimal::new(5000, 0)));

        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("token").is_none());
    }
}
