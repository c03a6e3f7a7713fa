//! Application state and its reducer
//!
//! `AppState` is a plain value. Every change goes through [`AppState::reduce`],
//! which never touches storage or the network, so state transitions can be
//! tested deterministically.

use rust_decimal::Decimal;
use serde::Serialize;

use super::session::Session;
use super::transaction::Transaction;
use super::wallet::Wallet;

/// Session and wallet owned by the application controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub session: Session,
    pub wallet: Wallet,
}

/// A state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoggedIn {
        username: String,
        email: String,
        token: String,
    },
    LoggedOut,
    Verified,
    BalanceLoaded(Decimal),
    BalanceInvalidated,
    TransactionRecorded(Transaction),
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            wallet: Wallet::default(),
        }
    }

    /// Apply `action`, returning the next state
    pub fn reduce(&self, action: Action) -> AppState {
        match action {
            Action::LoggedIn {
                username,
                email,
                token,
            } => AppState::new(Session::logged_in(username, token, email)),
            // Full client-side reset
            Action::LoggedOut => AppState::default(),
            Action::Verified => AppState {
                session: self.session.verified(),
                wallet: self.wallet.clone(),
            },
            Action::BalanceLoaded(balance) => AppState {
                session: self.session.clone(),
                wallet: self.wallet.with_balance(balance),
            },
            Action::BalanceInvalidated => AppState {
                session: self.session.clone(),
                wallet: self.wallet.invalidated(),
            },
            Action::TransactionRecorded(tx) => AppState {
                session: self.session.clone(),
                wallet: self.wallet.with_transaction(tx),
            },
        }
    }

    /// Apply several actions in order
    pub fn reduce_all(&self, actions: impl IntoIterator<Item = Action>) -> AppState {
        actions
            .into_iter()
            .fold(self.clone(), |state, action| state.reduce(action))
    }
}
