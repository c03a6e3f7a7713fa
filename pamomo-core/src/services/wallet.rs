//! Wallet service - balance fetches and local transaction recording

use std::sync::Arc;

use chrono::{DateTime, Local};
use rust_decimal::Decimal;

use crate::domain::input::check_amount;
use crate::domain::result::{Error, Result};
use crate::domain::{Action, AppState, Session, Transaction, TransactionKind};
use crate::ports::{AccountService, Caller};

/// Identity for an authenticated call, or `NotLoggedIn`
pub(crate) fn caller(session: &Session) -> Result<Caller<'_>> {
    let email = session.email().ok_or(Error::NotLoggedIn)?;
    Ok(Caller {
        email,
        token: session.token(),
    })
}

#[derive(Clone)]
pub struct WalletService {
    accounts: Arc<dyn AccountService>,
}

impl WalletService {
    pub fn new(accounts: Arc<dyn AccountService>) -> Self {
        Self { accounts }
    }

    /// Ask the server for the current balance
    ///
    /// Without an email on the session this fails with `NotLoggedIn`
    /// and nothing is sent.
    pub async fn fetch_balance(&self, session: &Session) -> Result<Decimal> {
        let caller = caller(session)?;
        self.accounts.get_balance(caller).await
    }

    /// Fetch and store the balance, clearing the stale flag
    pub async fn refresh_balance(&self, state: &AppState) -> Result<AppState> {
        let balance = self.fetch_balance(&state.session).await?;
        tracing::debug!("balance refreshed");
        Ok(state.reduce(Action::BalanceLoaded(balance)))
    }

    /// Append a transaction stamped now
    pub fn record_transaction(
        &self,
        state: &AppState,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
    ) -> Result<(AppState, Transaction)> {
        self.record_transaction_at(state, kind, amount, description, Local::now())
    }

    pub fn record_transaction_at(
        &self,
        state: &AppState,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
        at: DateTime<Local>,
    ) -> Result<(AppState, Transaction)> {
        let amount = check_amount(amount)?;
        let tx = state.wallet.next_transaction(kind, amount, description, at);
        Ok((state.reduce(Action::TransactionRecorded(tx.clone())), tx))
    }
}
