//! Operation handlers - send, withdraw and deposit
//!
//! Each handler runs the same pipeline:
//! 1. the session must be verified
//! 2. form input is validated against the cached wallet
//! 3. one write call to the Remote Account Service
//! 4. the wallet is marked stale and the transaction recorded
//! 5. the balance is re-fetched from the server
//!
//! Nothing reaches the network when steps 1 or 2 fail, and the state
//! passed in is left untouched. The balance is never adjusted locally.
//! A failed re-fetch does not fail the operation: the write already
//! happened, so the outcome carries the stale wallet plus a warning.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::input::parse_amount;
use crate::domain::result::{Error, Result, ValidationError};
use crate::domain::{Action, AppState, Transaction, TransactionKind};
use crate::ports::{AccountService, TransferReceipt, WithdrawalReceipt};

use super::wallet::{caller, WalletService};

const WITHDRAWAL_DESCRIPTION: &str = "Withdrawal";
const DEPOSIT_DESCRIPTION: &str = "Deposit";

/// Result of a confirmed money movement
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome<R> {
    #[serde(skip)]
    pub state: AppState,
    pub transaction: Transaction,
    pub receipt: R,
    /// Fresh server balance, `None` when the re-fetch failed
    pub balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct OperationService {
    accounts: Arc<dyn AccountService>,
    wallet: WalletService,
    confirmation_code: String,
}

impl OperationService {
    pub fn new(
        accounts: Arc<dyn AccountService>,
        wallet: WalletService,
        confirmation_code: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            wallet,
            confirmation_code: confirmation_code.into(),
        }
    }

    fn require_verified(state: &AppState) -> Result<()> {
        if state.session.verified {
            Ok(())
        } else {
            Err(Error::NotVerified)
        }
    }

    fn covered(state: &AppState, amount: Decimal) -> Result<()> {
        if state.wallet.covers(amount) {
            Ok(())
        } else {
            Err(ValidationError::InsufficientBalance.into())
        }
    }

    /// Transfer to another wallet holder
    pub async fn send(
        &self,
        state: &AppState,
        receiver: &str,
        amount: &str,
    ) -> Result<OperationOutcome<TransferReceipt>> {
        Self::require_verified(state)?;
        let receiver = receiver.trim();
        if receiver.is_empty() {
            return Err(ValidationError::MissingRecipient.into());
        }
        let amount = parse_amount(amount)?;
        Self::covered(state, amount)?;

        let receipt = self
            .accounts
            .transfer(caller(&state.session)?, receiver, amount)
            .await?;
        tracing::info!(trans_id = ?receipt.trans_id, "transfer confirmed");

        self.settle(
            state,
            TransactionKind::Debit,
            amount,
            &Transaction::sent_to(receiver),
            receipt,
        )
        .await
    }

    /// Withdraw to cash, gated by the confirmation code
    pub async fn withdraw(
        &self,
        state: &AppState,
        amount: &str,
        confirmation_code: &str,
    ) -> Result<OperationOutcome<WithdrawalReceipt>> {
        Self::require_verified(state)?;
        let amount = parse_amount(amount)?;
        Self::covered(state, amount)?;
        if confirmation_code.trim() != self.confirmation_code {
            return Err(ValidationError::InvalidConfirmationCode.into());
        }

        let receipt = self
            .accounts
            .withdraw(caller(&state.session)?, amount)
            .await?;
        tracing::info!(trans_id = %receipt.trans_id, "withdrawal confirmed");

        let mut outcome = self
            .settle(
                state,
                TransactionKind::Debit,
                amount,
                WITHDRAWAL_DESCRIPTION,
                receipt,
            )
            .await?;
        if outcome.receipt.trans_id.is_empty() {
            let note = "The withdrawal went through but the server sent no receipt details.";
            outcome.warning = Some(match outcome.warning.take() {
                Some(existing) => format!("{} {}", note, existing),
                None => note.to_string(),
            });
        }
        Ok(outcome)
    }

    pub async fn deposit(
        &self,
        state: &AppState,
        amount: &str,
    ) -> Result<OperationOutcome<TransferReceipt>> {
        Self::require_verified(state)?;
        let amount = parse_amount(amount)?;

        let receipt = self
            .accounts
            .deposit(caller(&state.session)?, amount)
            .await?;
        tracing::info!(trans_id = ?receipt.trans_id, "deposit confirmed");

        self.settle(
            state,
            TransactionKind::Credit,
            amount,
            DEPOSIT_DESCRIPTION,
            receipt,
        )
        .await
    }

    /// Steps 4 and 5, after the server has confirmed the write
    async fn settle<R>(
        &self,
        state: &AppState,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
        receipt: R,
    ) -> Result<OperationOutcome<R>> {
        let invalidated = state.reduce(Action::BalanceInvalidated);
        let (recorded, transaction) =
            self.wallet
                .record_transaction(&invalidated, kind, amount, description)?;

        match self.wallet.refresh_balance(&recorded).await {
            Ok(refreshed) => Ok(OperationOutcome {
                balance: Some(refreshed.wallet.balance),
                state: refreshed,
                transaction,
                receipt,
                warning: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "balance re-fetch failed after confirmed write");
                Ok(OperationOutcome {
                    state: recorded,
                    transaction,
                    receipt,
                    balance: None,
                    warning: Some(format!(
                        "The operation went through but the balance could not be refreshed: {}",
                        e
                    )),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Session;
    use crate::ports::{Caller, LoginRequest, RegisterRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Server that moves a single balance and counts write calls
    struct Ledger {
        balance: Mutex<Decimal>,
        writes: AtomicUsize,
        balance_down: AtomicBool,
        bare_receipt: AtomicBool,
        reject_with: Option<String>,
    }

    impl Ledger {
        fn new(balance: i64) -> Self {
            Self {
                balance: Mutex::new(Decimal::new(balance, 0)),
                writes: AtomicUsize::new(0),
                balance_down: AtomicBool::new(false),
                bare_receipt: AtomicBool::new(false),
                reject_with: None,
            }
        }

        fn write(&self, delta: Decimal) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(msg) = &self.reject_with {
                return Err(Error::server(msg.clone()));
            }
            *self.balance.lock().unwrap() += delta;
            Ok(())
        }
    }

    #[async_trait]
    impl AccountService for Ledger {
        async fn login(&self, _request: &LoginRequest) -> Result<String> {
            unreachable!()
        }
        async fn register(&self, _request: &RegisterRequest) -> Result<String> {
            unreachable!()
        }
        async fn get_balance(&self, _caller: Caller<'_>) -> Result<Decimal> {
            if self.balance_down.load(Ordering::SeqCst) {
                return Err(Error::network("Failed to fetch balance: 502"));
            }
            Ok(*self.balance.lock().unwrap())
        }
        async fn withdraw(&self, _caller: Caller<'_>, amount: Decimal) -> Result<WithdrawalReceipt> {
            self.write(-amount)?;
            if self.bare_receipt.load(Ordering::SeqCst) {
                return Ok(WithdrawalReceipt {
                    amount,
                    withdrawal_fee: Decimal::ZERO,
                    trans_id: String::new(),
                    time_stamp: String::new(),
                });
            }
            Ok(WithdrawalReceipt {
                amount,
                withdrawal_fee: Decimal::ZERO,
                trans_id: "42".to_string(),
                time_stamp: "2026-01-01T00:00:00Z".to_string(),
            })
        }
        async fn deposit(&self, _caller: Caller<'_>, amount: Decimal) -> Result<TransferReceipt> {
            self.write(amount)?;
            Ok(TransferReceipt::default())
        }
        async fn transfer(
            &self,
            _caller: Caller<'_>,
            _receiver: &str,
            amount: Decimal,
        ) -> Result<TransferReceipt> {
            self.write(-amount)?;
            Ok(TransferReceipt::default())
        }
    }

    fn service(ledger: Arc<Ledger>) -> OperationService {
        OperationService::new(ledger.clone(), WalletService::new(ledger), "1234")
    }

    fn state(balance: i64, verified: bool) -> AppState {
        let session = Session::logged_in("alice", "tok", "alice@example.com");
        let session = if verified { session.verified() } else { session };
        AppState::new(session).reduce(Action::BalanceLoaded(Decimal::new(balance, 0)))
    }

    #[tokio::test]
    async fn test_withdraw_success_uses_server_balance() {
        let ledger = Arc::new(Ledger::new(5000));
        let ops = service(ledger.clone());

        let outcome = ops.withdraw(&state(5000, true), "1000", "1234").await.unwrap();

        assert_eq!(outcome.balance, Some(Decimal::new(4000, 0)));
        assert_eq!(outcome.state.wallet.balance, Decimal::new(4000, 0));
        assert!(!outcome.state.wallet.stale);
        assert_eq!(outcome.state.wallet.transactions.len(), 1);
        assert_eq!(outcome.transaction.kind, TransactionKind::Debit);
        assert_eq!(outcome.transaction.description, "Withdrawal");
        assert_eq!(outcome.receipt.trans_id, "42");
    }

    #[tokio::test]
    async fn test_withdraw_without_receipt_details_still_records() {
        let ledger = Arc::new(Ledger::new(5000));
        ledger.bare_receipt.store(true, Ordering::SeqCst);
        let ops = service(ledger.clone());

        let outcome = ops.withdraw(&state(5000, true), "1000", "1234").await.unwrap();

        assert_eq!(outcome.balance, Some(Decimal::new(4000, 0)));
        assert_eq!(outcome.state.wallet.transactions.len(), 1);
        assert_eq!(outcome.transaction.description, "Withdrawal");
        assert_eq!(outcome.receipt.amount, Decimal::new(1000, 0));
        assert!(outcome.warning.unwrap().contains("no receipt details"));
    }

    #[tokio::test]
    async fn test_withdraw_rejections_skip_network() {
        let ledger = Arc::new(Ledger::new(5000));
        let ops = service(ledger.clone());
        let verified = state(5000, true);

        let cases = [
            ("6000", "1234", "Insufficient balance"),
            ("", "1234", "Please fill in the amount field"),
            ("abc", "1234", "Please enter a valid amount"),
            ("0", "1234", "Please enter a valid amount"),
            ("-5", "1234", "Please enter a valid amount"),
            ("100", "0000", "Invalid confirmation code"),
        ];
        for (amount, code, message) in cases {
            let err = ops.withdraw(&verified, amount, code).await.unwrap_err();
            assert_eq!(err.to_string(), message, "amount={amount:?} code={code:?}");
        }

        let err = ops.withdraw(&state(5000, false), "100", "1234").await.unwrap_err();
        assert!(matches!(err, Error::NotVerified));

        assert_eq!(ledger.writes.load(Ordering::SeqCst), 0);
        assert_eq!(verified.wallet.balance, Decimal::new(5000, 0));
    }

    #[tokio::test]
    async fn test_send_records_debit_to_receiver() {
        let ledger = Arc::new(Ledger::new(800));
        let ops = service(ledger.clone());

        let outcome = ops
            .send(&state(800, true), " john@example.com ", "500")
            .await
            .unwrap();
        assert_eq!(outcome.transaction.description, "Sent to john@example.com");
        assert_eq!(outcome.state.wallet.balance, Decimal::new(300, 0));
    }

    #[tokio::test]
    async fn test_send_while_unverified_is_rejected() {
        let ledger = Arc::new(Ledger::new(5000));
        let ops = service(ledger.clone());
        let unverified = state(5000, false);

        let err = ops
            .send(&unverified, "john@example.com", "500")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please verify your identity before moving money");
        assert!(unverified.wallet.transactions.is_empty());
        assert_eq!(ledger.writes.load(Ordering::SeqCst), 0);

        let err = ops.send(&state(5000, true), "  ", "500").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a recipient");
    }

    #[tokio::test]
    async fn test_deposit_records_credit() {
        let ledger = Arc::new(Ledger::new(10));
        let ops = service(ledger.clone());

        let outcome = ops.deposit(&state(10, true), "2,500.50").await.unwrap();
        assert_eq!(outcome.transaction.kind, TransactionKind::Credit);
        assert_eq!(outcome.transaction.amount, Decimal::new(250050, 2));
        assert_eq!(outcome.state.wallet.balance, Decimal::new(251050, 2));
    }

    #[tokio::test]
    async fn test_server_rejection_leaves_state() {
        let ledger = Arc::new(Ledger {
            reject_with: Some("Daily limit reached.".to_string()),
            ..Ledger::new(5000)
        });
        let ops = service(ledger.clone());

        let err = ops.withdraw(&state(5000, true), "100", "1234").await.unwrap_err();
        assert!(matches!(err, Error::Server(_)));
        assert_eq!(err.to_string(), "Daily limit reached.");
    }

    #[tokio::test]
    async fn test_refetch_failure_keeps_stale_wallet() {
        let ledger = Arc::new(Ledger::new(5000));
        ledger.balance_down.store(true, Ordering::SeqCst);
        let ops = service(ledger.clone());

        let outcome = ops.withdraw(&state(5000, true), "1000", "1234").await.unwrap();
        assert_eq!(outcome.balance, None);
        assert!(outcome.warning.is_some());
        assert!(outcome.state.wallet.stale);
        // Cached value untouched, never adjusted locally
        assert_eq!(outcome.state.wallet.balance, Decimal::new(5000, 0));
        assert_eq!(outcome.state.wallet.transactions.len(), 1);
        assert_eq!(*ledger.balance.lock().unwrap(), Decimal::new(4000, 0));
    }
}
