//! Wallet domain model - client-side cache of balance and history

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionKind};

/// Cached balance plus the transactions recorded during this session
///
/// The balance is only ever taken from the Remote Account Service.
/// `stale` is raised when a confirmed write has made the cached value
/// out of date and cleared by the next successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
    pub stale: bool,
    pub transactions: Vec<Transaction>,
}

impl Wallet {
    /// Build the next transaction for this wallet without recording it
    pub fn next_transaction(
        &self,
        kind: TransactionKind,
        amount: Decimal,
        description: impl Into<String>,
        at: DateTime<Local>,
    ) -> Transaction {
        let previous_id = self.transactions.last().map(|tx| tx.id);
        Transaction::new(kind, amount, description, at, previous_id)
    }

    /// Whether `amount` can be covered by the cached balance
    pub fn covers(&self, amount: Decimal) -> bool {
        amount <= self.balance
    }

    pub fn with_balance(&self, balance: Decimal) -> Self {
        Self {
            balance,
            stale: false,
            transactions: self.transactions.clone(),
        }
    }

    pub fn invalidated(&self) -> Self {
        Self {
            stale: true,
            ..self.clone()
        }
    }

    pub fn with_transaction(&self, tx: Transaction) -> Self {
        let mut transactions = self.transactions.clone();
        transactions.push(tx);
        Self {
            transactions,
            ..self.clone()
        }
    }

    /// Sum of credits and debits recorded so far
    pub fn totals(&self) -> WalletTotals {
        self.transactions
            .iter()
            .fold(WalletTotals::default(), |mut totals, tx| {
                match tx.kind {
                    TransactionKind::Credit => totals.credits += tx.amount,
                    TransactionKind::Debit => totals.debits += tx.amount,
                }
                totals.count += 1;
                totals
            })
    }
}

/// Aggregate view over recorded transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletTotals {
    pub count: usize,
    pub credits: Decimal,
    pub debits: Decimal,
}

impl WalletTotals {
    pub fn net(&self) -> Decimal {
        self.credits - self.debits
    }
}
