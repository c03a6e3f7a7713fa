//! Transaction domain model

use std::fmt;

use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a transaction relative to the wallet owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    /// Apply the direction to an unsigned amount
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Credit => amount,
            TransactionKind::Debit => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded wallet transaction
///
/// Immutable once created. `amount` is always positive; the sign lives in `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

impl Transaction {
    /// Build a transaction stamped at `at`
    ///
    /// The id is the creation instant in milliseconds, bumped past
    /// `previous_id` so ids stay strictly increasing within a wallet.
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        description: impl Into<String>,
        at: DateTime<Local>,
        previous_id: Option<i64>,
    ) -> Self {
        let millis = at.timestamp_millis();
        let id = match previous_id {
            Some(prev) if prev >= millis => prev + 1,
            _ => millis,
        };

        Self {
            id,
            kind,
            amount,
            date: at.date_naive(),
            description: description.into(),
        }
    }

    /// Amount with the direction applied (debits negative)
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// Description for a transfer to `receiver`
    pub fn sent_to(receiver: &str) -> String {
        format!("Sent to {}", receiver)
    }
}
