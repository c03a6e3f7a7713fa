//! History service - transaction listing, summary and CSV export

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{Transaction, Wallet, WalletTotals};

/// One CSV row; amounts are written signed so a column sum gives the net
#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    date: String,
    kind: &'a str,
    amount: String,
    description: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Transactions newest first
    pub fn list<'a>(&self, wallet: &'a Wallet, limit: Option<usize>) -> Vec<&'a Transaction> {
        let newest_first = wallet.transactions.iter().rev();
        match limit {
            Some(n) => newest_first.take(n).collect(),
            None => newest_first.collect(),
        }
    }

    pub fn summary(&self, wallet: &Wallet) -> WalletTotals {
        wallet.totals()
    }

    /// Write transactions as CSV in recording order, returning the row count
    pub fn export_csv<W: Write>(&self, transactions: &[Transaction], writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for tx in transactions {
            csv_writer.serialize(CsvRow {
                id: tx.id,
                date: tx.date.format("%Y-%m-%d").to_string(),
                kind: tx.kind.as_str(),
                amount: tx.signed_amount().to_string(),
                description: &tx.description,
            })?;
        }
        csv_writer.flush()?;
        Ok(transactions.len())
    }

    pub fn export_to_path(&self, transactions: &[Transaction], path: &Path) -> Result<usize> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.export_csv(transactions, file)
    }
}
