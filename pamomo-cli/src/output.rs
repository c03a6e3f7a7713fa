//! Output formatting utilities

use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::{Decimal, RoundingStrategy};

use pamomo_core::{Transaction, TransactionKind};

/// Currency prefix for displayed amounts (Malawi kwacha)
const CURRENCY: &str = "MK";

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Spinner on stderr while waiting on the network; hidden when not a terminal
pub fn spinner(msg: &str) -> ProgressBar {
    if !atty::is(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Format an amount as `MK 1,234.00`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{} {}.{}", sign, CURRENCY, grouped, fraction)
}

/// Transactions as a table, in the order given
pub fn transaction_table(transactions: &[&Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Date", "Type", "Amount", "Description"]);
    for tx in transactions {
        let amount = format_amount(tx.signed_amount());
        let amount = match tx.kind {
            TransactionKind::Credit => amount.green().to_string(),
            TransactionKind::Debit => amount.red().to_string(),
        };
        table.add_row(vec![
            tx.date.format("%Y-%m-%d").to_string(),
            tx.kind.to_string(),
            amount,
            tx.description.clone(),
        ]);
    }
    table
}
