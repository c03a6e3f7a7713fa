//! Balance command - fetch the current balance from the server

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use pamomo_core::services::EntryPoint;
use pamomo_core::OperationResult;
use rust_decimal::Decimal;

use super::{get_context, get_logger, log_outcome};
use crate::output;

#[derive(Serialize)]
struct BalanceView {
    username: String,
    email: String,
    balance: Decimal,
}

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger(EntryPoint::Cli);
    let state = ctx.session_store.restore()?;

    let spinner = output::spinner("Fetching balance...");
    let result = ctx.wallet_service.fetch_balance(&state.session).await;
    spinner.finish_and_clear();
    log_outcome(&logger, "balance_refresh", &result);

    if json {
        let failed = result.is_err();
        let view: OperationResult<BalanceView> = OperationResult::from(result.map(|balance| {
            BalanceView {
                username: state.session.username.clone(),
                email: state.session.email.clone(),
                balance,
            }
        }))
        .with_context("server", serde_json::json!(ctx.config.base_url));
        println!("{}", serde_json::to_string_pretty(&view)?);
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let balance = result?;
    println!("{}", "Wallet Balance".bold());
    println!("  {}", output::format_amount(balance).bold());
    if !state.session.username.is_empty() {
        println!("  {}", format!("Account: {}", state.session.username).dimmed());
    }
    Ok(())
}
