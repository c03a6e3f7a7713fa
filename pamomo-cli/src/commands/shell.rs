//! Shell command - interactive routed wallet session
//!
//! The shell owns one `WalletApp` for its whole lifetime. Verification only
//! lasts as long as that session, so money movement lives here rather than
//! in one-shot commands.

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, Password, Select};
use rust_decimal::Decimal;

use pamomo_core::ports::{LoginRequest, RegisterRequest};
use pamomo_core::services::{EntryPoint, HistoryService, LogEvent, LoggingService, WalletApp};
use pamomo_core::{Navigation, Route};

use super::auth::print_signed_in;
use super::{get_context, get_logger, is_interactive, log_event, log_outcome};
use crate::output;

/// Routes offered on the dashboard
const DESTINATIONS: &str = "/send /withdraw /deposit /history /verify /logout";

enum Flow {
    Continue,
    Quit,
}

struct Shell {
    app: WalletApp,
    history: HistoryService,
    logger: Option<LoggingService>,
}

pub async fn run() -> Result<()> {
    if !is_interactive() {
        bail!("The shell needs an interactive terminal");
    }

    let ctx = get_context()?;
    let mut shell = Shell {
        app: ctx.app(),
        history: ctx.history_service.clone(),
        logger: get_logger(EntryPoint::Shell),
    };

    let spinner = output::spinner("Restoring session...");
    let started = shell.app.start().await;
    spinner.finish_and_clear();
    started?;
    if let Some(warning) = shell.app.take_warning() {
        output::warning(&format!("Could not load balance: {}", warning));
    }
    log_event(&shell.logger, LogEvent::new("shell_started"));

    output::info("Pamomo wallet shell. Type 'help' for commands.");
    shell.run_loop().await
}

impl Shell {
    async fn run_loop(&mut self) -> Result<()> {
        loop {
            let route = self.app.route();
            log_event(&self.logger, LogEvent::new("page_opened").with_route(route));

            let flow = match route {
                Route::Login => self.login_page().await?,
                Route::Register => self.register_page().await?,
                Route::Dashboard => {
                    self.dashboard_page();
                    self.after_page(route).await?
                }
                Route::History => {
                    self.history_page()?;
                    self.after_page(route).await?
                }
                Route::Verify => {
                    self.verify_page()?;
                    self.after_page(route).await?
                }
                Route::Send => {
                    self.send_page().await?;
                    self.after_page(route).await?
                }
                Route::Withdraw => {
                    self.withdraw_page().await?;
                    self.after_page(route).await?
                }
                Route::Deposit => {
                    self.deposit_page().await?;
                    self.after_page(route).await?
                }
            };

            if let Flow::Quit = flow {
                log_event(&self.logger, LogEvent::new("shell_closed"));
                return Ok(());
            }
        }
    }

    /// A completed form moves on by itself; otherwise ask where to go
    async fn after_page(&mut self, rendered: Route) -> Result<Flow> {
        if self.app.route() != rendered {
            return Ok(Flow::Continue);
        }
        self.prompt_next().await
    }

    async fn prompt_next(&mut self) -> Result<Flow> {
        loop {
            let input: String = Input::new()
                .with_prompt(format!("pamomo {}", self.app.route()))
                .allow_empty(true)
                .interact_text()?;
            let input = input.trim();

            match input {
                "" => continue,
                "quit" | "exit" | "q" => return Ok(Flow::Quit),
                "help" | "?" => {
                    println!("Routes: /dashboard {}", DESTINATIONS);
                    println!("Other:  refresh (reload balance), quit");
                }
                "refresh" => self.refresh().await,
                "/logout" | "logout" => {
                    self.logout();
                    return Ok(Flow::Continue);
                }
                path => match path.parse::<Route>() {
                    Ok(requested) => {
                        if let Navigation::Redirect(landed) = self.app.navigate(requested) {
                            output::warning(&format!(
                                "{} is not available right now, showing {}",
                                requested, landed
                            ));
                        }
                        return Ok(Flow::Continue);
                    }
                    Err(e) => output::error(&e),
                },
            }
        }
    }

    async fn refresh(&mut self) {
        let spinner = output::spinner("Fetching balance...");
        let result = self.app.refresh_balance().await;
        spinner.finish_and_clear();
        log_outcome(&self.logger, "balance_refresh", &result);
        match result {
            Ok(balance) => println!("Balance: {}", output::format_amount(balance).bold()),
            Err(e) => output::error(&e.to_string()),
        }
    }

    fn logout(&mut self) {
        let result = self.app.logout();
        log_outcome(&self.logger, "logout", &result);
        match result {
            Ok(_) => output::success("Logged out"),
            Err(e) => output::error(&format!("Logged out, but stored credentials remain: {}", e)),
        }
    }

    /// Balance line after an operation, plus any refresh warning
    fn report_balance(&mut self, balance: Option<Decimal>) {
        if let Some(balance) = balance {
            println!("New balance: {}", output::format_amount(balance).bold());
        }
        if let Some(warning) = self.app.take_warning() {
            output::warning(&warning);
        }
    }

    // =========================================================================
    // Public pages
    // =========================================================================

    async fn login_page(&mut self) -> Result<Flow> {
        println!();
        let choice = Select::new()
            .with_prompt("Welcome to Pamomo")
            .items(&["Log in", "Create an account", "Quit"])
            .default(0)
            .interact()?;
        match choice {
            0 => {}
            1 => {
                self.app.navigate(Route::Register);
                return Ok(Flow::Continue);
            }
            _ => return Ok(Flow::Quit),
        }

        let request = LoginRequest {
            username: Input::new().with_prompt("Username").allow_empty(true).interact_text()?,
            email: Input::new().with_prompt("Email").allow_empty(true).interact_text()?,
            password: Password::new()
                .with_prompt("Password")
                .allow_empty_password(true)
                .interact()?,
        };

        let spinner = output::spinner("Logging in...");
        let result = self.app.login(&request).await;
        spinner.finish_and_clear();
        log_outcome(&self.logger, "login", &result);

        match result {
            Ok(_) => print_signed_in(&mut self.app),
            Err(e) => output::error(&e.to_string()),
        }
        Ok(Flow::Continue)
    }

    async fn register_page(&mut self) -> Result<Flow> {
        println!();
        let choice = Select::new()
            .with_prompt("Create a Pamomo account")
            .items(&["Continue", "Back to log in", "Quit"])
            .default(0)
            .interact()?;
        match choice {
            0 => {}
            1 => {
                self.app.navigate(Route::Login);
                return Ok(Flow::Continue);
            }
            _ => return Ok(Flow::Quit),
        }

        let request = RegisterRequest {
            username: Input::new().with_prompt("Username").allow_empty(true).interact_text()?,
            email: Input::new().with_prompt("Email").allow_empty(true).interact_text()?,
            password: Password::new()
                .with_prompt("Password")
                .allow_empty_password(true)
                .interact()?,
            password_confirmation: Password::new()
                .with_prompt("Confirm password")
                .allow_empty_password(true)
                .interact()?,
        };

        let spinner = output::spinner("Creating account...");
        let result = self.app.register(&request).await;
        spinner.finish_and_clear();
        log_outcome(&self.logger, "register", &result);

        match result {
            Ok(_) => print_signed_in(&mut self.app),
            Err(e) => output::error(&e.to_string()),
        }
        Ok(Flow::Continue)
    }

    // =========================================================================
    // Authenticated pages
    // =========================================================================

    fn dashboard_page(&mut self) {
        let state = self.app.state();
        println!();
        println!("{}", "Dashboard".bold());
        println!("Hello, {}", state.session.username);

        if self.app.balance_known() {
            let mut line = format!("Balance: {}", output::format_amount(state.wallet.balance).bold());
            if state.wallet.stale {
                line.push_str(&" (may be out of date, type 'refresh')".dimmed().to_string());
            }
            println!("{}", line);
        } else {
            println!("Balance: {}", "unavailable, type 'refresh'".dimmed());
        }

        if !state.session.verified {
            output::warning("Identity not verified. Go to /verify before moving money.");
        }

        let recent = self.history.list(&state.wallet, Some(5));
        if !recent.is_empty() {
            println!();
            println!("{}", "Recent transactions".bold());
            println!("{}", output::transaction_table(&recent));
        }
        println!("{}", format!("Go to: {}", DESTINATIONS).dimmed());
    }

    fn history_page(&mut self) -> Result<()> {
        let wallet = &self.app.state().wallet;
        println!();
        println!("{}", "Transaction History".bold());

        let transactions = self.history.list(wallet, None);
        if transactions.is_empty() {
            println!("No transactions yet this session.");
            return Ok(());
        }
        println!("{}", output::transaction_table(&transactions));

        let totals = self.history.summary(wallet);
        println!(
            "{} transactions, in {}, out {}, net {}",
            totals.count,
            output::format_amount(totals.credits).green(),
            output::format_amount(totals.debits).red(),
            output::format_amount(totals.net()).bold()
        );

        let path: String = Input::new()
            .with_prompt("Export to CSV file (blank to skip)")
            .allow_empty(true)
            .interact_text()?;
        let path = path.trim();
        if !path.is_empty() {
            match self.history.export_to_path(self.app.transactions(), Path::new(path)) {
                Ok(rows) => {
                    log_event(&self.logger, LogEvent::new("history_exported"));
                    output::success(&format!("Exported {} transactions to {}", rows, path));
                }
                Err(e) => output::error(&format!("Export failed: {}", e)),
            }
        }
        Ok(())
    }

    fn verify_page(&mut self) -> Result<()> {
        println!();
        println!("{}", "Verify Identity".bold());
        if self.app.session().verified {
            output::success("Your identity is already verified for this session.");
            return Ok(());
        }

        let confirmed = Confirm::new()
            .with_prompt("Confirm your identity to enable money movement?")
            .default(true)
            .interact()?;
        if confirmed {
            let result = self.app.verify();
            log_outcome(&self.logger, "verify", &result);
            match result {
                Ok(_) => output::success("Identity verified"),
                Err(e) => output::error(&e.to_string()),
            }
        }
        Ok(())
    }

    async fn send_page(&mut self) -> Result<()> {
        println!();
        println!("{}", "Send Money".bold());

        let receiver: String = Input::new()
            .with_prompt("Recipient email")
            .allow_empty(true)
            .interact_text()?;
        let amount: String = Input::new()
            .with_prompt("Amount")
            .allow_empty(true)
            .interact_text()?;

        let spinner = output::spinner("Sending...");
        let result = self.app.send(&receiver, &amount).await;
        spinner.finish_and_clear();
        log_outcome(&self.logger, "send", &result);

        match result {
            Ok(outcome) => {
                output::success(&format!(
                    "Sent {} to {}",
                    output::format_amount(outcome.transaction.amount),
                    receiver.trim()
                ));
                self.report_balance(outcome.balance);
            }
            Err(e) => output::error(&e.to_string()),
        }
        Ok(())
    }

    async fn withdraw_page(&mut self) -> Result<()> {
        println!();
        println!("{}", "Withdraw Money".bold());
        if self.app.balance_known() {
            println!(
                "Available: {}",
                output::format_amount(self.app.state().wallet.balance)
            );
        }

        let amount: String = Input::new()
            .with_prompt("Amount")
            .allow_empty(true)
            .interact_text()?;
        let code = Password::new()
            .with_prompt("Confirmation code")
            .allow_empty_password(true)
            .interact()?;

        let spinner = output::spinner("Withdrawing...");
        let result = self.app.withdraw(&amount, &code).await;
        spinner.finish_and_clear();
        log_outcome(&self.logger, "withdraw", &result);

        match result {
            Ok(outcome) => {
                let receipt = &outcome.receipt;
                output::success("Withdrawal successful");
                let mut table = output::create_table();
                table.add_row(vec!["Amount".to_string(), output::format_amount(receipt.amount)]);
                table.add_row(vec![
                    "Withdrawal fee".to_string(),
                    output::format_amount(receipt.withdrawal_fee),
                ]);
                if !receipt.trans_id.is_empty() {
                    table.add_row(vec!["Transaction ID".to_string(), receipt.trans_id.clone()]);
                }
                if !receipt.time_stamp.is_empty() {
                    table.add_row(vec!["Time".to_string(), receipt.time_stamp.clone()]);
                }
                println!("{}", table);
                self.report_balance(outcome.balance);
            }
            Err(e) => output::error(&e.to_string()),
        }
        Ok(())
    }

    async fn deposit_page(&mut self) -> Result<()> {
        println!();
        println!("{}", "Deposit Money".bold());

        let amount: String = Input::new()
            .with_prompt("Amount")
            .allow_empty(true)
            .interact_text()?;

        let spinner = output::spinner("Depositing...");
        let result = self.app.deposit(&amount).await;
        spinner.finish_and_clear();
        log_outcome(&self.logger, "deposit", &result);

        match result {
            Ok(outcome) => {
                output::success(&format!(
                    "Deposited {}",
                    output::format_amount(outcome.transaction.amount)
                ));
                self.report_balance(outcome.balance);
            }
            Err(e) => output::error(&e.to_string()),
        }
        Ok(())
    }
}
