//! Login, register and logout commands

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::{Input, Password};

use pamomo_core::ports::{LoginRequest, RegisterRequest};
use pamomo_core::services::{EntryPoint, LogEvent, WalletApp};

use super::{get_context, get_logger, is_interactive, log_event, log_outcome};
use crate::output;

/// Value from a flag, or a prompt when running interactively
fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None if is_interactive() => Ok(Input::new().with_prompt(prompt).interact_text()?),
        None => bail!("Missing --{} (no terminal to prompt on)", prompt.to_lowercase()),
    }
}

fn password_or_prompt(value: Option<String>, confirm: bool) -> Result<(String, String)> {
    if let Some(v) = value {
        return Ok((v.clone(), v));
    }
    if !is_interactive() {
        bail!("Missing --password (no terminal to prompt on)");
    }
    let password = Password::new().with_prompt("Password").interact()?;
    let confirmation = if confirm {
        Password::new().with_prompt("Confirm password").interact()?
    } else {
        password.clone()
    };
    Ok((password, confirmation))
}

/// Report the balance fetched right after signing in
pub(crate) fn print_signed_in(app: &mut WalletApp) {
    let session = app.session();
    output::success(&format!("Logged in as {}", session.username));
    if app.balance_known() {
        println!("Balance: {}", output::format_amount(app.state().wallet.balance).bold());
    }
    if let Some(warning) = app.take_warning() {
        output::warning(&format!("Could not load balance: {}", warning));
    }
}

pub async fn login(
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger(EntryPoint::Cli);

    let request = LoginRequest {
        username: value_or_prompt(username, "Username")?,
        email: value_or_prompt(email, "Email")?,
        password: password_or_prompt(password, false)?.0,
    };

    let mut app = ctx.app();
    let spinner = output::spinner("Logging in...");
    let result = app.login(&request).await;
    spinner.finish_and_clear();

    log_outcome(&logger, "login", &result);
    result?;
    print_signed_in(&mut app);
    Ok(())
}

pub async fn register(
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger(EntryPoint::Cli);

    let username = value_or_prompt(username, "Username")?;
    let email = value_or_prompt(email, "Email")?;
    let (password, password_confirmation) = password_or_prompt(password, true)?;
    let request = RegisterRequest {
        username,
        email,
        password,
        password_confirmation,
    };

    let mut app = ctx.app();
    let spinner = output::spinner("Creating account...");
    let result = app.register(&request).await;
    spinner.finish_and_clear();

    log_outcome(&logger, "register", &result);
    result?;
    print_signed_in(&mut app);
    Ok(())
}

pub fn logout() -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger(EntryPoint::Cli);

    let mut app = ctx.app();
    app.logout()?;
    log_event(&logger, LogEvent::new("logged_out").with_command("logout"));

    output::success("Logged out");
    Ok(())
}
