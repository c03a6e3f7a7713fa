//! Status command - show who is signed in, without touching the network

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let state = ctx.session_store.restore()?;
    let status = ctx.status_service.get_status(&state, false);

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Wallet Status".bold());
    println!();

    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let mut table = output::create_table();
    table.add_row(vec!["Logged in", yes_no(status.authenticated)]);
    table.add_row(vec!["Username", status.username.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Email", status.email.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Verified", yes_no(status.verified)]);
    table.add_row(vec!["Server", status.api_base_url.as_str()]);
    println!("{}", table);

    if !status.authenticated {
        println!();
        println!("Run 'pamomo login' to sign in.");
    } else {
        println!();
        println!(
            "{}",
            "Identity verification lasts for one shell session; use 'pamomo shell' to move money."
                .dimmed()
        );
    }

    Ok(())
}
