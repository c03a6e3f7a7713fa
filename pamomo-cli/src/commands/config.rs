//! Config command - show and change settings.json values

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use pamomo_core::config::Config;

use super::get_pamomo_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one setting
    Set {
        /// Setting key (api.baseUrl, api.timeoutSecs, wallet.confirmationCode, wallet.verificationGating)
        key: String,
        value: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let pamomo_dir = get_pamomo_dir()?;
    std::fs::create_dir_all(&pamomo_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&pamomo_dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "baseUrl": config.base_url,
                        "timeoutSecs": config.timeout.as_secs(),
                        "endpoints": config.endpoints,
                        "verificationGating": config.verification_gating,
                        "confirmationCodeSet": !config.confirmation_code.is_empty(),
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            let mut table = output::create_table();
            table.add_row(vec!["api.baseUrl".to_string(), config.base_url.clone()]);
            table.add_row(vec![
                "api.timeoutSecs".to_string(),
                config.timeout.as_secs().to_string(),
            ]);
            table.add_row(vec![
                "wallet.verificationGating".to_string(),
                format!("{:?}", config.verification_gating).to_lowercase(),
            ]);
            table.add_row(vec!["wallet.confirmationCode".to_string(), "(hidden)".to_string()]);
            println!("{}", table);
            println!("{}", format!("Data directory: {}", pamomo_dir.display()).dimmed());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(&pamomo_dir)?;
            config.set(&key, &value)?;
            config.save(&pamomo_dir)?;
            output::success(&format!("Updated {}", key));
        }
    }

    Ok(())
}
