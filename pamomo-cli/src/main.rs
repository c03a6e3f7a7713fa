//! Pamomo CLI - digital wallet in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{auth, balance, config, logs, shell, status};
use pamomo_core::services::{EntryPoint, LogEvent};

/// Pamomo - send, withdraw and deposit money from your terminal
#[derive(Parser)]
#[command(name = "pamomo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        /// Password (prompted twice when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Fetch the current balance
    Balance {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the stored session without contacting the server
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive wallet: verify, send, withdraw, deposit and history
    Shell,

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Register { .. } => "register",
            Commands::Logout => "logout",
            Commands::Balance { .. } => "balance",
            Commands::Status { .. } => "status",
            Commands::Shell => "shell",
            Commands::Logs { .. } => "logs",
            Commands::Config { .. } => "config",
        }
    }
}

/// Diagnostics go to stderr, filtered by `PAMOMO_LOG` or `RUST_LOG`
fn init_tracing() {
    let filter = EnvFilter::try_from_env("PAMOMO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let name = cli.command.name();

    let result = run(cli).await;

    // The logs command manages the log itself
    if name != "logs" {
        let logger = commands::get_logger(EntryPoint::Cli);
        commands::log_event(&logger, LogEvent::new("command_executed").with_command(name));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(command = name, error = ?e, "command failed");
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { username, email, password } => {
            auth::login(username, email, password).await
        }
        Commands::Register { username, email, password } => {
            auth::register(username, email, password).await
        }
        Commands::Logout => auth::logout(),
        Commands::Balance { json } => balance::run(json).await,
        Commands::Status { json } => status::run(json),
        Commands::Shell => shell::run().await,
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login_flags() {
        let cli = Cli::try_parse_from([
            "pamomo", "login", "--username", "alice", "--email", "a@x.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Login { username, email, password } => {
                assert_eq!(username.as_deref(), Some("alice"));
                assert_eq!(email.as_deref(), Some("a@x.com"));
                assert!(password.is_none());
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_parse_logs_clear() {
        let cli = Cli::try_parse_from(["pamomo", "logs", "clear", "--older-than-days", "7", "-f"])
            .unwrap();
        assert_eq!(cli.command.name(), "logs");
    }
}
