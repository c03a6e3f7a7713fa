//! CLI command implementations

pub mod auth;
pub mod balance;
pub mod config;
pub mod logs;
pub mod shell;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use pamomo_core::services::{EntryPoint, LogEvent, LoggingService};
use pamomo_core::{Error, PamomoContext};

/// Environment variable overriding the data directory
const PAMOMO_DIR_ENV: &str = "PAMOMO_DIR";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger(entry_point: EntryPoint) -> Option<LoggingService> {
    let pamomo_dir = get_pamomo_dir().ok()?;
    std::fs::create_dir_all(&pamomo_dir).ok()?;
    match LoggingService::new(&pamomo_dir, entry_point, env!("CARGO_PKG_VERSION")) {
        Ok(logger) => Some(logger),
        Err(e) => {
            tracing::debug!(error = %e, "event log unavailable");
            None
        }
    }
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            tracing::debug!(error = %e, "failed to write event log");
        }
    }
}

/// Log `{action}_succeeded`, `{action}_rejected` or `{action}_failed`
///
/// Rejected means the client refused before any network call.
pub fn log_outcome<T>(logger: &Option<LoggingService>, action: &str, result: &Result<T, Error>) {
    let event = match result {
        Ok(_) => LogEvent::new(format!("{}_succeeded", action)),
        Err(e) if e.is_rejected_locally() => {
            LogEvent::new(format!("{}_rejected", action)).with_error(e)
        }
        Err(e) => LogEvent::new(format!("{}_failed", action)).with_error(e),
    };
    log_event(logger, event);
}

/// Get the pamomo directory from environment or default
pub fn get_pamomo_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(PAMOMO_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".pamomo"))
}

/// Get or create pamomo context
pub fn get_context() -> Result<PamomoContext> {
    let pamomo_dir = get_pamomo_dir()?;

    std::fs::create_dir_all(&pamomo_dir)
        .with_context(|| format!("Failed to create pamomo directory: {:?}", pamomo_dir))?;

    PamomoContext::new(&pamomo_dir).context("Failed to initialize pamomo context")
}

/// Whether prompts can be shown
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}
