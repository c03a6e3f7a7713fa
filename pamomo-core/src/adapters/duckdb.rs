//! DuckDB-backed durable storage

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use duckdb::{params, Connection};

use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::migrations::STORAGE_MIGRATIONS;
use crate::ports::{KeyValueStore, StorageKey};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Open a DuckDB file, retrying with exponential backoff while it is locked
///
/// Another `pamomo` process (e.g. a shell left open) may hold the file briefly.
pub(crate) fn open_with_retry(db_path: &Path) -> Result<Connection> {
    let mut last_error = None;

    for attempt in 0..MAX_RETRIES {
        match try_open_connection(db_path) {
            Ok(conn) => return Ok(conn),
            Err(e) => {
                let err_msg = e.to_string();
                if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    tracing::warn!(
                        path = %db_path.display(),
                        delay_ms = delay.as_millis() as u64,
                        attempt = attempt + 1,
                        max = MAX_RETRIES,
                        "database busy, retrying: {}",
                        err_msg
                    );
                    thread::sleep(delay);
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
}

fn try_open_connection(db_path: &Path) -> Result<Connection> {
    // Extension autoloading stays off: cached extensions may not match the bundled build
    let config = duckdb::Config::default().enable_autoload_extension(false)?;
    Ok(Connection::open_with_flags(db_path, config)?)
}

/// Durable key/value storage in `pamomo.duckdb`
pub struct DuckDbStorage {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbStorage {
    /// Open (or create) the storage database
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = open_with_retry(db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        })
    }

    /// Run any pending schema migrations
    pub fn ensure_schema(&self) -> Result<MigrationResult> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        MigrationService::new(&conn, STORAGE_MIGRATIONS).run_pending()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM local_storage", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DomainError::storage(format!("Lock poisoned: {}", e)))
    }
}

fn storage_error(e: duckdb::Error) -> DomainError {
    DomainError::storage(e.to_string())
}

impl KeyValueStore for DuckDbStorage {
    fn get(&self, key: StorageKey) -> DomainResult<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT entry_value FROM local_storage WHERE entry_key = ?")
            .map_err(storage_error)?;
        let mut rows = stmt
            .query_map([key.as_str()], |row| row.get::<_, String>(0))
            .map_err(storage_error)?;

        match rows.next() {
            Some(value) => Ok(Some(value.map_err(storage_error)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> DomainResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO local_storage (entry_key, entry_value, updated_at)
            VALUES (?, ?, current_timestamp)
            ON CONFLICT (entry_key) DO UPDATE SET
                entry_value = excluded.entry_value,
                updated_at = excluded.updated_at
            "#,
            params![key.as_str(), value],
        )
        .map_err(storage_error)?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> DomainResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM local_storage WHERE entry_key = ?", [key.as_str()])
            .map_err(storage_error)?;
        Ok(())
    }
}
