//! Pamomo Core - session, wallet and money-movement logic for the Pamomo wallet client
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: Session, wallet, transactions, routes and the state reducer
//! - **ports**: Trait definitions for external dependencies (AccountService, KeyValueStore)
//! - **services**: Business logic orchestration and the `WalletApp` controller
//! - **adapters**: Concrete implementations (DuckDB storage, HTTP client)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbStorage;
use adapters::http::HttpAccountService;
use config::Config;
use ports::{AccountService, KeyValueStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, ValidationError};
pub use domain::{
    Action, AppState, Navigation, Route, RouteGuard, Session, Transaction, TransactionKind,
    VerificationGating, Wallet, WalletTotals,
};

/// Main context for Pamomo operations
///
/// Holds the configuration, the storage and account-service adapters,
/// and every service wired to them.
pub struct PamomoContext {
    pub config: Config,
    pub storage: Arc<dyn KeyValueStore>,
    pub accounts: Arc<dyn AccountService>,
    pub session_store: SessionStore,
    pub auth_service: AuthService,
    pub wallet_service: WalletService,
    pub operation_service: OperationService,
    pub history_service: HistoryService,
    pub status_service: StatusService,
}

impl PamomoContext {
    /// Open the context for a pamomo directory
    ///
    /// Storage lives in `pamomo.duckdb`; the account service is the HTTP
    /// client pointed at the configured base URL.
    pub fn new(pamomo_dir: &Path) -> Result<Self> {
        let config = Config::load(pamomo_dir)?;

        let storage = DuckDbStorage::new(&pamomo_dir.join("pamomo.duckdb"))?;
        storage.ensure_schema()?;

        let accounts = HttpAccountService::from_config(&config)?;
        Ok(Self::with_adapters(config, Arc::new(storage), Arc::new(accounts)))
    }

    /// Wire services over arbitrary adapters
    pub fn with_adapters(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        accounts: Arc<dyn AccountService>,
    ) -> Self {
        let session_store = SessionStore::new(Arc::clone(&storage));
        let auth_service = AuthService::new(Arc::clone(&accounts), session_store.clone());
        let wallet_service = WalletService::new(Arc::clone(&accounts));
        let operation_service = OperationService::new(
            Arc::clone(&accounts),
            wallet_service.clone(),
            config.confirmation_code.clone(),
        );
        let status_service = StatusService::new(&config);

        Self {
            config,
            storage,
            accounts,
            session_store,
            auth_service,
            wallet_service,
            operation_service,
            history_service: HistoryService::new(),
            status_service,
        }
    }

    /// A fresh controller for an interactive session
    pub fn app(&self) -> WalletApp {
        WalletApp::new(
            RouteGuard::new(self.config.verification_gating),
            self.session_store.clone(),
            self.auth_service.clone(),
            self.wallet_service.clone(),
            self.operation_service.clone(),
        )
    }
}
