//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area; `WalletApp` ties them
//! together for an interactive session.

mod app;
mod auth;
mod history;
pub mod logging;
pub mod migration;
mod operations;
mod session;
mod status;
mod wallet;

pub use app::WalletApp;
pub use auth::AuthService;
pub use history::HistoryService;
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use operations::{OperationOutcome, OperationService};
pub use session::SessionStore;
pub use status::{StatusService, StatusSummary};
pub use wallet::WalletService;
