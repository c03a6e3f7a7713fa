//! Core domain entities
//!
//! Pure data structures and state transitions - no I/O.

pub mod input;
pub mod result;
pub mod route;
mod session;
pub mod state;
mod transaction;
mod wallet;

pub use route::{Navigation, Route, RouteGuard, VerificationGating};
pub use session::{Session, StoredCredentials};
pub use state::{Action, AppState};
pub use transaction::{Transaction, TransactionKind};
pub use wallet::{Wallet, WalletTotals};
