//! Port definitions (hexagonal architecture)
//!
//! The core depends only on these traits, not on concrete implementations.

mod account_service;
mod storage;

pub use account_service::{
    AccountService, Caller, LoginRequest, RegisterRequest, TransferReceipt, WithdrawalReceipt,
};
pub use storage::{KeyValueStore, StorageKey};
