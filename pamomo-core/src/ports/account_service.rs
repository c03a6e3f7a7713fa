//! Remote Account Service port
//!
//! The client trusts whatever this service answers. Adapters turn transport
//! and HTTP failures into `Error::Network` and refusals into `Error::Server`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Credentials submitted on the login form
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Fields submitted on the registration form
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Caller identity for balance and money-movement calls
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    pub email: &'a str,
    pub token: Option<&'a str>,
}

/// Server confirmation of a withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub amount: Decimal,
    pub withdrawal_fee: Decimal,
    pub trans_id: String,
    pub time_stamp: String,
}

/// Server confirmation of a deposit or transfer
///
/// Both endpoints answer with loosely specified bodies, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub amount: Option<Decimal>,
    pub trans_id: Option<String>,
    pub time_stamp: Option<String>,
}

/// Remote Account Service abstraction
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Exchange credentials for a token
    async fn login(&self, request: &LoginRequest) -> Result<String>;

    /// Create an account, returning a token
    async fn register(&self, request: &RegisterRequest) -> Result<String>;

    /// Current balance for the caller's email
    async fn get_balance(&self, caller: Caller<'_>) -> Result<Decimal>;

    async fn withdraw(&self, caller: Caller<'_>, amount: Decimal) -> Result<WithdrawalReceipt>;

    async fn deposit(&self, caller: Caller<'_>, amount: Decimal) -> Result<TransferReceipt>;

    async fn transfer(
        &self,
        caller: Caller<'_>,
        receiver: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt>;
}
