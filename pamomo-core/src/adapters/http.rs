//! Remote Account Service HTTP client
//!
//! JSON over HTTP against the wallet backend (Django + dj-rest-auth).
//! Response numbers may arrive either as JSON numbers or as strings
//! (DecimalField serializes as a string), so both are accepted.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::{Config, Endpoints};
use crate::domain::result::{Error, Result};
use crate::ports::{
    AccountService, Caller, LoginRequest, RegisterRequest, TransferReceipt, WithdrawalReceipt,
};

/// Message shown when the server refuses without saying why
const GENERIC_FAILURE: &str = "An error occurred. Please try again.";

// =============================================================================
// Wire models
// =============================================================================

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password1: &'a str,
    password2: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct AmountBody<'a> {
    email: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Serialize)]
struct TransferBody<'a> {
    email: &'a str,
    receiver: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(deserialize_with = "deserialize_amount")]
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct WithdrawResponse {
    #[serde(deserialize_with = "deserialize_amount")]
    amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    withdrawal_fee: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_id")]
    trans_id: String,
    #[serde(default)]
    time_stamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransferResponse {
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    trans_id: Option<String>,
    #[serde(default)]
    time_stamp: Option<String>,
}

fn json_to_decimal(value: &JsonValue) -> std::result::Result<Decimal, String> {
    match value {
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .map_err(|e| format!("invalid decimal: {}", e)),
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("invalid decimal: {}", e)),
        _ => Err("expected number or string for amount".to_string()),
    }
}

/// Deserialize amount that can be number or string
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    json_to_decimal(&value).map_err(D::Error::custom)
}

fn deserialize_optional_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(v) => json_to_decimal(&v).map(Some).map_err(D::Error::custom),
    }
}

/// Deserialize ID that can be number or string
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Pull a human-readable message out of a DRF-style error body
///
/// Prefers `non_field_errors`, then `detail`, then every field message in order.
fn extract_error_message(body: &JsonValue) -> Option<String> {
    fn collect(value: &JsonValue, out: &mut Vec<String>) {
        match value {
            JsonValue::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
            JsonValue::Array(items) => items.iter().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let obj = body.as_object()?;
    for preferred in ["non_field_errors", "detail", "error"] {
        if let Some(value) = obj.get(preferred) {
            let mut out = Vec::new();
            collect(value, &mut out);
            if !out.is_empty() {
                return Some(out.join(" "));
            }
        }
    }

    let mut out = Vec::new();
    for value in obj.values() {
        collect(value, &mut out);
    }
    (!out.is_empty()).then(|| out.join(" "))
}

// =============================================================================
// HTTP client
// =============================================================================

/// Remote Account Service over HTTP
#[derive(Debug, Clone)]
pub struct HttpAccountService {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
    timeout: Duration,
}

impl HttpAccountService {
    pub fn new(base_url: &str, endpoints: Endpoints, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.base_url, config.endpoints.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<Response> {
        let url = self.url(path);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request.send().await.map_err(|e| self.map_request_error(e))?;
        tracing::debug!(path, status = response.status().as_u16(), "account service response");
        Ok(response)
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        tracing::warn!(error = %error, "account service request failed");
        if error.is_timeout() {
            Error::network(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::network("Unable to connect to the account service")
        } else {
            Error::network(format!("Account service request failed: {}", error))
        }
    }

    /// Turn a refused write into a surfaced message
    ///
    /// 4xx bodies carry the server's explanation; anything else is generic.
    async fn rejection(response: Response) -> Error {
        let status = response.status();
        let body: Option<JsonValue> = response.json().await.ok();
        let message = body.as_ref().and_then(extract_error_message);

        if status.is_client_error() {
            Error::server(message.unwrap_or_else(|| GENERIC_FAILURE.to_string()))
        } else {
            tracing::warn!(status = status.as_u16(), "account service error status");
            Error::network(GENERIC_FAILURE)
        }
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response, what: &str) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            tracing::warn!(error = %e, what, "unparsable account service response");
            Error::network(format!("Failed to parse {} response", what))
        })
    }

    async fn money_movement(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
        token: Option<&str>,
    ) -> Result<TransferReceipt> {
        let response = self.post(path, body, token).await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // Empty or non-JSON success bodies still count as confirmation
        let parsed: TransferResponse = response.json().await.unwrap_or_default();
        Ok(TransferReceipt {
            amount: parsed.amount,
            trans_id: parsed.trans_id,
            time_stamp: parsed.time_stamp,
        })
    }
}

#[async_trait]
impl AccountService for HttpAccountService {
    async fn login(&self, request: &LoginRequest) -> Result<String> {
        let body = LoginBody {
            username: &request.username,
            email: &request.email,
            password: &request.password,
        };
        let response = self.post(&self.endpoints.login, &body, None).await?;

        if !response.status().is_success() {
            tracing::info!(status = response.status().as_u16(), "login refused");
            return Err(Error::server("Invalid credentials. Please try again."));
        }

        let parsed: KeyResponse = response
            .json()
            .await
            .map_err(|_| Error::server("Unexpected response from server."))?;
        parsed
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::server("Unexpected response from server."))
    }

    async fn register(&self, request: &RegisterRequest) -> Result<String> {
        let body = RegisterBody {
            username: &request.username,
            email: &request.email,
            password1: &request.password,
            password2: &request.password_confirmation,
        };
        let response = self.post(&self.endpoints.register, &body, None).await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let parsed: KeyResponse = Self::parse(response, "registration").await?;
        match (parsed.key.filter(|k| !k.is_empty()), parsed.detail) {
            (Some(key), _) => Ok(key),
            // Mandatory email verification: account created but no token yet
            (None, Some(detail)) => Err(Error::server(detail)),
            (None, None) => Err(Error::server("Unexpected response from server.")),
        }
    }

    async fn get_balance(&self, caller: Caller<'_>) -> Result<Decimal> {
        let body = EmailBody {
            email: caller.email,
        };
        let response = self.post(&self.endpoints.balance, &body, caller.token).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "Failed to fetch balance: {}",
                status.as_u16()
            )));
        }

        let parsed: BalanceResponse = Self::parse(response, "balance").await?;
        Ok(parsed.balance)
    }

    async fn withdraw(&self, caller: Caller<'_>, amount: Decimal) -> Result<WithdrawalReceipt> {
        let body = AmountBody {
            email: caller.email,
            amount,
        };
        let response = self.post(&self.endpoints.withdraw, &body, caller.token).await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // A 2xx means the server has already debited the account
        match response.json::<WithdrawResponse>().await {
            Ok(parsed) => Ok(WithdrawalReceipt {
                amount: parsed.amount,
                withdrawal_fee: parsed.withdrawal_fee.unwrap_or(Decimal::ZERO),
                trans_id: parsed.trans_id,
                time_stamp: parsed.time_stamp.unwrap_or_default(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "withdrawal confirmed without a readable receipt");
                Ok(WithdrawalReceipt {
                    amount,
                    withdrawal_fee: Decimal::ZERO,
                    trans_id: String::new(),
                    time_stamp: String::new(),
                })
            }
        }
    }

    async fn deposit(&self, caller: Caller<'_>, amount: Decimal) -> Result<TransferReceipt> {
        let body = AmountBody {
            email: caller.email,
            amount,
        };
        self.money_movement(&self.endpoints.deposit, &body, caller.token)
            .await
    }

    async fn transfer(
        &self,
        caller: Caller<'_>,
        receiver: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt> {
        let body = TransferBody {
            email: caller.email,
            receiver,
            amount,
        };
        self.money_movement(&self.endpoints.transfer, &body, caller.token)
            .await
    }
}
