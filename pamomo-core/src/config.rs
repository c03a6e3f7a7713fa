//! Configuration management
//!
//! Settings live in `settings.json` inside the pamomo directory:
//! ```json
//! {
//!   "api": { "baseUrl": "http://127.0.0.1:8000", "timeoutSecs": 30, "endpoints": { ... } },
//!   "wallet": { "confirmationCode": "1234", "verificationGating": "all" }
//! }
//! ```
//! Fields this crate does not manage are kept untouched on save.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::Error;
use crate::domain::VerificationGating;

/// Default Remote Account Service location
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable overriding `api.baseUrl`
pub const API_URL_ENV: &str = "PAMOMO_API_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Withdrawal confirmation code used until a server-side check exists
const DEFAULT_CONFIRMATION_CODE: &str = "1234";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    wallet: WalletSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default)]
    endpoints: EndpointSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    register: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    withdraw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deposit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transfer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confirmation_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verification_gating: Option<VerificationGating>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Paths of the Remote Account Service endpoints, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub balance: String,
    pub withdraw: String,
    pub deposit: String,
    pub transfer: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/v1/dj-rest-auth/login".to_string(),
            register: "/api/v1/dj-rest-auth/registration/".to_string(),
            balance: "/api/v1/accounts/get-balance/".to_string(),
            withdraw: "/api/v1/wtdr/".to_string(),
            deposit: "/api/v1/accounts/deposit/".to_string(),
            transfer: "/api/v1/accounts/transfer/".to_string(),
        }
    }
}

impl Endpoints {
    fn merged(raw: &EndpointSettings) -> Self {
        let defaults = Self::default();
        Self {
            login: raw.login.clone().unwrap_or(defaults.login),
            register: raw.register.clone().unwrap_or(defaults.register),
            balance: raw.balance.clone().unwrap_or(defaults.balance),
            withdraw: raw.withdraw.clone().unwrap_or(defaults.withdraw),
            deposit: raw.deposit.clone().unwrap_or(defaults.deposit),
            transfer: raw.transfer.clone().unwrap_or(defaults.transfer),
        }
    }
}

/// Pamomo configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub endpoints: Endpoints,
    pub confirmation_code: String,
    pub verification_gating: VerificationGating,
    /// `base_url` came from `PAMOMO_API_URL` and is not saved to the file
    base_url_from_env: bool,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoints: Endpoints::default(),
            confirmation_code: DEFAULT_CONFIRMATION_CODE.to_string(),
            verification_gating: VerificationGating::default(),
            base_url_from_env: false,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the pamomo directory
    ///
    /// `PAMOMO_API_URL` overrides the base URL from the file.
    pub fn load(pamomo_dir: &Path) -> Result<Self> {
        let raw = Self::read_settings(pamomo_dir)?;

        let env_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        let base_url_from_env = env_url.is_some();
        let base_url = env_url
            .or_else(|| raw.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(raw.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            endpoints: Endpoints::merged(&raw.api.endpoints),
            confirmation_code: raw
                .wallet
                .confirmation_code
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIRMATION_CODE.to_string()),
            verification_gating: raw.wallet.verification_gating.unwrap_or_default(),
            base_url_from_env,
            _raw_settings: raw,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse settings.json; a file that does not parse is an error, never defaults
    fn read_settings(pamomo_dir: &Path) -> Result<SettingsFile> {
        let settings_path = pamomo_dir.join("settings.json");
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(&settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", settings_path.display()))
    }

    /// Save config to the pamomo directory
    ///
    /// Preserves other settings that the client doesn't manage. A file that
    /// no longer parses is left alone and the save fails.
    pub fn save(&self, pamomo_dir: &Path) -> Result<()> {
        let settings_path = pamomo_dir.join("settings.json");
        let mut settings = Self::read_settings(pamomo_dir)?;

        if !self.base_url_from_env {
            settings.api.base_url = Some(self.base_url.clone());
        }
        settings.api.timeout_secs = Some(self.timeout.as_secs());
        settings.wallet.confirmation_code = Some(self.confirmation_code.clone());
        settings.wallet.verification_gating = Some(self.verification_gating);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Check the base URL is an absolute http(s) URL and the timeout is set
    pub fn validate(&self) -> std::result::Result<(), Error> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            Error::Config(format!("Invalid API base URL {}: {}", self.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config("API base URL must use http or https".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config(
                "API timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Update a single setting by its dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.baseUrl" => {
                self.base_url = value.trim().trim_end_matches('/').to_string();
                self.base_url_from_env = false;
            }
            "api.timeoutSecs" => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid timeout: {}", value))?;
                self.timeout = Duration::from_secs(secs);
            }
            "wallet.confirmationCode" => {
                if value.trim().is_empty() {
                    anyhow::bail!("Confirmation code cannot be empty");
                }
                self.confirmation_code = value.trim().to_string();
            }
            "wallet.verificationGating" => {
                self.verification_gating = value.parse().map_err(anyhow::Error::msg)?;
            }
            _ => anyhow::bail!(
                "Unknown setting: {}. Available: api.baseUrl, api.timeoutSecs, \
                 wallet.confirmationCode, wallet.verificationGating",
                key
            ),
        }
        Ok(self.validate()?)
    }
}
