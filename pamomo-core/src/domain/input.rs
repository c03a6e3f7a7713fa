//! Form input parsing shared by the login and operation flows

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::result::ValidationError;

/// Largest number of fractional digits accepted for an amount
const MAX_AMOUNT_SCALE: u32 = 2;

/// Parse a user-entered amount
///
/// Empty input, unparsable text, non-positive values and sub-cent
/// precision are all rejected.
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingAmount);
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    let amount = Decimal::from_str(&cleaned).map_err(|_| ValidationError::InvalidAmount)?;
    check_amount(amount)
}

/// Validate an already-typed amount
pub fn check_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(amount)
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// Loose shape check for an email address
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}
