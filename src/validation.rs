use std::fmt;

use bitcoin::{Address, Amount, Network};
use bitcoin::address::NetworkUnchecked;

const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("{} is required", field),
        }
    }

    pub fn invalid(field: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("{}: {}", field, reason),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message,
            "field": self.field,
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Parse a decimal BTC amount into satoshis, rounding to the nearest satoshi.
pub fn parse_amount(field: &str, raw: &str) -> Result<Amount, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::missing(field));
    }

    let btc: f64 = raw
        .parse()
        .map_err(|_| ValidationError::invalid(field, "must be a decimal number"))?;
    if !btc.is_finite() {
        return Err(ValidationError::invalid(field, "must be a finite number"));
    }
    if btc < 0.0 {
        return Err(ValidationError::invalid(field, "must be non-negative"));
    }

    let sats = (btc * SATS_PER_BTC).round();
    if sats > Amount::MAX_MONEY.to_sat() as f64 {
        return Err(ValidationError::invalid(field, "exceeds 21,000,000 BTC"));
    }

    Ok(Amount::from_sat(sats as u64))
}

pub fn validate_bitcoin_address(
    field: &str,
    addr: &str,
    network: Network,
) -> Result<Address, ValidationError> {
    if addr.len() > 100 {
        return Err(ValidationError::invalid(field, "too long"));
    }

    addr.parse::<Address<NetworkUnchecked>>()
        .map_err(|_| ValidationError::invalid(field, "must be a valid Bitcoin address"))?
        .require_network(network)
        .map_err(|_| ValidationError::invalid(field, "belongs to a different network"))
}
