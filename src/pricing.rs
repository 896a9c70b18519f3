//! Server-side pricing authority.
//!
//! The price table is the only source a consultation fee can come from.
//! Request payloads carry provider display fields but no price; anything
//! money-related is resolved here, on the server, at order initiation.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Built-in consultation prices (whole currency units), keyed by
/// provider id. Used when no price file is configured.
const DEFAULT_PRICES: &[(&str, i64)] = &[
    ("1", 800),
    ("2", 1200),
    ("3", 900),
    ("4", 1500),
    ("5", 700),
    ("6", 1000),
];

#[derive(Error, Debug)]
pub enum PriceTableError {
    #[error("Failed to read price file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Price file {path} is not a valid provider→fee map: {reason}")]
    Malformed { path: String, reason: String },
}

/// A consultation price resolved from the server's price table.
///
/// Has no public constructor on purpose — the only way to obtain one is
/// [`PriceTable::fee_for`], so a client-supplied number can never reach
/// the billing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConsultationFee(i64);

impl ConsultationFee {
    /// Fee in whole currency units, as stored on the appointment.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Fee in the payment processor's minor currency unit.
    pub fn minor_units(&self) -> i64 {
        self.0 * 100
    }

    #[cfg(test)]
    pub fn test_fee(amount: i64) -> Self {
        Self(amount)
    }
}

/// Immutable `provider_id → fee` map, loaded once at startup and
/// injected wherever pricing is needed.
#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: HashMap<String, i64>,
}

impl PriceTable {
    /// Table with the built-in default prices.
    pub fn builtin() -> Self {
        Self {
            prices: DEFAULT_PRICES
                .iter()
                .map(|(id, fee)| (id.to_string(), *fee))
                .collect(),
        }
    }

    /// Load a table from a JSON file of the shape `{"<provider_id>": <fee>, ...}`.
    pub fn from_json_file(path: &Path) -> Result<Self, PriceTableError> {
        let raw = std::fs::read_to_string(path).map_err(|e| PriceTableError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let prices: HashMap<String, i64> =
            serde_json::from_str(&raw).map_err(|e| PriceTableError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { prices })
    }

    #[cfg(test)]
    pub fn from_entries(entries: &[(&str, i64)]) -> Self {
        Self {
            prices: entries
                .iter()
                .map(|(id, fee)| (id.to_string(), *fee))
                .collect(),
        }
    }

    /// Resolve the authoritative fee for a provider. `None` means the
    /// provider is unknown and no order may be created for it.
    pub fn fee_for(&self, provider_id: &str) -> Option<ConsultationFee> {
        self.prices.get(provider_id).map(|fee| ConsultationFee(*fee))
    }
}
