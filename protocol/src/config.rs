//! # Protocol Configuration & Constants
//!
//! Every magic number of the transaction core lives here. If you're
//! hardcoding a limit somewhere else, move it here first.
//!
//! Constants are split in two groups: wire-level limits that every node on
//! every network must agree on (they are part of the serialized format or
//! of validation), and [`NetworkConfig`], which carries the per-network
//! proof-of-work ceilings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Type Tags
// ---------------------------------------------------------------------------

/// Type tag carried by every transaction body. Anything else is rejected
/// during structural validation.
pub const TX_TAG: [u8; 4] = [0xAD, 0xBF, 0x00, 0x01];

// ---------------------------------------------------------------------------
// Size Limits
// ---------------------------------------------------------------------------

/// Transaction hash length in bytes (SHA-256).
pub const HASH_LENGTH: usize = 32;

/// Address length in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// Maximum length of the free-form message field.
pub const MESSAGE_MAX: usize = 255;

/// Maximum length of any array in a transaction: inputs, outputs, multisig
/// inputs/outputs, addresses of one multisig output, parents, signatures.
pub const ARRAY_MAX: usize = 255;

/// Maximum encoded size of a whole transaction (body + signatures).
pub const TRANSACTION_MAX: usize = 65_535;

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Minor units per coin. Values on the wire are always minor units.
pub const ONE_COIN: u64 = 100_000_000;

/// Total supply. No single output may carry more than this.
pub const MAX_SUPPLY: u64 = 25_000_000 * ONE_COIN;

// ---------------------------------------------------------------------------
// Hash Type Bits
// ---------------------------------------------------------------------------

/// Upper-nibble flag: the lower nibble counts trailing outputs excluded from
/// the signed payload.
pub const HASH_TYPE_EXCLUDE_OUTPUTS: u8 = 0x10;

/// Largest trailing-output count the lower nibble can carry.
pub const MAX_EXCLUDED_OUTPUTS: u8 = 0x0f;

/// Flag: the ticket output is excluded from the signed payload.
pub const HASH_TYPE_EXCLUDE_TICKET_OUTPUT: u8 = 0x20;

// ---------------------------------------------------------------------------
// NetworkConfig
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`NetworkConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed network config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("ticket easiness {ticket} must not exceed network easiness {network}")]
    TicketCeilingTooLoose { ticket: u32, network: u32 },
}

/// Per-network proof-of-work parameters.
///
/// A hash meets an easiness target `e` iff its last four bytes, read as a
/// little-endian `u32`, are `<= e`. Smaller easiness means harder work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Human-readable network name, used in logs only.
    pub name: String,
    /// Ceiling for the `easiness` field of every transaction.
    pub easiness: u32,
    /// Stricter ceiling applied to ticket-issuing transactions.
    pub ticket_easiness: u32,
}

impl NetworkConfig {
    /// Main network parameters.
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".to_string(),
            easiness: 0x03FF_FFFF,
            ticket_easiness: 0x0000_FFFF,
        }
    }

    /// Public test network: same shape as mainnet, much cheaper work.
    pub fn testnet() -> Self {
        Self {
            name: "testnet".to_string(),
            easiness: 0x3FFF_FFFF,
            ticket_easiness: 0x0FFF_FFFF,
        }
    }

    /// Local development network. Practically every hash qualifies, which
    /// keeps unit tests and local tooling fast.
    pub fn devnet() -> Self {
        Self {
            name: "devnet".to_string(),
            easiness: u32::MAX,
            ticket_easiness: 0x7FFF_FFFF,
        }
    }

    /// Parses a config from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks internal consistency of the ceilings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticket_easiness > self.easiness {
            return Err(ConfigError::TicketCeilingTooLoose {
                ticket: self.ticket_easiness,
                network: self.easiness,
            });
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}
