//! Core type definitions for tangle transactions.
//!
//! These are the value types a [`super::body::Body`] is assembled from.
//! They are small and `Clone`-friendly; the fixed-size identifiers are
//! `Copy`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{
    HASH_TYPE_EXCLUDE_OUTPUTS, HASH_TYPE_EXCLUDE_TICKET_OUTPUT, MAX_EXCLUDED_OUTPUTS,
};
use crate::crypto::{Address, Hash};

// ---------------------------------------------------------------------------
// Inputs & Outputs
// ---------------------------------------------------------------------------

/// References one numbered output of a prior transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    pub previous_tx: Hash,
    pub index: u8,
}

/// Pays `value` minor units to `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: Address,
    pub value: u64,
}

/// An M-of-N output: spendable by signatures matching exactly `threshold`
/// of `addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSigOut {
    pub threshold: u8,
    pub addresses: Vec<Address>,
    pub value: u64,
}

/// References one numbered multisig output of a prior transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultiSigIn {
    pub previous_tx: Hash,
    pub index: u8,
}

// ---------------------------------------------------------------------------
// HashType
// ---------------------------------------------------------------------------

/// Raised when a wire byte is not a valid hash type.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid hash type byte 0x{0:02x}")]
pub struct InvalidHashType(pub u8);

/// Which fields are left out of the signed payload.
///
/// On the wire this is a single bitmask byte: `0x00`, `0x10 | n` or `0x20`.
/// Everywhere else it is this enum, so no code outside the conversion
/// below twiddles bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HashType {
    /// Sign everything.
    #[default]
    None,
    /// Zero the address and value of the last `n` outputs (`n <= 15`)
    /// before signing.
    ExcludeTrailingOutputs(u8),
    /// Clear the ticket output before signing.
    ExcludeTicketOutput,
}

impl HashType {
    /// Number of trailing outputs excluded from signing.
    pub fn excluded_outputs(&self) -> usize {
        match self {
            HashType::ExcludeTrailingOutputs(n) => *n as usize,
            _ => 0,
        }
    }

    pub fn excludes_ticket_output(&self) -> bool {
        matches!(self, HashType::ExcludeTicketOutput)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HashType::None)
    }

    /// Whether the value survives the one-byte wire form unchanged.
    pub fn is_encodable(&self) -> bool {
        match self {
            HashType::ExcludeTrailingOutputs(n) => *n <= MAX_EXCLUDED_OUTPUTS,
            _ => true,
        }
    }
}

impl From<HashType> for u8 {
    fn from(ht: HashType) -> u8 {
        match ht {
            HashType::None => 0,
            HashType::ExcludeTrailingOutputs(n) => HASH_TYPE_EXCLUDE_OUTPUTS | (n & MAX_EXCLUDED_OUTPUTS),
            HashType::ExcludeTicketOutput => HASH_TYPE_EXCLUDE_TICKET_OUTPUT,
        }
    }
}

impl TryFrom<u8> for HashType {
    type Error = InvalidHashType;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte & 0xf0 {
            0 if byte == 0 => Ok(HashType::None),
            HASH_TYPE_EXCLUDE_OUTPUTS => Ok(HashType::ExcludeTrailingOutputs(byte & 0x0f)),
            HASH_TYPE_EXCLUDE_TICKET_OUTPUT if byte == HASH_TYPE_EXCLUDE_TICKET_OUTPUT => {
                Ok(HashType::ExcludeTicketOutput)
            }
            _ => Err(InvalidHashType(byte)),
        }
    }
}

// ---------------------------------------------------------------------------
// TxKind
// ---------------------------------------------------------------------------

/// The shape a transaction is validated against.
///
/// `Normal` transactions are expected to be mined already. The reward kinds
/// are checked as the sender hands them to a miner, with empty nonce fields.
/// `NotMined` is a `Normal` transaction the sender is still signing; it is
/// never broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Normal,
    RewardTicket,
    RewardFee,
    NotMined,
}

impl TxKind {
    /// `true` if a transaction of this kind must carry a valid proof of work.
    pub fn expects_pow(&self) -> bool {
        matches!(self, TxKind::Normal)
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::RewardTicket => write!(f, "RewardTicket"),
            Self::RewardFee => write!(f, "RewardFee"),
            Self::NotMined => write!(f, "NotMined"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
