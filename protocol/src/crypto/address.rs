//! Ledger addresses.
//!
//! An address is the 32-byte digest a [`super::signatures::SignatureScheme`]
//! derives from a public key. Text encodings (base58, checksums) belong to
//! wallet tooling, not to this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::hash::serde_bytes32;
use crate::config::ADDRESS_LENGTH;

/// A 32-byte address.
///
/// The all-zero address is reserved: it marks the fee placeholder output of
/// a reward-fee transaction and is rejected everywhere else.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(#[serde(with = "serde_bytes32")] [u8; ADDRESS_LENGTH]);

impl Address {
    /// The reserved placeholder address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}
