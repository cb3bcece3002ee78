//! Signing payloads and transaction hashes.
//!
//! Three different byte strings are derived from one transaction:
//!
//! - [`Transaction::bytes_for_sign`]: the body only, with both proof-of-work
//!   fields cleared and the fields named by the [`HashType`] blanked. This is
//!   what every signature covers.
//! - [`Transaction::bytes_for_pow`]: the whole transaction with the cycle
//!   proof cleared. Its digest, [`Transaction::pre_hash`], seeds the cycle
//!   search for the current `gnonce`.
//! - The full encoding. Its digest, [`Transaction::hash`], is the
//!   transaction's identity and is what has to meet `easiness`.
//!
//! The exclusion rules let a sender sign a reward transaction before the
//! miner fills in the reward destination: whatever the miner writes into the
//! excluded tail, the signed bytes stay the same.
//!
//! [`HashType`]: super::types::HashType

use super::body::{Body, Transaction};
use super::codec;
use super::types::HashType;
use crate::crypto::{Address, Hash};

/// Applies the signing exclusions to a copy of `body`.
///
/// Shared by [`Transaction::bytes_for_sign`] and anything that needs the
/// signed view of a body without a full transaction around it.
pub fn signing_view(body: &Body) -> Body {
    let mut view = body.clone();
    view.gnonce = 0;
    view.nonce.clear();

    match view.hash_type {
        HashType::None => {}
        HashType::ExcludeTrailingOutputs(n) => {
            let len = view.outputs.len();
            let start = len.saturating_sub(n as usize);
            for out in &mut view.outputs[start..] {
                out.address = Address::ZERO;
                out.value = 0;
            }
        }
        HashType::ExcludeTicketOutput => {
            view.ticket_output = None;
        }
    }
    view
}

impl Transaction {
    /// Bytes covered by every signature of this transaction.
    pub fn bytes_for_sign(&self) -> Vec<u8> {
        codec::encode_body(&signing_view(&self.body))
    }

    /// Bytes whose digest seeds the cycle search: the whole transaction,
    /// signatures included, with the cycle proof cleared. `gnonce` is kept.
    pub fn bytes_for_pow(&self) -> Vec<u8> {
        let mut copy = self.clone();
        copy.body.nonce.clear();
        codec::encode_tx(&copy)
    }

    /// Digest of [`Self::bytes_for_pow`].
    pub fn pre_hash(&self) -> Hash {
        Hash::digest(&self.bytes_for_pow())
    }

    /// The transaction's identity: SHA-256 of its full encoding.
    pub fn hash(&self) -> Hash {
        Hash::digest(&self.to_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
