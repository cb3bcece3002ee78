//! The transaction itself: a [`Body`] plus its signature list.
//!
//! A transaction starts empty with its parents and a type-appropriate
//! easiness, grows through the append-only `add_*` methods, collects
//! signatures, and is finally sealed by proof of work. Once the nonce is
//! filled in, every structural mutation would invalidate both the
//! signatures and the hash, so the mutators refuse to run on a sealed
//! transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::codec::{self, CodecError};
use super::types::{HashType, Input, MultiSigIn, MultiSigOut, Output};
use crate::config::{NetworkConfig, ARRAY_MAX, MAX_SUPPLY, TX_TAG};
use crate::crypto::{Address, Hash, Signature, Signer};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while assembling a transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("transaction is already sealed by proof of work")]
    Sealed,

    #[error("{field} would exceed {max} entries")]
    TooMany { field: &'static str, max: usize },

    #[error("value {value} exceeds the maximum supply {max}")]
    ValueTooLarge { value: u64, max: u64 },

    #[error("multisig threshold {threshold} must be between 1 and {addresses}")]
    InvalidThreshold { threshold: u8, addresses: usize },

    #[error("input {previous_tx}:{index} is already spent by this transaction")]
    DuplicateInput { previous_tx: Hash, index: u8 },

    #[error("hash type {0:?} has no wire encoding")]
    UnencodableHashType(HashType),
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Everything in a transaction except its signatures.
///
/// Field order is the wire order; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Type tag, always [`TX_TAG`] for valid transactions.
    pub tag: [u8; 4],
    /// Cycle proof found by proof of work. Empty until mined.
    pub nonce: Vec<u32>,
    /// Outer proof-of-work nonce that seeds the cycle search.
    pub gnonce: u32,
    /// Creation time, Unix seconds.
    pub time: i64,
    pub message: Vec<u8>,
    pub inputs: Vec<Input>,
    pub multisig_ins: Vec<MultiSigIn>,
    pub outputs: Vec<Output>,
    pub multisig_outs: Vec<MultiSigOut>,
    /// DAG attachment points. Non-empty, no duplicates.
    pub parents: Vec<Hash>,
    /// Proof-of-work target for this transaction.
    pub easiness: u32,
    /// Unix seconds before which the transaction may not be accepted.
    pub lock_time: Option<i64>,
    pub hash_type: HashType,
    /// A mined ticket being redeemed by this transaction.
    pub ticket_input: Option<Hash>,
    /// Owner of the ticket this transaction issues (or, once a reward
    /// ticket is mined, the miner's destination).
    pub ticket_output: Option<Address>,
}

impl Body {
    fn empty(easiness: u32, parents: Vec<Hash>) -> Self {
        Self {
            tag: TX_TAG,
            nonce: Vec::new(),
            gnonce: 0,
            time: Utc::now().timestamp(),
            message: Vec::new(),
            inputs: Vec::new(),
            multisig_ins: Vec::new(),
            outputs: Vec::new(),
            multisig_outs: Vec::new(),
            parents,
            easiness,
            lock_time: None,
            hash_type: HashType::None,
            ticket_input: None,
            ticket_output: None,
        }
    }

    /// Sum of all output and multisig output values.
    ///
    /// Returns `None` on overflow, which no validated body can produce.
    pub fn total_output(&self) -> Option<u64> {
        self.outputs
            .iter()
            .map(|o| o.value)
            .chain(self.multisig_outs.iter().map(|m| m.value))
            .try_fold(0u64, |acc, v| acc.checked_add(v))
    }

    /// Canonical encoding of the body alone.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A tangle transaction.
///
/// Composition, not inheritance: the body is a field, and the common
/// read-only accessors are forwarded for convenience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: Body,
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Creates an empty transaction attached to `parents`, using the
    /// network's easiness ceiling.
    pub fn new(config: &NetworkConfig, parents: Vec<Hash>) -> Self {
        Self {
            body: Body::empty(config.easiness, parents),
            signatures: Vec::new(),
        }
    }

    /// Creates a ticket-issuing transaction: no inputs or outputs, the
    /// stricter ticket easiness, and `owner` as the ticket output.
    pub fn new_ticket(config: &NetworkConfig, parents: Vec<Hash>, owner: Address) -> Self {
        let mut body = Body::empty(config.ticket_easiness, parents);
        body.ticket_output = Some(owner);
        Self {
            body,
            signatures: Vec::new(),
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn parents(&self) -> &[Hash] {
        &self.body.parents
    }

    pub fn inputs(&self) -> &[Input] {
        &self.body.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.body.outputs
    }

    pub fn easiness(&self) -> u32 {
        self.body.easiness
    }

    /// `true` once proof of work has installed a cycle proof.
    pub fn is_sealed(&self) -> bool {
        !self.body.nonce.is_empty()
    }

    fn ensure_open(&self) -> Result<(), TxError> {
        if self.is_sealed() {
            return Err(TxError::Sealed);
        }
        Ok(())
    }

    fn ensure_room(len: usize, field: &'static str) -> Result<(), TxError> {
        if len >= ARRAY_MAX {
            return Err(TxError::TooMany {
                field,
                max: ARRAY_MAX,
            });
        }
        Ok(())
    }

    fn ensure_value(value: u64) -> Result<(), TxError> {
        if value > MAX_SUPPLY {
            return Err(TxError::ValueTooLarge {
                value,
                max: MAX_SUPPLY,
            });
        }
        Ok(())
    }

    /// Sets the free-form message. Truncation is the caller's job; an
    /// oversized message fails validation.
    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) -> Result<(), TxError> {
        self.ensure_open()?;
        self.body.message = message.into();
        Ok(())
    }

    pub fn set_hash_type(&mut self, hash_type: HashType) -> Result<(), TxError> {
        self.ensure_open()?;
        if !hash_type.is_encodable() {
            return Err(TxError::UnencodableHashType(hash_type));
        }
        self.body.hash_type = hash_type;
        Ok(())
    }

    pub fn set_lock_time(&mut self, lock_time: Option<i64>) -> Result<(), TxError> {
        self.ensure_open()?;
        self.body.lock_time = lock_time;
        Ok(())
    }

    pub fn set_ticket_input(&mut self, ticket: Option<Hash>) -> Result<(), TxError> {
        self.ensure_open()?;
        self.body.ticket_input = ticket;
        Ok(())
    }

    pub fn set_ticket_output(&mut self, owner: Option<Address>) -> Result<(), TxError> {
        self.ensure_open()?;
        self.body.ticket_output = owner;
        Ok(())
    }

    /// Spends output `index` of `previous_tx`.
    pub fn add_input(&mut self, previous_tx: Hash, index: u8) -> Result<(), TxError> {
        self.ensure_open()?;
        Self::ensure_room(self.body.inputs.len(), "inputs")?;
        if self
            .body
            .inputs
            .iter()
            .any(|i| i.previous_tx == previous_tx && i.index == index)
        {
            return Err(TxError::DuplicateInput { previous_tx, index });
        }
        self.body.inputs.push(Input { previous_tx, index });
        Ok(())
    }

    /// Spends multisig output `index` of `previous_tx`.
    pub fn add_multisig_in(&mut self, previous_tx: Hash, index: u8) -> Result<(), TxError> {
        self.ensure_open()?;
        Self::ensure_room(self.body.multisig_ins.len(), "multisig inputs")?;
        if self
            .body
            .multisig_ins
            .iter()
            .any(|i| i.previous_tx == previous_tx && i.index == index)
        {
            return Err(TxError::DuplicateInput { previous_tx, index });
        }
        self.body.multisig_ins.push(MultiSigIn { previous_tx, index });
        Ok(())
    }

    pub fn add_output(&mut self, address: Address, value: u64) -> Result<(), TxError> {
        self.ensure_open()?;
        Self::ensure_room(self.body.outputs.len(), "outputs")?;
        Self::ensure_value(value)?;
        self.body.outputs.push(Output { address, value });
        Ok(())
    }

    /// Adds an output spendable by exactly `threshold` of `addresses`.
    pub fn add_multisig_out(
        &mut self,
        threshold: u8,
        addresses: Vec<Address>,
        value: u64,
    ) -> Result<(), TxError> {
        self.ensure_open()?;
        Self::ensure_room(self.body.multisig_outs.len(), "multisig outputs")?;
        Self::ensure_value(value)?;
        if addresses.len() > ARRAY_MAX {
            return Err(TxError::TooMany {
                field: "multisig addresses",
                max: ARRAY_MAX,
            });
        }
        if threshold == 0 || threshold as usize > addresses.len() {
            return Err(TxError::InvalidThreshold {
                threshold,
                addresses: addresses.len(),
            });
        }
        self.body.multisig_outs.push(MultiSigOut {
            threshold,
            addresses,
            value,
        });
        Ok(())
    }

    /// Signs the current signing payload with `signer` and appends the
    /// signature.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), TxError> {
        let sig = self.signature(signer);
        self.add_signature(sig)
    }

    /// Computes a signature over the current signing payload without
    /// attaching it, for signers that collect signatures out of band.
    pub fn signature(&self, signer: &dyn Signer) -> Signature {
        signer.sign(&self.bytes_for_sign())
    }

    pub fn add_signature(&mut self, signature: Signature) -> Result<(), TxError> {
        self.ensure_open()?;
        Self::ensure_room(self.signatures.len(), "signatures")?;
        self.signatures.push(signature);
        Ok(())
    }

    /// Canonical encoding of the whole transaction.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        codec::decode(bytes)
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        codec::encoded_len(self)
    }

    /// Deep copy through an encode/decode round trip.
    ///
    /// # Panics
    ///
    /// Only if the canonical encoding of an in-memory transaction fails to
    /// decode, which would be a codec bug.
    pub fn deep_clone(&self) -> Self {
        Self::from_bytes(&self.to_bytes()).expect("canonical encoding always decodes")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
