//! Compact references to transaction inputs and outputs.
//!
//! Ledgers index spent and unspent slots by a fixed 34-byte key:
//! `hash (32) || kind (1) || index (1)`. [`InoutRef`] is the typed form of
//! that key.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::body::Body;
use crate::config::HASH_LENGTH;
use crate::crypto::Hash;

/// Length of an encoded [`InoutRef`] key.
pub const INOUT_KEY_LENGTH: usize = HASH_LENGTH + 2;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InoutError {
    #[error("inout key must be 34 bytes, got {0}")]
    InvalidLength(usize),

    #[error("unknown inout kind byte {0}")]
    UnknownKind(u8),
}

/// Which slot of a transaction a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum InoutKind {
    Input = 0,
    MultisigInput = 1,
    TicketInput = 2,
    Output = 3,
    MultisigOutput = 4,
    TicketOutput = 5,
}

impl InoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InoutKind::Input => "input",
            InoutKind::MultisigInput => "multisig_input",
            InoutKind::TicketInput => "ticket_input",
            InoutKind::Output => "output",
            InoutKind::MultisigOutput => "multisig_output",
            InoutKind::TicketOutput => "ticket_output",
        }
    }
}

impl TryFrom<u8> for InoutKind {
    type Error = InoutError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => InoutKind::Input,
            1 => InoutKind::MultisigInput,
            2 => InoutKind::TicketInput,
            3 => InoutKind::Output,
            4 => InoutKind::MultisigOutput,
            5 => InoutKind::TicketOutput,
            other => return Err(InoutError::UnknownKind(other)),
        })
    }
}

impl fmt::Display for InoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot of a transaction: `kind` number `index` of transaction `hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InoutRef {
    pub hash: Hash,
    pub kind: InoutKind,
    pub index: u8,
}

impl InoutRef {
    pub fn new(hash: Hash, kind: InoutKind, index: u8) -> Self {
        Self { hash, kind, index }
    }

    pub fn to_key(&self) -> [u8; INOUT_KEY_LENGTH] {
        let mut key = [0u8; INOUT_KEY_LENGTH];
        key[..HASH_LENGTH].copy_from_slice(self.hash.as_bytes());
        key[HASH_LENGTH] = self.kind as u8;
        key[HASH_LENGTH + 1] = self.index;
        key
    }

    pub fn from_key(key: &[u8]) -> Result<Self, InoutError> {
        if key.len() != INOUT_KEY_LENGTH {
            return Err(InoutError::InvalidLength(key.len()));
        }
        let mut hash = [0u8; HASH_LENGTH];
        hash.copy_from_slice(&key[..HASH_LENGTH]);
        Ok(Self {
            hash: Hash::new(hash),
            kind: InoutKind::try_from(key[HASH_LENGTH])?,
            index: key[HASH_LENGTH + 1],
        })
    }
}

impl fmt::Display for InoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hash, self.kind, self.index)
    }
}

/// Every earlier slot `body` consumes: the ticket input first, then inputs,
/// then multisig inputs.
pub fn input_refs(body: &Body) -> Vec<InoutRef> {
    let mut refs = Vec::with_capacity(1 + body.inputs.len() + body.multisig_ins.len());
    if let Some(ticket) = body.ticket_input {
        refs.push(InoutRef::new(ticket, InoutKind::TicketInput, 0));
    }
    refs.extend(
        body.inputs
            .iter()
            .map(|i| InoutRef::new(i.previous_tx, InoutKind::Input, i.index)),
    );
    refs.extend(
        body.multisig_ins
            .iter()
            .map(|i| InoutRef::new(i.previous_tx, InoutKind::MultisigInput, i.index)),
    );
    refs
}

/// Every slot `body` creates, keyed by the transaction's own `hash`.
pub fn output_refs(hash: Hash, body: &Body) -> Vec<InoutRef> {
    let mut refs: Vec<InoutRef> = (0..body.outputs.len())
        .map(|n| InoutRef::new(hash, InoutKind::Output, n as u8))
        .chain(
            (0..body.multisig_outs.len())
                .map(|n| InoutRef::new(hash, InoutKind::MultisigOutput, n as u8)),
        )
        .collect();
    if body.ticket_output.is_some() {
        refs.push(InoutRef::new(hash, InoutKind::TicketOutput, 0));
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::crypto::Address;
    use crate::transaction::Transaction;

    #[test]
    fn key_layout() {
        let r = InoutRef::new(Hash::new([0xaa; 32]), InoutKind::MultisigOutput, 7);
        let key = r.to_key();
        assert_eq!(&key[..32], &[0xaa; 32]);
        assert_eq!(key[32], 4);
        assert_eq!(key[33], 7);
        assert_eq!(InoutRef::from_key(&key).unwrap(), r);
    }

    #[test]
    fn from_key_rejects_garbage() {
        assert_eq!(
            InoutRef::from_key(&[0u8; 33]),
            Err(InoutError::InvalidLength(33))
        );
        let mut key = [0u8; INOUT_KEY_LENGTH];
        key[32] = 9;
        assert_eq!(InoutRef::from_key(&key), Err(InoutError::UnknownKind(9)));
    }

    #[test]
    fn input_refs_lists_ticket_first() {
        let mut tx = Transaction::new(&NetworkConfig::devnet(), vec![Hash::ZERO]);
        tx.add_input(Hash::digest(b"a"), 2).unwrap();
        tx.add_multisig_in(Hash::digest(b"b"), 1).unwrap();
        tx.set_ticket_input(Some(Hash::digest(b"t"))).unwrap();

        let refs = input_refs(&tx.body);
        assert_eq!(
            refs,
            vec![
                InoutRef::new(Hash::digest(b"t"), InoutKind::TicketInput, 0),
                InoutRef::new(Hash::digest(b"a"), InoutKind::Input, 2),
                InoutRef::new(Hash::digest(b"b"), InoutKind::MultisigInput, 1),
            ]
        );
    }

    #[test]
    fn output_refs_cover_every_slot() {
        let mut tx = Transaction::new(&NetworkConfig::devnet(), vec![Hash::ZERO]);
        tx.add_output(Address::new([1; 32]), 1).unwrap();
        tx.add_output(Address::new([2; 32]), 2).unwrap();
        tx.add_multisig_out(1, vec![Address::new([3; 32])], 3).unwrap();
        let h = tx.hash();
        let refs = output_refs(h, &tx.body);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[2], InoutRef::new(h, InoutKind::MultisigOutput, 0));
    }

    #[test]
    fn display_names_kind() {
        let r = InoutRef::new(Hash::ZERO, InoutKind::TicketOutput, 0);
        assert!(r.to_string().contains(":ticket_output:0"));
    }
}
