//! Canonical binary encoding.
//!
//! Signatures and hashes are computed directly over these bytes, so the
//! format is fixed: bincode with fixed-width little-endian integers, fields
//! in declaration order, lengths as `u64` prefixes. Because a
//! [`Transaction`] is encoded as its body followed by its signature list,
//! the body-only encoding is always a byte prefix of the full encoding.
//!
//! Decoding is bounded by [`TRANSACTION_MAX`] and rejects trailing bytes, so
//! every accepted input re-encodes to exactly the bytes it came from.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::body::{Body, Transaction};
use crate::config::TRANSACTION_MAX;
use crate::crypto::Signature;

/// Errors raised while decoding untrusted bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encoded value exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("malformed encoding: {0}")]
    Malformed(String),
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::SizeLimit => CodecError::TooLarge {
                max: TRANSACTION_MAX,
            },
            other => CodecError::Malformed(other.to_string()),
        }
    }
}

fn encoder() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn decoder() -> impl Options {
    encoder()
        .reject_trailing_bytes()
        .with_limit(TRANSACTION_MAX as u64)
}

/// Encodes any value of the data model.
///
/// # Panics
///
/// Only if serde itself fails on an in-memory value. None of the data model
/// types can trigger that (no maps, no unsized sequences, no custom
/// serializers that error), so a panic here is a programming error.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    encoder()
        .serialize(value)
        .expect("data model values always serialize")
}

/// Decodes a value, rejecting oversized or trailing input.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.len() > TRANSACTION_MAX {
        return Err(CodecError::TooLarge {
            max: TRANSACTION_MAX,
        });
    }
    Ok(decoder().deserialize(bytes)?)
}

/// Length of [`encode`] without allocating the buffer.
pub fn encoded_len<T: Serialize + ?Sized>(value: &T) -> usize {
    encoder()
        .serialized_size(value)
        .map(|n| n as usize)
        .unwrap_or(usize::MAX)
}

pub fn encode_body(body: &Body) -> Vec<u8> {
    encode(body)
}

pub fn encode_signatures(signatures: &[Signature]) -> Vec<u8> {
    encode(signatures)
}

pub fn encode_tx(tx: &Transaction) -> Vec<u8> {
    encode(tx)
}

pub fn decode_body(bytes: &[u8]) -> Result<Body, CodecError> {
    decode(bytes)
}

pub fn decode_signatures(bytes: &[u8]) -> Result<Vec<Signature>, CodecError> {
    decode(bytes)
}

pub fn decode_tx(bytes: &[u8]) -> Result<Transaction, CodecError> {
    decode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
