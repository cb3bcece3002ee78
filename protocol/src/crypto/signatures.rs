//! # Digital Signatures
//!
//! The transaction core never implements a signature scheme itself. It talks
//! to two seams:
//!
//! - [`Signer`] — something holding key material that can sign a payload and
//!   tell which address it spends for.
//! - [`SignatureScheme`] — stateless verification plus the public-key to
//!   address derivation rule.
//!
//! [`Ed25519Scheme`] is the stock scheme: ed25519-dalek strict verification,
//! and `address = SHA-256(public_key)`. Hash-based one-time schemes plug in
//! through the same traits.

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::address::Address;
use super::hash::sha256;

/// Errors during signature operations.
///
/// Intentionally vague; we don't tell attackers why verification failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signature bytes: expected {expected}, got {actual}")]
    InvalidSignatureBytes { expected: usize, actual: usize },

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// One entry of a transaction's signature list.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Public key of the signer, in the scheme's native encoding.
    pub public_key: Vec<u8>,
    /// Signature bytes over the transaction's signing payload.
    pub sig: Vec<u8>,
}

impl Signature {
    pub fn new(public_key: Vec<u8>, sig: Vec<u8>) -> Self {
        Self { public_key, sig }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("public_key", &hex::encode(&self.public_key))
            .field("sig_len", &self.sig.len())
            .finish()
    }
}

/// Verification side of a signature scheme.
pub trait SignatureScheme: Send + Sync {
    /// Checks `signature` over `payload`.
    fn verify(&self, signature: &Signature, payload: &[u8]) -> Result<(), SignatureError>;

    /// Maps a public key to the address its owner spends from.
    fn derive_address(&self, public_key: &[u8]) -> Result<Address, SignatureError>;
}

/// Signing side: key material bound to one address.
pub trait Signer: Send + Sync {
    /// Signs `payload`, returning the signature together with the public key.
    fn sign(&self, payload: &[u8]) -> Signature;

    /// The address whose outputs this signer can spend.
    fn address(&self) -> Address;
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Ed25519 verification with SHA-256 address derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    fn verifying_key(public_key: &[u8]) -> Result<VerifyingKey, SignatureError> {
        let bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| SignatureError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::InvalidPublicKey)
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn verify(&self, signature: &Signature, payload: &[u8]) -> Result<(), SignatureError> {
        let key = Self::verifying_key(&signature.public_key)?;
        let bytes: [u8; 64] =
            signature
                .sig
                .as_slice()
                .try_into()
                .map_err(|_| SignatureError::InvalidSignatureBytes {
                    expected: 64,
                    actual: signature.sig.len(),
                })?;
        key.verify_strict(payload, &DalekSignature::from_bytes(&bytes))
            .map_err(|_| SignatureError::VerificationFailed)
    }

    fn derive_address(&self, public_key: &[u8]) -> Result<Address, SignatureError> {
        Self::verifying_key(public_key)?;
        Ok(Address::new(sha256(public_key)))
    }
}

/// Verifies with the stock [`Ed25519Scheme`].
pub fn verify(signature: &Signature, payload: &[u8]) -> Result<(), SignatureError> {
    Ed25519Scheme.verify(signature, payload)
}

/// Derives an address with the stock [`Ed25519Scheme`].
pub fn derive_address(public_key: &[u8]) -> Result<Address, SignatureError> {
    Ed25519Scheme.derive_address(public_key)
}
