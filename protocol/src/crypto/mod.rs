//! # Cryptographic Primitives
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **SHA-256** for transaction identities and address derivation.
//! - **Ed25519** as the stock signature scheme behind the [`Signer`] and
//!   [`SignatureScheme`] seams.
//!
//! Nothing in here is specific to one transaction layout; the transaction
//! module decides *what* gets hashed and signed.

pub mod address;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use address::Address;
pub use hash::{sha256, Hash};
pub use keys::Keypair;
pub use signatures::{
    derive_address, verify, Ed25519Scheme, Signature, SignatureError, SignatureScheme, Signer,
};
