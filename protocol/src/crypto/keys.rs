//! # Key Management
//!
//! Ed25519 keypairs that act as [`Signer`]s for transactions.
//!
//! Key bytes are never logged; `Debug` prints the address only.

use ed25519_dalek::{Signer as DalekSigner, SigningKey};
use rand::rngs::OsRng;
use std::fmt;

use super::address::Address;
use super::hash::sha256;
use super::signatures::{Signature, Signer};

/// An Ed25519 signing key bound to the address derived from its public key.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Raw public key bytes (32 bytes).
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl Signer for Keypair {
    fn sign(&self, payload: &[u8]) -> Signature {
        let sig = self.signing_key.sign(payload);
        Signature::new(self.public_key_bytes().to_vec(), sig.to_bytes().to_vec())
    }

    fn address(&self) -> Address {
        Address::new(sha256(&self.public_key_bytes()))
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(address={})", self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_seed_is_deterministic() {
        let a = Keypair::from_seed(&[7u8; 32]);
        let b = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key_bytes(), b.public_key_bytes());
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn distinct_keys_have_distinct_addresses() {
        assert_ne!(Keypair::generate().address(), Keypair::generate().address());
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = Keypair::from_seed(&[9u8; 32]);
        assert_eq!(kp.sign(b"m"), kp.sign(b"m"));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_seed(&[0x42; 32]);
        let dbg = format!("{:?}", kp);
        assert!(dbg.starts_with("Keypair(address="));
        assert!(!dbg.contains(&hex::encode([0x42u8; 32])));
    }

    #[test]
    fn clone_keeps_identity() {
        let kp = Keypair::generate();
        assert_eq!(kp.clone().address(), kp.address());
    }
}
