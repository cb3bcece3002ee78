//! # Hashing Utilities
//!
//! Transaction identities are SHA-256 digests of the canonical encoding.
//! [`Hash`] is the fixed-size wrapper used everywhere a transaction is
//! referenced: parents, inputs, ticket inputs and ledger keys.
//!
//! ## Difficulty convention
//!
//! A hash meets an easiness target `e` iff its last four bytes, read as a
//! little-endian `u32`, are `<= e`. This is a probability threshold, not a
//! leading-zero count: with `e = u32::MAX` every hash qualifies, with
//! `e = 0` only one in 2^32 does.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::config::HASH_LENGTH;

/// Compute the SHA-256 hash of the input data as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Reads the difficulty word of a digest: its last four bytes, little-endian.
pub fn difficulty_word(digest: &[u8; HASH_LENGTH]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&digest[HASH_LENGTH - 4..]);
    u32::from_le_bytes(word)
}

/// Serde helper for 32-byte identifiers: raw bytes in binary formats,
/// lowercase hex in human-readable ones.
pub(crate) mod serde_bytes32 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            bytes.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            let raw = hex::decode(&text).map_err(D::Error::custom)?;
            <[u8; 32]>::try_from(raw.as_slice())
                .map_err(|_| D::Error::invalid_length(raw.len(), &"32 bytes"))
        } else {
            <[u8; 32]>::deserialize(deserializer)
        }
    }
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// A 32-byte transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(#[serde(with = "serde_bytes32")] [u8; HASH_LENGTH]);

impl Hash {
    /// The all-zero hash, used as the genesis parent.
    pub const ZERO: Hash = Hash([0u8; HASH_LENGTH]);

    pub const fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Hash(bytes)
    }

    /// SHA-256 of `data`.
    pub fn digest(data: &[u8]) -> Self {
        Hash(sha256(data))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 64-character hex string.
    pub fn from_hex(text: &str) -> Option<Self> {
        let raw = hex::decode(text).ok()?;
        <[u8; HASH_LENGTH]>::try_from(raw.as_slice()).ok().map(Hash)
    }

    /// The little-endian value of the last four bytes.
    pub fn difficulty_word(&self) -> u32 {
        difficulty_word(&self.0)
    }

    /// `true` if this hash satisfies the given easiness target.
    pub fn meets(&self, easiness: u32) -> bool {
        self.difficulty_word() <= easiness
    }
}

impl From<[u8; HASH_LENGTH]> for Hash {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn difficulty_word_reads_last_four_bytes_le() {
        let mut raw = [0u8; 32];
        raw[31] = 0x1f;
        let h = Hash::new(raw);
        assert_eq!(h.difficulty_word(), 0x1f00_0000);

        let mut raw = [0xffu8; 32];
        raw[28] = 0x1f;
        raw[29] = 0;
        raw[30] = 0;
        raw[31] = 0;
        assert_eq!(Hash::new(raw).difficulty_word(), 0x1f);
    }

    #[test]
    fn meets_is_inclusive_threshold() {
        let mut raw = [0u8; 32];
        raw[28] = 0x1f;
        let h = Hash::new(raw);
        assert!(h.meets(0x1f));
        assert!(!h.meets(0x1e));
        assert!(h.meets(0x20));
        assert!(Hash::new([0xff; 32]).meets(u32::MAX));
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash::digest(b"tangle");
        assert_eq!(Hash::from_hex(&h.to_hex()), Some(h));
        assert_eq!(Hash::from_hex("abcd"), None);
        assert_eq!(Hash::from_hex("zz"), None);
    }

    #[test]
    fn json_uses_hex_and_bincode_uses_raw_bytes() {
        let h = Hash::digest(b"tangle");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        assert_eq!(serde_json::from_str::<Hash>(&json).unwrap(), h);

        let bin = bincode::serialize(&h).unwrap();
        assert_eq!(bin.as_slice(), h.as_bytes());
        assert_eq!(bincode::deserialize::<Hash>(&bin).unwrap(), h);
    }

    #[test]
    fn json_rejects_wrong_length() {
        assert!(serde_json::from_str::<Hash>("\"abcd\"").is_err());
    }
}
