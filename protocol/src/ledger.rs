//! Ledger lookup.
//!
//! Referential validation needs to read the bodies of earlier transactions
//! (parents, spent outputs, redeemed tickets). Storage is not this crate's
//! business, so it only sees the [`LedgerLookup`] trait.
//!
//! [`MemoryLedger`] is a thread-safe in-memory implementation: a
//! `parking_lot::RwLock<HashMap>` keyed by transaction hash. Readers (the
//! validator) vastly outnumber writers, so a read-write lock is the right
//! shape. It backs the tests and is good enough for tooling that replays a
//! small tangle in memory.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::crypto::Hash;
use crate::transaction::{Body, Transaction};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transaction {0} not found")]
    NotFound(Hash),
}

/// Read access to stored transactions.
///
/// Calls may block (disk, network). No caching is implied.
pub trait LedgerLookup: Send + Sync {
    fn get_tx(&self, hash: &Hash) -> Result<Body, LedgerError>;

    fn contains(&self, hash: &Hash) -> bool {
        self.get_tx(hash).is_ok()
    }
}

/// In-memory ledger keyed by transaction hash.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    bodies: RwLock<HashMap<Hash, Body>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `tx` under its hash and returns that hash. Storing the same
    /// transaction twice is a no-op.
    pub fn insert(&self, tx: &Transaction) -> Hash {
        let hash = tx.hash();
        self.bodies.write().insert(hash, tx.body.clone());
        hash
    }

    /// Stores a body under an explicit hash. Used to seed genesis state.
    pub fn insert_body(&self, hash: Hash, body: Body) {
        self.bodies.write().insert(hash, body);
    }

    pub fn remove(&self, hash: &Hash) -> Option<Body> {
        self.bodies.write().remove(hash)
    }

    pub fn len(&self) -> usize {
        self.bodies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.read().is_empty()
    }
}

impl LedgerLookup for MemoryLedger {
    fn get_tx(&self, hash: &Hash) -> Result<Body, LedgerError> {
        self.bodies
            .read()
            .get(hash)
            .cloned()
            .ok_or(LedgerError::NotFound(*hash))
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.bodies.read().contains_key(hash)
    }
}
