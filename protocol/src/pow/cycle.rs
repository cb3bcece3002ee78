//! The cycle-finding primitive behind proof of work.
//!
//! A real deployment plugs in a memory-hard graph cycle finder. The search
//! loop only relies on the contract in [`CycleSolver`]: given a 32-byte
//! seed, either produce a fixed-size proof or report that this seed has
//! none, and be able to check a proof later.

use thiserror::Error;

use crate::crypto::{sha256, Hash};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error("proof has {actual} edges, expected {expected}")]
    WrongSize { expected: usize, actual: usize },

    #[error("proof edges are not strictly ascending")]
    NotAscending,

    #[error("proof does not match seed")]
    Mismatch,
}

/// Contract of the external cycle finder.
pub trait CycleSolver: Send + Sync {
    /// Number of edges in every proof.
    fn proof_size(&self) -> usize;

    /// Searches for a proof over `seed`. `None` means this seed has no
    /// solution and the caller should move on to another seed.
    fn solve(&self, seed: &Hash) -> Option<Vec<u32>>;

    fn verify(&self, seed: &Hash, proof: &[u32]) -> Result<(), CycleError>;
}

/// Deterministic stand-in for a cycle finder.
///
/// The proof is a strictly ascending list of edges derived from SHA-256 of
/// the seed. A configurable share of seeds (`failures` out of 256) has no
/// solution, so the outer retry loop in the search gets exercised.
#[derive(Debug, Clone, Copy)]
pub struct DigestCycle {
    proof_size: usize,
    failures: u8,
}

impl DigestCycle {
    /// Proof length used by the graph cycle finder on mainnet.
    pub const DEFAULT_PROOF_SIZE: usize = 42;

    pub const fn new(proof_size: usize, failures: u8) -> Self {
        Self {
            proof_size,
            failures,
        }
    }

    fn has_solution(&self, seed: &Hash) -> bool {
        let mut input = seed.as_bytes().to_vec();
        input.extend_from_slice(b"cycle");
        sha256(&input)[0] >= self.failures
    }

    fn edges(&self, seed: &Hash) -> Vec<u32> {
        let mut edges = Vec::with_capacity(self.proof_size);
        let mut edge = 0u32;
        for i in 0..self.proof_size as u32 {
            let mut input = seed.as_bytes().to_vec();
            input.extend_from_slice(&i.to_le_bytes());
            let d = sha256(&input);
            let step = u32::from_le_bytes([d[0], d[1], 0, 0]) + 1;
            edge = edge.wrapping_add(step);
            edges.push(edge);
        }
        edges
    }
}

impl Default for DigestCycle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROOF_SIZE, 64)
    }
}

impl CycleSolver for DigestCycle {
    fn proof_size(&self) -> usize {
        self.proof_size
    }

    fn solve(&self, seed: &Hash) -> Option<Vec<u32>> {
        if !self.has_solution(seed) {
            return None;
        }
        Some(self.edges(seed))
    }

    fn verify(&self, seed: &Hash, proof: &[u32]) -> Result<(), CycleError> {
        if proof.len() != self.proof_size {
            return Err(CycleError::WrongSize {
                expected: self.proof_size,
                actual: proof.len(),
            });
        }
        if proof.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CycleError::NotAscending);
        }
        if !self.has_solution(seed) || proof != self.edges(seed).as_slice() {
            return Err(CycleError::Mismatch);
        }
        Ok(())
    }
}
