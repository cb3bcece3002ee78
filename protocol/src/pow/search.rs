//! Proof-of-work search.
//!
//! Sealing a transaction takes two nested conditions:
//!
//! 1. the cycle finder must find a proof for the seed
//!    [`Transaction::pre_hash`], which depends on `gnonce`;
//! 2. with that proof installed as `nonce`, [`Transaction::hash`] must meet
//!    the transaction's `easiness`.
//!
//! Neither implies the other, so the search walks `gnonce` through the whole
//! 32-bit space (starting at a random point and wrapping around) until both
//! hold. Running out of space is [`PowError::Exhausted`]; a caller pulling
//! the [`CancelToken`] gets [`PowError::Cancelled`]. Cancellation is polled
//! once per `gnonce`, never inside the cycle finder.
//!
//! [`pow_parallel`] splits the space across one thread per core. Worker `j`
//! tries offsets `j, j + k, j + 2k, ...` on its own clone; the first winner
//! stores its nonces in a single mutex-guarded slot and raises a stop flag.
//! Only the winning nonces are copied back into the caller's transaction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cycle::CycleSolver;
use crate::transaction::Transaction;

/// Number of distinct `gnonce` values.
const GNONCE_SPACE: u64 = 1 << 32;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("gnonce space exhausted without meeting the target")]
    Exhausted,

    #[error("proof-of-work search cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between a search and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

enum Outcome {
    Found { attempts: u64 },
    Exhausted,
    Stopped,
}

/// Walks `offset, offset + stride, ...` below `space`, trying
/// `gnonce = start + offset` (wrapping) on `tx`.
///
/// On `Found`, `tx` holds the winning `gnonce` and `nonce`. Otherwise both
/// are restored to what they were on entry.
fn search(
    tx: &mut Transaction,
    solver: &dyn CycleSolver,
    start: u32,
    offset: u64,
    stride: u64,
    space: u64,
    stop: &dyn Fn() -> bool,
) -> Outcome {
    let easiness = tx.body.easiness;
    let entry_gnonce = tx.body.gnonce;
    let entry_nonce = std::mem::take(&mut tx.body.nonce);
    let restore = |tx: &mut Transaction, outcome: Outcome| {
        tx.body.gnonce = entry_gnonce;
        tx.body.nonce = entry_nonce;
        outcome
    };
    let mut attempts = 0u64;

    for step in (offset..space).step_by(stride as usize) {
        if stop() {
            return restore(tx, Outcome::Stopped);
        }
        attempts += 1;

        tx.body.gnonce = start.wrapping_add(step as u32);
        tx.body.nonce.clear();
        let Some(proof) = solver.solve(&tx.pre_hash()) else {
            continue;
        };
        tx.body.nonce = proof;
        if tx.hash().meets(easiness) {
            return Outcome::Found { attempts };
        }
    }

    restore(tx, Outcome::Exhausted)
}

/// Seals `tx` on the calling thread. Blocks until a solution is found or
/// the space is exhausted.
pub fn pow(tx: &mut Transaction, solver: &dyn CycleSolver) -> Result<(), PowError> {
    pow_with_cancel(tx, solver, &CancelToken::new())
}

/// Single-threaded search that can be cancelled from another thread.
pub fn pow_with_cancel(
    tx: &mut Transaction,
    solver: &dyn CycleSolver,
    cancel: &CancelToken,
) -> Result<(), PowError> {
    let start: u32 = rand::random();
    debug!(easiness = tx.body.easiness, start, "pow search started");

    let stop = || cancel.is_cancelled();
    match search(tx, solver, start, 0, 1, GNONCE_SPACE, &stop) {
        Outcome::Found { attempts } => {
            info!(gnonce = tx.body.gnonce, attempts, "transaction sealed");
            Ok(())
        }
        Outcome::Stopped => {
            info!("pow search cancelled");
            Err(PowError::Cancelled)
        }
        Outcome::Exhausted => {
            warn!(easiness = tx.body.easiness, "gnonce space exhausted");
            Err(PowError::Exhausted)
        }
    }
}

/// Seals `tx` using one worker thread per available core.
pub fn pow_parallel(
    tx: &mut Transaction,
    solver: &dyn CycleSolver,
    cancel: &CancelToken,
) -> Result<(), PowError> {
    pow_with_workers(tx, solver, num_cpus::get(), cancel)
}

/// Seals `tx` using `workers` threads (at least one).
pub fn pow_with_workers(
    tx: &mut Transaction,
    solver: &dyn CycleSolver,
    workers: usize,
    cancel: &CancelToken,
) -> Result<(), PowError> {
    parallel_search(tx, solver, workers, cancel, GNONCE_SPACE)
}

fn parallel_search(
    tx: &mut Transaction,
    solver: &dyn CycleSolver,
    workers: usize,
    cancel: &CancelToken,
    space: u64,
) -> Result<(), PowError> {
    let workers = workers.max(1);
    let start: u32 = rand::random();
    debug!(easiness = tx.body.easiness, workers, start, "parallel pow search started");

    let winner: Mutex<Option<(u32, Vec<u32>)>> = Mutex::new(None);
    let found = AtomicBool::new(false);
    let clones: Vec<Transaction> = (0..workers).map(|_| tx.clone()).collect();

    std::thread::scope(|s| {
        for (j, mut local) in clones.into_iter().enumerate() {
            let winner = &winner;
            let found = &found;
            s.spawn(move || {
                let stop = || found.load(Ordering::Relaxed) || cancel.is_cancelled();
                let outcome = search(
                    &mut local,
                    solver,
                    start,
                    j as u64,
                    workers as u64,
                    space,
                    &stop,
                );
                if let Outcome::Found { attempts } = outcome {
                    let mut slot = winner.lock();
                    if slot.is_none() {
                        debug!(worker = j, attempts, "worker found solution");
                        *slot = Some((local.body.gnonce, local.body.nonce));
                    }
                    found.store(true, Ordering::Relaxed);
                }
            });
        }
    });

    match winner.into_inner() {
        Some((gnonce, nonce)) => {
            tx.body.gnonce = gnonce;
            tx.body.nonce = nonce;
            info!(gnonce, workers, "transaction sealed");
            Ok(())
        }
        None if cancel.is_cancelled() => {
            info!("parallel pow search cancelled");
            Err(PowError::Cancelled)
        }
        None => {
            warn!(easiness = tx.body.easiness, "gnonce space exhausted");
            Err(PowError::Exhausted)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
