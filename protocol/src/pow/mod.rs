//! # Proof of Work
//!
//! ```text
//! cycle.rs  — CycleSolver seam and the deterministic DigestCycle finder
//! search.rs — gnonce search, single-threaded and one-worker-per-core
//! ```

pub mod cycle;
pub mod search;

pub use cycle::{CycleError, CycleSolver, DigestCycle};
pub use search::{pow, pow_parallel, pow_with_cancel, pow_with_workers, CancelToken, PowError};
