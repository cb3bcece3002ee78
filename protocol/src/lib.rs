// Copyright (c) 2026 Tangle Core Developers. MIT License.

//! # Tangle Protocol — Transaction Core
//!
//! The single-transaction contract of a DAG ledger. There is no chain here:
//! every transaction names one or more earlier transactions as parents and
//! carries its own small proof of work.
//!
//! ## Architecture
//!
//! - **config** — Wire limits, currency constants and per-network PoW ceilings.
//! - **logging** — `tracing` subscriber setup for binaries and tests.
//! - **crypto** — Hashes, addresses, and the signer/verifier seams.
//! - **transaction** — Data model, canonical encoding, signing payloads,
//!   validation and coin-selecting construction.
//! - **pow** — Cycle-finder seam and the nonce search that seals a transaction.
//! - **ledger** — Read access to stored transactions for referential checks.
//!
//! ## Flow
//!
//! ```text
//! builder ──► signing payload ──► Signer ──► pow ──► Validator::check_all
//! ```
//!
//! Consensus, gossip, storage engines, RPC and fee economics live elsewhere.
//! This crate only answers "is this one transaction well-formed, correctly
//! signed, sufficiently worked, and value-conserving?"

pub mod config;
pub mod crypto;
pub mod ledger;
pub mod logging;
pub mod pow;
pub mod transaction;

pub use config::NetworkConfig;
pub use crypto::{Address, Hash};
pub use transaction::{Transaction, TxKind, Validator};
