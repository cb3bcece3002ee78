//! # Transaction Module
//!
//! Everything about a single tangle transaction.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — Inputs, outputs, HashType, TxKind
//! body.rs         — Body + Transaction, constructors and append-only mutators
//! codec.rs        — Canonical bincode encoding (signatures and hashes depend on it)
//! signing.rs      — Signed payload, PoW seed and transaction hash
//! verification.rs — Five-stage Validator plus referential/conservation checks
//! inout.rs        — 34-byte references to input and output slots
//! builder.rs      — Coin selection and assembly from a Wallet
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — [`build`] or [`build_with_params`] select coins and sign.
//! 2. **Mine** — [`crate::pow::pow`] fills in `gnonce` and the cycle proof.
//! 3. **Verify** — [`Validator::check_all`] before broadcast and on receipt.
//!
//! Once mined, a transaction is sealed: the mutators refuse to touch it.

pub mod body;
pub mod builder;
pub mod codec;
pub mod inout;
pub mod signing;
pub mod types;
pub mod verification;

pub use body::{Body, Transaction, TxError};
pub use builder::{
    build, build_with_hook, build_with_params, select_coins, BuildError, BuildParams, RawOutput,
    Selection, TicketWallet, Utxo, Wallet, WalletError,
};
pub use codec::CodecError;
pub use inout::{input_refs, output_refs, InoutError, InoutKind, InoutRef};
pub use signing::signing_view;
pub use types::{HashType, Input, InvalidHashType, MultiSigIn, MultiSigOut, Output, TxKind};
pub use verification::{ErrorClass, ValidationError, Validator};
