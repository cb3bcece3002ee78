//! Transaction assembly from a wallet's unspent outputs.
//!
//! [`build`] turns "pay these outputs" into a signed, unmined transaction:
//!
//! 1. parents are the wallet's current DAG tips;
//! 2. coins are selected (see [`select_coins`]);
//! 3. change, if any, goes to a fresh wallet address and is placed
//!    *before* the requested outputs, because trailing-output exclusion
//!    always strips from the tail;
//! 4. an optional hook adjusts the body before anything is signed;
//! 5. every distinct owner of a consumed output signs once.
//!
//! [`build_with_params`] layers the reward variants on top: a reward-fee
//! transaction carries a zero-address fee placeholder as its last output,
//! and a reward-ticket transaction redeems a ticket and is signed a second
//! time by the ticket's owner.
//!
//! Mining is left to the caller, who picks single or parallel search.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::body::{Transaction, TxError};
use super::types::{HashType, TxKind};
use crate::config::{NetworkConfig, MESSAGE_MAX};
use crate::crypto::{Address, Hash, Signer};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by a wallet backend.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet holds no ticket")]
    NoTicket,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("insufficient balance: need {needed}, short by {shortfall}")]
    InsufficientBalance { needed: u64, shortfall: u64 },

    #[error("requested outputs overflow u64")]
    OutputOverflow,

    #[error("message is {len} bytes, limit is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("wallet returned no DAG tips to attach to")]
    NoLeaves,

    #[error("reward-fee transaction needs a non-zero fee")]
    ZeroFee,

    #[error("cannot build a {0} transaction")]
    UnsupportedKind(TxKind),

    #[error("wallet: {0}")]
    Wallet(#[from] WalletError),

    #[error("transaction: {0}")]
    Tx(#[from] TxError),
}

// ---------------------------------------------------------------------------
// Wallet seam
// ---------------------------------------------------------------------------

/// A spendable output together with the key that can spend it.
#[derive(Clone)]
pub struct Utxo {
    pub owner: Arc<dyn Signer>,
    pub hash: Hash,
    pub index: u8,
    pub value: u64,
}

impl fmt::Debug for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utxo")
            .field("owner", &self.owner.address())
            .field("hash", &self.hash)
            .field("index", &self.index)
            .field("value", &self.value)
            .finish()
    }
}

/// A requested payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOutput {
    pub address: Address,
    pub value: u64,
}

impl RawOutput {
    pub fn new(address: Address, value: u64) -> Self {
        Self { address, value }
    }
}

pub trait Wallet {
    /// Spendable outputs. The wallet may return any set; `min_value` is a
    /// hint of how much the caller needs.
    fn get_utxo(&self, min_value: u64) -> Result<Vec<Utxo>, WalletError>;

    fn new_change_address(&self) -> Result<Address, WalletError>;

    /// Current DAG tips.
    fn get_leaves(&self) -> Result<Vec<Hash>, WalletError>;
}

/// A wallet that also holds mined tickets.
pub trait TicketWallet: Wallet {
    /// A mined ticket transaction and the key that owns it.
    fn get_ticketout(&self) -> Result<(Hash, Arc<dyn Signer>), WalletError>;
}

// ---------------------------------------------------------------------------
// Coin selection
// ---------------------------------------------------------------------------

/// Outcome of [`select_coins`].
#[derive(Debug, Clone)]
pub struct Selection {
    /// Consumed outputs, largest first.
    pub inputs: Vec<Utxo>,
    /// Overshoot to be returned to the sender.
    pub change: u64,
}

/// Picks outputs covering `target`.
///
/// Candidates are sorted ascending. The walk starts at the smallest
/// candidate that covers `target` alone (or the largest one, if none does)
/// and moves toward smaller values until the target is reached.
pub fn select_coins(mut utxos: Vec<Utxo>, target: u64) -> Result<Selection, BuildError> {
    utxos.sort_by_key(|u| u.value);
    let first_covering = utxos.partition_point(|u| u.value < target);
    utxos.truncate((first_covering + 1).min(utxos.len()));

    let mut remaining = target as i128;
    let mut inputs = Vec::new();
    while remaining > 0 {
        let Some(utxo) = utxos.pop() else { break };
        debug!(hash = %utxo.hash, index = utxo.index, value = utxo.value, "selected utxo");
        remaining -= utxo.value as i128;
        inputs.push(utxo);
    }

    if remaining > 0 {
        return Err(BuildError::InsufficientBalance {
            needed: target,
            shortfall: remaining as u64,
        });
    }
    Ok(Selection {
        inputs,
        change: (-remaining) as u64,
    })
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Builds and signs a transaction paying `outputs`, with `tag` as its
/// message.
pub fn build<W: Wallet + ?Sized>(
    config: &NetworkConfig,
    wallet: &W,
    tag: &[u8],
    outputs: &[RawOutput],
) -> Result<Transaction, BuildError> {
    build_with_hook(config, wallet, tag, outputs, |_| Ok(()))
}

/// Like [`build`], running `before_sign` on the assembled transaction just
/// before it is signed.
pub fn build_with_hook<W, F>(
    config: &NetworkConfig,
    wallet: &W,
    tag: &[u8],
    outputs: &[RawOutput],
    before_sign: F,
) -> Result<Transaction, BuildError>
where
    W: Wallet + ?Sized,
    F: FnOnce(&mut Transaction) -> Result<(), BuildError>,
{
    if tag.len() > MESSAGE_MAX {
        return Err(BuildError::MessageTooLong {
            len: tag.len(),
            max: MESSAGE_MAX,
        });
    }
    let leaves = wallet.get_leaves()?;
    if leaves.is_empty() {
        return Err(BuildError::NoLeaves);
    }

    let mut tx = Transaction::new(config, leaves);
    tx.set_message(tag.to_vec())?;

    let out_total = outputs
        .iter()
        .try_fold(0u64, |acc, o| acc.checked_add(o.value))
        .ok_or(BuildError::OutputOverflow)?;

    let selection = select_coins(wallet.get_utxo(out_total)?, out_total)?;
    for utxo in &selection.inputs {
        tx.add_input(utxo.hash, utxo.index)?;
    }
    if selection.change > 0 {
        let change_address = wallet.new_change_address()?;
        tx.add_output(change_address, selection.change)?;
    }
    // Requested outputs go last: a fee placeholder must stay at the tail.
    for out in outputs {
        tx.add_output(out.address, out.value)?;
    }

    before_sign(&mut tx)?;

    let mut signed = HashSet::new();
    for utxo in &selection.inputs {
        if signed.insert(utxo.owner.address()) {
            tx.sign(utxo.owner.as_ref())?;
        }
    }

    info!(
        inputs = selection.inputs.len(),
        outputs = tx.outputs().len(),
        change = selection.change,
        "transaction built"
    );
    Ok(tx)
}

/// Parameters for [`build_with_params`].
#[derive(Debug, Clone)]
pub struct BuildParams {
    pub comment: String,
    pub dest: Vec<RawOutput>,
    pub pow_kind: TxKind,
    /// Fee offered to the miner. Only used with [`TxKind::RewardFee`].
    pub fee: u64,
}

impl BuildParams {
    pub fn new(dest: Vec<RawOutput>, pow_kind: TxKind) -> Self {
        Self {
            comment: String::new(),
            dest,
            pow_kind,
            fee: 0,
        }
    }
}

/// Builds a normal, reward-fee or reward-ticket transaction.
pub fn build_with_params<W: TicketWallet + ?Sized>(
    config: &NetworkConfig,
    wallet: &W,
    params: &BuildParams,
) -> Result<Transaction, BuildError> {
    let mut dest = params.dest.clone();
    match params.pow_kind {
        TxKind::Normal | TxKind::RewardTicket => {}
        TxKind::RewardFee => {
            if params.fee == 0 {
                return Err(BuildError::ZeroFee);
            }
            dest.push(RawOutput::new(Address::ZERO, params.fee));
        }
        TxKind::NotMined => return Err(BuildError::UnsupportedKind(params.pow_kind)),
    }

    let mut ticket_owner: Option<Arc<dyn Signer>> = None;
    let mut tx = build_with_hook(config, wallet, params.comment.as_bytes(), &dest, |tx| {
        match params.pow_kind {
            TxKind::RewardFee => tx.set_hash_type(HashType::ExcludeTrailingOutputs(1))?,
            TxKind::RewardTicket => {
                tx.set_hash_type(HashType::ExcludeTicketOutput)?;
                let (ticket, owner) = wallet.get_ticketout()?;
                tx.set_ticket_input(Some(ticket))?;
                ticket_owner = Some(owner);
            }
            _ => {}
        }
        Ok(())
    })?;

    if let Some(owner) = ticket_owner {
        let sig = tx.signature(owner.as_ref());
        if !tx.signatures().iter().any(|s| s.public_key == sig.public_key) {
            tx.add_signature(sig)?;
        }
    }
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
