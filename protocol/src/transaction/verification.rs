//! Transaction validation.
//!
//! [`Validator::check`] runs five local stages in order and stops at the
//! first failure:
//!
//! 1. **Structural**: tag, sizes, array bounds, duplicates, reserved
//!    addresses, value and easiness ceilings.
//! 2. **Temporal**: neither the timestamp nor the lock time is in the
//!    future.
//! 3. **Type-semantic**: the body has the shape its [`TxKind`] demands
//!    (ticket issuance, reward fee, reward ticket, proof present or absent).
//! 4. **Signature**: every signature verifies over
//!    [`Transaction::bytes_for_sign`] and no public key repeats.
//! 5. **Hash-target**: for mined kinds, the cycle proof verifies and the
//!    hash meets `easiness`.
//!
//! [`Validator::check_all`] then resolves everything the transaction points
//! at through a [`LedgerLookup`], matches signatures to spent outputs and
//! tickets, and enforces strict conservation of value.
//!
//! Checks are ordered from cheapest to most expensive so that garbage is
//! dropped before any signature or hash work is done.

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use super::body::Transaction;
use super::types::{HashType, TxKind};
use crate::config::{NetworkConfig, ARRAY_MAX, MAX_SUPPLY, MESSAGE_MAX, TRANSACTION_MAX, TX_TAG};
use crate::crypto::{Address, Hash, SignatureError, SignatureScheme};
use crate::ledger::LedgerLookup;
use crate::pow::{CycleError, CycleSolver};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Broad category of a validation failure. Callers decide what to do with
/// a rejected transaction from this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Structural,
    Temporal,
    TypeSemantic,
    Signature,
    HashTarget,
    Referential,
    Conservation,
}

/// Reasons a transaction is rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
    // -- structural --------------------------------------------------------
    #[error("invalid type tag {0:02x?}")]
    InvalidTag([u8; 4]),

    #[error("encoded size {size} exceeds {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("message is {len} bytes, limit is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("{field} has {len} entries, limit is {max}")]
    TooMany {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} {previous_tx}:{index} appears twice")]
    DuplicateInput {
        field: &'static str,
        previous_tx: Hash,
        index: u8,
    },

    #[error("{field} {index} uses the reserved zero address")]
    ZeroAddress { field: &'static str, index: usize },

    #[error("{field} {index} carries {value}, more than the supply {max}")]
    ValueTooLarge {
        field: &'static str,
        index: usize,
        value: u64,
        max: u64,
    },

    #[error("multisig output {index} lists address {address} twice")]
    DuplicateMultisigAddress { index: usize, address: Address },

    #[error("multisig output {index} has threshold {threshold} for {addresses} addresses")]
    InvalidThreshold {
        index: usize,
        threshold: u8,
        addresses: usize,
    },

    #[error("transaction has no parents")]
    NoParents,

    #[error("parent {0} appears twice")]
    DuplicateParent(Hash),

    #[error("easiness {easiness:#010x} is above the network ceiling {ceiling:#010x}")]
    EasinessAboveCeiling { easiness: u32, ceiling: u32 },

    #[error("hash type {0:?} has no wire encoding")]
    UnencodableHashType(HashType),

    #[error("hash type excludes {excluded} outputs but only {outputs} exist")]
    ExcludedOutputsOutOfRange { excluded: usize, outputs: usize },

    // -- temporal ----------------------------------------------------------
    #[error("timestamp {time} is in the future (now {now})")]
    FutureTimestamp { time: i64, now: i64 },

    #[error("locked until {lock_time} (now {now})")]
    Locked { lock_time: i64, now: i64 },

    // -- type-semantic -----------------------------------------------------
    #[error("{kind} transaction needs hash type {expected:?}, has {actual:?}")]
    WrongHashType {
        kind: TxKind,
        expected: HashType,
        actual: HashType,
    },

    #[error("ticket-issuing transaction must not carry {0}")]
    TicketNotEmpty(&'static str),

    #[error("ticket easiness {easiness:#010x} is above the ticket ceiling {ceiling:#010x}")]
    TicketEasinessAboveCeiling { easiness: u32, ceiling: u32 },

    #[error("ticket input set without a ticket output")]
    TicketInputWithoutOutput,

    #[error("reward-fee transaction must end with a zero-address fee output")]
    MissingFeePlaceholder,

    #[error("{0} transaction must not carry ticket fields")]
    UnexpectedTicket(TxKind),

    #[error("reward-ticket transaction needs a ticket input")]
    MissingTicketInput,

    #[error("reward-ticket transaction must leave the ticket output to the miner")]
    TicketOutputPresent,

    #[error("{kind} transaction must carry a {expected}-edge proof, has {actual}")]
    ProofSize {
        kind: TxKind,
        expected: usize,
        actual: usize,
    },

    #[error("{0} transaction must not be mined yet")]
    AlreadyMined(TxKind),

    #[error("transaction is not a reward-fee or reward-ticket transaction")]
    NotMinable,

    // -- signature ---------------------------------------------------------
    #[error("signature {index}: {source}")]
    InvalidSignature {
        index: usize,
        #[source]
        source: SignatureError,
    },

    #[error("signature {index} repeats the public key of signature {first}")]
    DuplicatePublicKey { index: usize, first: usize },

    #[error("no signature for input {previous_tx}:{index}")]
    UnsignedInput { previous_tx: Hash, index: u8 },

    #[error("multisig input {previous_tx}:{index} matched {matched} signers, needs exactly {threshold}")]
    MultisigThreshold {
        previous_tx: Hash,
        index: u8,
        matched: usize,
        threshold: u8,
    },

    #[error("no signature from the owner of ticket {0}")]
    UnsignedTicket(Hash),

    #[error("signature {index} is not used by any input")]
    UnusedSignature { index: usize },

    // -- hash-target -------------------------------------------------------
    #[error("cycle proof rejected: {0}")]
    InvalidProof(#[from] CycleError),

    #[error("hash word {word:#010x} does not meet easiness {easiness:#010x}")]
    HashAboveTarget { word: u32, easiness: u32 },

    // -- referential -------------------------------------------------------
    #[error("transaction {0} is not in the ledger")]
    MissingTx(Hash),

    #[error("{field} {index} does not exist in {previous_tx}")]
    NoSuchOutput {
        field: &'static str,
        previous_tx: Hash,
        index: u8,
    },

    #[error("transaction {0} did not issue a ticket")]
    NotATicket(Hash),

    // -- conservation ------------------------------------------------------
    #[error("value total overflows")]
    ValueOverflow,

    #[error("inputs total {inputs} but outputs total {outputs}")]
    Unbalanced { inputs: u64, outputs: u64 },
}

impl ValidationError {
    pub fn class(&self) -> ErrorClass {
        use ValidationError::*;
        match self {
            InvalidTag(_)
            | TooLarge { .. }
            | MessageTooLong { .. }
            | TooMany { .. }
            | DuplicateInput { .. }
            | ZeroAddress { .. }
            | ValueTooLarge { .. }
            | DuplicateMultisigAddress { .. }
            | InvalidThreshold { .. }
            | NoParents
            | DuplicateParent(_)
            | EasinessAboveCeiling { .. }
            | UnencodableHashType(_)
            | ExcludedOutputsOutOfRange { .. }
            | NoSuchOutput { .. }
            | NotATicket(_) => ErrorClass::Structural,

            FutureTimestamp { .. } | Locked { .. } => ErrorClass::Temporal,

            WrongHashType { .. }
            | TicketNotEmpty(_)
            | TicketEasinessAboveCeiling { .. }
            | TicketInputWithoutOutput
            | MissingFeePlaceholder
            | UnexpectedTicket(_)
            | MissingTicketInput
            | TicketOutputPresent
            | ProofSize { .. }
            | AlreadyMined(_)
            | NotMinable => ErrorClass::TypeSemantic,

            InvalidSignature { .. }
            | DuplicatePublicKey { .. }
            | UnsignedInput { .. }
            | MultisigThreshold { .. }
            | UnsignedTicket(_)
            | UnusedSignature { .. } => ErrorClass::Signature,

            InvalidProof(_) | HashAboveTarget { .. } => ErrorClass::HashTarget,

            MissingTx(_) => ErrorClass::Referential,

            ValueOverflow | Unbalanced { .. } => ErrorClass::Conservation,
        }
    }

    /// `true` if the same transaction may pass later: once the clock moves
    /// on, or once the missing transaction has been fetched.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Temporal | ErrorClass::Referential
        )
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validates transactions against one network's parameters.
///
/// Holds only shared references, so one validator can be used from many
/// threads at once.
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    config: &'a NetworkConfig,
    scheme: &'a dyn SignatureScheme,
    cycle: &'a dyn CycleSolver,
}

impl<'a> Validator<'a> {
    pub fn new(
        config: &'a NetworkConfig,
        scheme: &'a dyn SignatureScheme,
        cycle: &'a dyn CycleSolver,
    ) -> Self {
        Self {
            config,
            scheme,
            cycle,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        self.config
    }

    /// Runs the five local stages.
    pub fn check(&self, tx: &Transaction, kind: TxKind) -> Result<(), ValidationError> {
        let result = self
            .check_structure(tx, kind)
            .and_then(|_| self.check_time(tx))
            .and_then(|_| self.check_kind(tx, kind))
            .and_then(|_| self.check_signatures(tx))
            .and_then(|_| self.check_target(tx, kind));
        if let Err(e) = &result {
            debug!(kind = %kind, class = ?e.class(), error = %e, "transaction rejected");
        }
        result
    }

    /// Runs [`Self::check`], then resolves parents, inputs, multisig inputs
    /// and the ticket input through `ledger` and enforces conservation.
    pub fn check_all(
        &self,
        tx: &Transaction,
        kind: TxKind,
        ledger: &dyn LedgerLookup,
    ) -> Result<(), ValidationError> {
        self.check(tx, kind)?;
        let result = self.check_references(tx, ledger);
        if let Err(e) = &result {
            debug!(kind = %kind, class = ?e.class(), error = %e, "transaction rejected");
        }
        result
    }

    /// For an unmined transaction handed to a miner: which reward kind it
    /// is, after checking it as that kind.
    pub fn minable_kind(&self, tx: &Transaction) -> Result<TxKind, ValidationError> {
        let kind = match tx.body.hash_type {
            HashType::ExcludeTrailingOutputs(1) => TxKind::RewardFee,
            HashType::ExcludeTicketOutput => TxKind::RewardTicket,
            _ => return Err(ValidationError::NotMinable),
        };
        self.check(tx, kind)?;
        Ok(kind)
    }

    /// Hashes referenced by `tx` that `ledger` cannot resolve, in reference
    /// order without repeats. Gossip callers fetch these and retry.
    pub fn missing_hashes(&self, tx: &Transaction, ledger: &dyn LedgerLookup) -> Vec<Hash> {
        let body = &tx.body;
        let referenced = body
            .parents
            .iter()
            .chain(body.inputs.iter().map(|i| &i.previous_tx))
            .chain(body.multisig_ins.iter().map(|i| &i.previous_tx))
            .chain(body.ticket_input.iter());

        let mut seen = HashSet::new();
        referenced
            .filter(|h| seen.insert(**h))
            .filter(|h| !ledger.contains(h))
            .copied()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Stage 1: structural
    // -----------------------------------------------------------------------

    fn check_structure(&self, tx: &Transaction, kind: TxKind) -> Result<(), ValidationError> {
        let body = &tx.body;

        if body.tag != TX_TAG {
            return Err(ValidationError::InvalidTag(body.tag));
        }
        let size = tx.size();
        if size > TRANSACTION_MAX {
            return Err(ValidationError::TooLarge {
                size,
                max: TRANSACTION_MAX,
            });
        }
        if body.message.len() > MESSAGE_MAX {
            return Err(ValidationError::MessageTooLong {
                len: body.message.len(),
                max: MESSAGE_MAX,
            });
        }

        bounded("inputs", body.inputs.len())?;
        bounded("multisig inputs", body.multisig_ins.len())?;
        bounded("outputs", body.outputs.len())?;
        bounded("multisig outputs", body.multisig_outs.len())?;
        bounded("parents", body.parents.len())?;
        bounded("signatures", tx.signatures.len())?;

        let mut spent = HashSet::new();
        for i in &body.inputs {
            if !spent.insert(*i) {
                return Err(ValidationError::DuplicateInput {
                    field: "input",
                    previous_tx: i.previous_tx,
                    index: i.index,
                });
            }
        }
        let mut spent = HashSet::new();
        for i in &body.multisig_ins {
            if !spent.insert(*i) {
                return Err(ValidationError::DuplicateInput {
                    field: "multisig input",
                    previous_tx: i.previous_tx,
                    index: i.index,
                });
            }
        }

        let last = body.outputs.len().saturating_sub(1);
        for (n, out) in body.outputs.iter().enumerate() {
            let fee_placeholder = kind == TxKind::RewardFee && n == last;
            if out.address.is_zero() && !fee_placeholder {
                return Err(ValidationError::ZeroAddress {
                    field: "output",
                    index: n,
                });
            }
            supply_bounded("output", n, out.value)?;
        }

        for (n, ms) in body.multisig_outs.iter().enumerate() {
            bounded("multisig addresses", ms.addresses.len())?;
            if ms.threshold == 0 || ms.threshold as usize > ms.addresses.len() {
                return Err(ValidationError::InvalidThreshold {
                    index: n,
                    threshold: ms.threshold,
                    addresses: ms.addresses.len(),
                });
            }
            let mut seen = HashSet::new();
            for addr in &ms.addresses {
                if addr.is_zero() {
                    return Err(ValidationError::ZeroAddress {
                        field: "multisig output",
                        index: n,
                    });
                }
                if !seen.insert(*addr) {
                    return Err(ValidationError::DuplicateMultisigAddress {
                        index: n,
                        address: *addr,
                    });
                }
            }
            supply_bounded("multisig output", n, ms.value)?;
        }

        if body.parents.is_empty() {
            return Err(ValidationError::NoParents);
        }
        let mut seen = HashSet::new();
        for p in &body.parents {
            if !seen.insert(*p) {
                return Err(ValidationError::DuplicateParent(*p));
            }
        }

        if body.easiness > self.config.easiness {
            return Err(ValidationError::EasinessAboveCeiling {
                easiness: body.easiness,
                ceiling: self.config.easiness,
            });
        }

        if !body.hash_type.is_encodable() {
            return Err(ValidationError::UnencodableHashType(body.hash_type));
        }
        let excluded = body.hash_type.excluded_outputs();
        if excluded > body.outputs.len() {
            return Err(ValidationError::ExcludedOutputsOutOfRange {
                excluded,
                outputs: body.outputs.len(),
            });
        }

        if body.ticket_output.is_some_and(|a| a.is_zero()) {
            return Err(ValidationError::ZeroAddress {
                field: "ticket output",
                index: 0,
            });
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stage 2: temporal
    // -----------------------------------------------------------------------

    fn check_time(&self, tx: &Transaction) -> Result<(), ValidationError> {
        let now = Utc::now().timestamp();
        if tx.body.time > now {
            return Err(ValidationError::FutureTimestamp {
                time: tx.body.time,
                now,
            });
        }
        if let Some(lock_time) = tx.body.lock_time {
            if lock_time > now {
                return Err(ValidationError::Locked { lock_time, now });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stage 3: type-semantic
    // -----------------------------------------------------------------------

    fn check_kind(&self, tx: &Transaction, kind: TxKind) -> Result<(), ValidationError> {
        let body = &tx.body;

        match kind {
            TxKind::Normal | TxKind::NotMined => match (body.ticket_input, body.ticket_output) {
                (Some(_), None) => return Err(ValidationError::TicketInputWithoutOutput),
                (None, Some(_)) => self.check_ticket_issuance(tx)?,
                _ => {}
            },
            TxKind::RewardFee => {
                expect_hash_type(kind, body.hash_type, HashType::ExcludeTrailingOutputs(1))?;
                if !body.outputs.last().is_some_and(|o| o.address.is_zero()) {
                    return Err(ValidationError::MissingFeePlaceholder);
                }
                if body.ticket_input.is_some() || body.ticket_output.is_some() {
                    return Err(ValidationError::UnexpectedTicket(kind));
                }
            }
            TxKind::RewardTicket => {
                expect_hash_type(kind, body.hash_type, HashType::ExcludeTicketOutput)?;
                if body.ticket_output.is_some() {
                    return Err(ValidationError::TicketOutputPresent);
                }
                if body.ticket_input.is_none() {
                    return Err(ValidationError::MissingTicketInput);
                }
            }
        }

        if kind.expects_pow() {
            if body.nonce.len() != self.cycle.proof_size() {
                return Err(ValidationError::ProofSize {
                    kind,
                    expected: self.cycle.proof_size(),
                    actual: body.nonce.len(),
                });
            }
        } else if !body.nonce.is_empty() {
            return Err(ValidationError::AlreadyMined(kind));
        }

        Ok(())
    }

    fn check_ticket_issuance(&self, tx: &Transaction) -> Result<(), ValidationError> {
        let body = &tx.body;
        let populated = [
            (!body.inputs.is_empty(), "inputs"),
            (!body.multisig_ins.is_empty(), "multisig inputs"),
            (!body.outputs.is_empty(), "outputs"),
            (!body.multisig_outs.is_empty(), "multisig outputs"),
            (body.lock_time.is_some(), "a lock time"),
            (!body.hash_type.is_none(), "a hash type"),
            (!tx.signatures.is_empty(), "signatures"),
        ];
        if let Some((_, field)) = populated.iter().find(|(set, _)| *set) {
            return Err(ValidationError::TicketNotEmpty(*field));
        }
        if body.easiness > self.config.ticket_easiness {
            return Err(ValidationError::TicketEasinessAboveCeiling {
                easiness: body.easiness,
                ceiling: self.config.ticket_easiness,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stage 4: signatures
    // -----------------------------------------------------------------------

    fn check_signatures(&self, tx: &Transaction) -> Result<(), ValidationError> {
        let payload = tx.bytes_for_sign();
        for (index, sig) in tx.signatures.iter().enumerate() {
            self.scheme
                .verify(sig, &payload)
                .map_err(|source| ValidationError::InvalidSignature { index, source })?;
            if let Some(first) = tx.signatures[..index]
                .iter()
                .position(|s| s.public_key == sig.public_key)
            {
                return Err(ValidationError::DuplicatePublicKey { index, first });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stage 5: hash target
    // -----------------------------------------------------------------------

    fn check_target(&self, tx: &Transaction, kind: TxKind) -> Result<(), ValidationError> {
        if !kind.expects_pow() {
            return Ok(());
        }
        self.cycle.verify(&tx.pre_hash(), &tx.body.nonce)?;
        let hash = tx.hash();
        if !hash.meets(tx.body.easiness) {
            return Err(ValidationError::HashAboveTarget {
                word: hash.difficulty_word(),
                easiness: tx.body.easiness,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Referential + conservation
    // -----------------------------------------------------------------------

    fn check_references(
        &self,
        tx: &Transaction,
        ledger: &dyn LedgerLookup,
    ) -> Result<(), ValidationError> {
        let body = &tx.body;
        let fetch = |h: &Hash| ledger.get_tx(h).map_err(|_| ValidationError::MissingTx(*h));

        for parent in &body.parents {
            if !ledger.contains(parent) {
                return Err(ValidationError::MissingTx(*parent));
            }
        }

        let mut signers = SignerSet::derive(self.scheme, tx)?;
        let mut total_in: u64 = 0;

        for input in &body.inputs {
            let prev = fetch(&input.previous_tx)?;
            let out = prev.outputs.get(input.index as usize).ok_or(
                ValidationError::NoSuchOutput {
                    field: "output",
                    previous_tx: input.previous_tx,
                    index: input.index,
                },
            )?;
            total_in = total_in
                .checked_add(out.value)
                .ok_or(ValidationError::ValueOverflow)?;
            if !signers.mark(&out.address) {
                return Err(ValidationError::UnsignedInput {
                    previous_tx: input.previous_tx,
                    index: input.index,
                });
            }
        }

        for input in &body.multisig_ins {
            let prev = fetch(&input.previous_tx)?;
            let ms = prev.multisig_outs.get(input.index as usize).ok_or(
                ValidationError::NoSuchOutput {
                    field: "multisig output",
                    previous_tx: input.previous_tx,
                    index: input.index,
                },
            )?;
            total_in = total_in
                .checked_add(ms.value)
                .ok_or(ValidationError::ValueOverflow)?;
            let matched = ms.addresses.iter().filter(|a| signers.mark(a)).count();
            if matched != ms.threshold as usize {
                return Err(ValidationError::MultisigThreshold {
                    previous_tx: input.previous_tx,
                    index: input.index,
                    matched,
                    threshold: ms.threshold,
                });
            }
        }

        if let Some(ticket) = &body.ticket_input {
            let issuer = fetch(ticket)?;
            let owner = issuer
                .ticket_output
                .ok_or(ValidationError::NotATicket(*ticket))?;
            if !signers.mark(&owner) {
                return Err(ValidationError::UnsignedTicket(*ticket));
            }
        }

        if let Some(index) = signers.first_unused() {
            return Err(ValidationError::UnusedSignature { index });
        }

        let total_out = body.total_output().ok_or(ValidationError::ValueOverflow)?;
        if total_in != total_out {
            return Err(ValidationError::Unbalanced {
                inputs: total_in,
                outputs: total_out,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bounded(field: &'static str, len: usize) -> Result<(), ValidationError> {
    if len > ARRAY_MAX {
        return Err(ValidationError::TooMany {
            field,
            len,
            max: ARRAY_MAX,
        });
    }
    Ok(())
}

fn supply_bounded(field: &'static str, index: usize, value: u64) -> Result<(), ValidationError> {
    if value > MAX_SUPPLY {
        return Err(ValidationError::ValueTooLarge {
            field,
            index,
            value,
            max: MAX_SUPPLY,
        });
    }
    Ok(())
}

fn expect_hash_type(
    kind: TxKind,
    actual: HashType,
    expected: HashType,
) -> Result<(), ValidationError> {
    if actual != expected {
        return Err(ValidationError::WrongHashType {
            kind,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Addresses derived from the signature list, each with a "used" flag.
struct SignerSet {
    entries: Vec<(Address, bool)>,
}

impl SignerSet {
    fn derive(scheme: &dyn SignatureScheme, tx: &Transaction) -> Result<Self, ValidationError> {
        let entries: Vec<(Address, bool)> = tx
            .signatures
            .iter()
            .enumerate()
            .map(|(index, sig)| {
                scheme
                    .derive_address(&sig.public_key)
                    .map(|a| (a, false))
                    .map_err(|source| ValidationError::InvalidSignature { index, source })
            })
            .collect::<Result<_, ValidationError>>()?;
        Ok(Self { entries })
    }

    /// Marks the signer for `address` as used; `false` if nobody signed for it.
    fn mark(&mut self, address: &Address) -> bool {
        match self.entries.iter_mut().find(|(a, _)| a == address) {
            Some(entry) => {
                entry.1 = true;
                true
            }
            None => false,
        }
    }

    fn first_unused(&self) -> Option<usize> {
        self.entries.iter().position(|(_, used)| !used)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519Scheme, Keypair, Signer};
    use crate::ledger::MemoryLedger;
    use crate::pow::{pow, DigestCycle};
    use crate::transaction::types::Output;

    static CYCLE: DigestCycle = DigestCycle::new(8, 0);

    fn cfg() -> NetworkConfig {
        NetworkConfig::devnet()
    }

    fn validator(cfg: &NetworkConfig) -> Validator<'_> {
        Validator::new(cfg, &Ed25519Scheme, &CYCLE)
    }

    fn expect_err(result: Result<(), ValidationError>, class: ErrorClass) -> ValidationError {
        match result {
            Err(e) if e.class() == class => e,
            other => panic!("expected {:?} error, got {:?}", class, other),
        }
    }

    /// Ledger with a genesis transaction paying `value` to each owner.
    fn funded(owners: &[&Keypair], value: u64) -> (MemoryLedger, Hash) {
        let ledger = MemoryLedger::new();
        let mut genesis = Transaction::new(&cfg(), vec![Hash::ZERO]);
        for kp in owners {
            genesis.add_output(kp.address(), value).unwrap();
        }
        let hash = ledger.insert(&genesis);
        (ledger, hash)
    }

    fn spend(genesis: Hash, from: &[(&Keypair, u8)], to: &[(Address, u64)]) -> Transaction {
        let mut tx = Transaction::new(&cfg(), vec![genesis]);
        for (_, idx) in from {
            tx.add_input(genesis, *idx).unwrap();
        }
        for (addr, value) in to {
            tx.add_output(*addr, *value).unwrap();
        }
        for (kp, _) in from {
            tx.sign(*kp).unwrap();
        }
        tx
    }

    fn mined(mut tx: Transaction) -> Transaction {
        pow(&mut tx, &CYCLE).unwrap();
        tx
    }

    // -- structural ---------------------------------------------------------

    #[test]
    fn accepts_minimal_mined_transaction() {
        let cfg = cfg();
        let tx = mined(Transaction::new(&cfg, vec![Hash::digest(b"p")]));
        assert!(validator(&cfg).check(&tx, TxKind::Normal).is_ok());
    }

    #[test]
    fn rejects_wrong_tag() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.body.tag = [0, 0, 0, 0];
        expect_err(validator(&cfg).check(&tx, TxKind::NotMined), ErrorClass::Structural);
    }

    #[test]
    fn rejects_long_message() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.set_message(vec![b'x'; MESSAGE_MAX + 1]).unwrap();
        match validator(&cfg).check(&tx, TxKind::NotMined) {
            Err(ValidationError::MessageTooLong { len: 256, max: 255 }) => {}
            other => panic!("expected MessageTooLong, got {:?}", other),
        }
    }

    #[test]
    fn rejects_duplicate_input() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.body.inputs.push(crate::transaction::types::Input {
            previous_tx: Hash::digest(b"x"),
            index: 1,
        });
        tx.body.inputs.push(tx.body.inputs[0]);
        match validator(&cfg).check(&tx, TxKind::NotMined) {
            Err(ValidationError::DuplicateInput { index: 1, .. }) => {}
            other => panic!("expected DuplicateInput, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_and_duplicate_parents() {
        let cfg = cfg();
        let tx = Transaction::new(&cfg, vec![]);
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::NoParents)
        ));
        let tx = Transaction::new(&cfg, vec![Hash::ZERO, Hash::ZERO]);
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::DuplicateParent(_))
        ));
    }

    #[test]
    fn rejects_duplicate_multisig_address() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        let a = Address::new([7; 32]);
        tx.add_multisig_out(1, vec![a, a], 10).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::DuplicateMultisigAddress { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_zero_address_output_outside_fee_slot() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.add_output(Address::ZERO, 1).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::ZeroAddress { field: "output", index: 0 })
        ));
    }

    #[test]
    fn rejects_value_above_supply() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.body.outputs.push(Output {
            address: Address::new([1; 32]),
            value: MAX_SUPPLY + 1,
        });
        expect_err(validator(&cfg).check(&tx, TxKind::NotMined), ErrorClass::Structural);
    }

    #[test]
    fn rejects_easiness_above_ceiling() {
        let strict = NetworkConfig::testnet();
        let tx = Transaction::new(&NetworkConfig::devnet(), vec![Hash::ZERO]);
        assert!(matches!(
            validator(&strict).check(&tx, TxKind::NotMined),
            Err(ValidationError::EasinessAboveCeiling { .. })
        ));
    }

    #[test]
    fn rejects_exclusion_beyond_outputs() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.add_output(Address::new([1; 32]), 1).unwrap();
        tx.set_hash_type(HashType::ExcludeTrailingOutputs(2)).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::ExcludedOutputsOutOfRange { excluded: 2, outputs: 1 })
        ));
    }

    #[test]
    fn rejects_exclusion_count_without_wire_form() {
        let cfg = cfg();
        let signer = Keypair::generate();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        for n in 0..16u8 {
            tx.add_output(Address::new([n + 1; 32]), 1).unwrap();
        }
        // Bypasses the setter; a decoded copy would carry the count mod 16.
        tx.body.hash_type = HashType::ExcludeTrailingOutputs(16);
        tx.sign(&signer).unwrap();

        let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded.body.hash_type, HashType::ExcludeTrailingOutputs(0));

        match validator(&cfg).check(&tx, TxKind::NotMined) {
            Err(ValidationError::UnencodableHashType(HashType::ExcludeTrailingOutputs(16))) => {}
            other => panic!("expected UnencodableHashType, got {:?}", other),
        }
    }

    // -- temporal -----------------------------------------------------------

    #[test]
    fn future_timestamp_is_retryable() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.body.time += 3600;
        let err = expect_err(validator(&cfg).check(&tx, TxKind::NotMined), ErrorClass::Temporal);
        assert!(err.is_retryable());
    }

    #[test]
    fn future_lock_time_rejected_past_accepted() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.set_lock_time(Some(Utc::now().timestamp() + 3600)).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::Locked { .. })
        ));
        tx.set_lock_time(Some(1)).unwrap();
        assert!(validator(&cfg).check(&tx, TxKind::NotMined).is_ok());
    }

    // -- type-semantic ------------------------------------------------------

    #[test]
    fn ticket_issuance_must_be_empty() {
        let cfg = cfg();
        let owner = Keypair::generate().address();
        let tx = Transaction::new_ticket(&cfg, vec![Hash::ZERO], owner);
        assert!(validator(&cfg).check(&tx, TxKind::NotMined).is_ok());

        let mut with_output = tx.clone();
        with_output.add_output(Address::new([1; 32]), 1).unwrap();
        assert!(matches!(
            validator(&cfg).check(&with_output, TxKind::NotMined),
            Err(ValidationError::TicketNotEmpty("outputs"))
        ));

        let mut with_lock = tx.clone();
        with_lock.set_lock_time(Some(1)).unwrap();
        assert!(matches!(
            validator(&cfg).check(&with_lock, TxKind::NotMined),
            Err(ValidationError::TicketNotEmpty("a lock time"))
        ));

        let mut with_sig = tx;
        with_sig.sign(&Keypair::generate()).unwrap();
        assert!(matches!(
            validator(&cfg).check(&with_sig, TxKind::NotMined),
            Err(ValidationError::TicketNotEmpty("signatures"))
        ));
    }

    #[test]
    fn ticket_issuance_needs_ticket_easiness() {
        let cfg = cfg();
        let mut tx = Transaction::new_ticket(&cfg, vec![Hash::ZERO], Address::new([3; 32]));
        tx.body.easiness = cfg.ticket_easiness + 1;
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::TicketEasinessAboveCeiling { .. })
        ));
    }

    #[test]
    fn ticket_input_needs_ticket_output_for_normal() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.set_ticket_input(Some(Hash::digest(b"t"))).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::TicketInputWithoutOutput)
        ));
    }

    #[test]
    fn reward_fee_shape() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.add_output(Address::new([1; 32]), 5).unwrap();
        tx.add_output(Address::ZERO, 1).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::RewardFee),
            Err(ValidationError::WrongHashType { .. })
        ));

        tx.set_hash_type(HashType::ExcludeTrailingOutputs(1)).unwrap();
        assert!(validator(&cfg).check(&tx, TxKind::RewardFee).is_ok());

        tx.body.outputs[1].address = Address::new([2; 32]);
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::RewardFee),
            Err(ValidationError::MissingFeePlaceholder)
        ));
    }

    #[test]
    fn reward_ticket_shape() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.set_hash_type(HashType::ExcludeTicketOutput).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::RewardTicket),
            Err(ValidationError::MissingTicketInput)
        ));
        tx.set_ticket_input(Some(Hash::digest(b"t"))).unwrap();
        assert!(validator(&cfg).check(&tx, TxKind::RewardTicket).is_ok());
        tx.set_ticket_output(Some(Address::new([1; 32]))).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::RewardTicket),
            Err(ValidationError::TicketOutputPresent)
        ));
    }

    #[test]
    fn proof_presence_follows_kind() {
        let cfg = cfg();
        let tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::Normal),
            Err(ValidationError::ProofSize { actual: 0, .. })
        ));
        let sealed = mined(tx);
        assert!(matches!(
            validator(&cfg).check(&sealed, TxKind::NotMined),
            Err(ValidationError::AlreadyMined(TxKind::NotMined))
        ));
    }

    #[test]
    fn minable_kind_detects_reward_shapes() {
        let cfg = cfg();
        let v = validator(&cfg);

        let mut fee = Transaction::new(&cfg, vec![Hash::ZERO]);
        fee.add_output(Address::ZERO, 3).unwrap();
        fee.set_hash_type(HashType::ExcludeTrailingOutputs(1)).unwrap();
        assert_eq!(v.minable_kind(&fee).unwrap(), TxKind::RewardFee);

        let mut ticket = Transaction::new(&cfg, vec![Hash::ZERO]);
        ticket.set_hash_type(HashType::ExcludeTicketOutput).unwrap();
        ticket.set_ticket_input(Some(Hash::digest(b"t"))).unwrap();
        assert_eq!(v.minable_kind(&ticket).unwrap(), TxKind::RewardTicket);

        let plain = Transaction::new(&cfg, vec![Hash::ZERO]);
        assert!(matches!(v.minable_kind(&plain), Err(ValidationError::NotMinable)));

        let sealed = mined(fee);
        assert!(matches!(
            v.minable_kind(&sealed),
            Err(ValidationError::AlreadyMined(TxKind::RewardFee))
        ));
    }

    // -- signatures ---------------------------------------------------------

    #[test]
    fn rejects_tampered_body_after_signing() {
        let cfg = cfg();
        let kp = Keypair::generate();
        let mut tx = spend(Hash::ZERO, &[(&kp, 0)], &[(Address::new([1; 32]), 10)]);
        tx.body.outputs[0].value = 11;
        match validator(&cfg).check(&tx, TxKind::NotMined) {
            Err(ValidationError::InvalidSignature {
                index: 0,
                source: SignatureError::VerificationFailed,
            }) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn rejects_repeated_public_key() {
        let cfg = cfg();
        let kp = Keypair::generate();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.sign(&kp).unwrap();
        tx.sign(&kp).unwrap();
        assert!(matches!(
            validator(&cfg).check(&tx, TxKind::NotMined),
            Err(ValidationError::DuplicatePublicKey { index: 1, first: 0 })
        ));
    }

    #[test]
    fn signature_survives_excluded_fee_destination() {
        let cfg = cfg();
        let kp = Keypair::generate();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.add_output(Address::new([1; 32]), 5).unwrap();
        tx.add_output(Address::ZERO, 1).unwrap();
        tx.set_hash_type(HashType::ExcludeTrailingOutputs(1)).unwrap();
        tx.sign(&kp).unwrap();
        assert!(validator(&cfg).check(&tx, TxKind::RewardFee).is_ok());

        tx.body.outputs[1].address = Address::new([9; 32]);
        assert!(validator(&cfg).check(&tx, TxKind::NotMined).is_ok());
    }

    // -- hash target --------------------------------------------------------

    #[test]
    fn rejects_hash_above_target() {
        let cfg = cfg();
        let mut tx = Transaction::new(&cfg, vec![Hash::ZERO]);
        tx.body.easiness = u32::MAX / 2;
        // Install valid proofs until one yields a hash that misses the target.
        loop {
            tx.body.nonce = CYCLE.solve(&tx.pre_hash()).unwrap();
            if !tx.hash().meets(tx.body.easiness) {
                break;
            }
            tx.body.gnonce += 1;
        }
        match validator(&cfg).check(&tx, TxKind::Normal) {
            Err(ValidationError::HashAboveTarget { easiness, .. }) => {
                assert_eq!(easiness, u32::MAX / 2)
            }
            other => panic!("expected HashAboveTarget, got {:?}", other),
        }
    }

    #[test]
    fn rejects_forged_proof() {
        let cfg = cfg();
        let mut tx = mined(Transaction::new(&cfg, vec![Hash::ZERO]));
        tx.body.nonce[0] ^= 1;
        let err = expect_err(validator(&cfg).check(&tx, TxKind::Normal), ErrorClass::HashTarget);
        assert!(!err.is_retryable());
    }

    // -- referential + conservation -----------------------------------------

    #[test]
    fn check_all_accepts_balanced_spend() {
        let cfg = cfg();
        let alice = Keypair::generate();
        let (ledger, genesis) = funded(&[&alice], 100);
        let tx = mined(spend(
            genesis,
            &[(&alice, 0)],
            &[(Address::new([1; 32]), 60), (Address::new([2; 32]), 40)],
        ));
        assert!(validator(&cfg).check_all(&tx, TxKind::Normal, &ledger).is_ok());
    }

    #[test]
    fn check_all_missing_parent_is_retryable() {
        let cfg = cfg();
        let ledger = MemoryLedger::new();
        let tx = mined(Transaction::new(&cfg, vec![Hash::digest(b"unknown")]));
        let err = expect_err(
            validator(&cfg).check_all(&tx, TxKind::Normal, &ledger),
            ErrorClass::Referential,
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn check_all_rejects_imbalance() {
        let cfg = cfg();
        let alice = Keypair::generate();
        let (ledger, genesis) = funded(&[&alice], 100);
        let tx = mined(spend(genesis, &[(&alice, 0)], &[(Address::new([1; 32]), 99)]));
        match validator(&cfg).check_all(&tx, TxKind::Normal, &ledger) {
            Err(ValidationError::Unbalanced {
                inputs: 100,
                outputs: 99,
            }) => {}
            other => panic!("expected Unbalanced, got {:?}", other),
        }
    }

    #[test]
    fn check_all_rejects_wrong_signer() {
        let cfg = cfg();
        let alice = Keypair::generate();
        let mallory = Keypair::generate();
        let (ledger, genesis) = funded(&[&alice], 100);
        let tx = mined(spend(genesis, &[(&mallory, 0)], &[(Address::new([1; 32]), 100)]));
        assert!(matches!(
            validator(&cfg).check_all(&tx, TxKind::Normal, &ledger),
            Err(ValidationError::UnsignedInput { index: 0, .. })
        ));
    }

    #[test]
    fn check_all_rejects_unused_signature() {
        let cfg = cfg();
        let alice = Keypair::generate();
        let (ledger, genesis) = funded(&[&alice], 100);
        let mut tx = spend(genesis, &[(&alice, 0)], &[(Address::new([1; 32]), 100)]);
        tx.sign(&Keypair::generate()).unwrap();
        let tx = mined(tx);
        assert!(matches!(
            validator(&cfg).check_all(&tx, TxKind::Normal, &ledger),
            Err(ValidationError::UnusedSignature { index: 1 })
        ));
    }

    #[test]
    fn check_all_rejects_out_of_range_index() {
        let cfg = cfg();
        let alice = Keypair::generate();
        let (ledger, genesis) = funded(&[&alice], 100);
        let tx = mined(spend(genesis, &[(&alice, 4)], &[]));
        assert!(matches!(
            validator(&cfg).check_all(&tx, TxKind::Normal, &ledger),
            Err(ValidationError::NoSuchOutput { index: 4, .. })
        ));
    }

    #[test]
    fn missing_hashes_lists_unknown_references_once() {
        let cfg = cfg();
        let alice = Keypair::generate();
        let (ledger, genesis) = funded(&[&alice], 100);
        let unknown = Hash::digest(b"unknown");
        let mut tx = Transaction::new(&cfg, vec![genesis, unknown]);
        tx.add_input(unknown, 0).unwrap();
        tx.add_input(genesis, 0).unwrap();
        tx.add_multisig_in(Hash::digest(b"ms"), 0).unwrap();
        let missing = validator(&cfg).missing_hashes(&tx, &ledger);
        assert_eq!(missing, vec![unknown, Hash::digest(b"ms")]);
    }
}
