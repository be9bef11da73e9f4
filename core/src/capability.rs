//! The capability surfaces of §6: dependency-injected contracts the core
//! never constructs. The crate's only coupling to the outside world goes
//! through these traits: `async_trait`, `Send + Sync`, one
//! `Result<T, CapabilityError>` per method.

use crate::crypto::{Digest, PublicKey, SignatureValue};
use crate::error::CapabilityError;
use crate::record::{CodeEntropyCheck, ShannonEntropyCheck, TrxRecord};
use async_trait::async_trait;

/// Produces and verifies signatures over digests, and resolves this
/// node's per-session key.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Derives this node's key for the given `sessionCode`. The derivation
    /// is host-defined (see DESIGN.md Open Question 3); the core treats the
    /// result as opaque.
    async fn get_our_key(&self, session_code: &str) -> Result<PublicKey, CapabilityError>;

    async fn sign(&self, digest: &Digest) -> Result<SignatureValue, CapabilityError>;

    async fn verify(
        &self,
        key: &PublicKey,
        digest: &Digest,
        value: &SignatureValue,
    ) -> Result<bool, CapabilityError>;
}

/// Durable state: prior records, peer-last-known records, and the
/// invalid-record log. `push_peer_record` is the transport hook.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_transaction(
        &self,
        transaction_code: &str,
    ) -> Result<Option<TrxRecord>, CapabilityError>;

    /// Persists `record` as this node's own current state for its
    /// transaction, superseding whatever `get_transaction` previously
    /// returned for the same code.
    async fn set_transaction(&self, record: &TrxRecord) -> Result<(), CapabilityError>;

    /// Idempotently records `record` as the last-known record observed
    /// from `peer_key`.
    async fn set_peer_record(
        &self,
        peer_key: &PublicKey,
        record: &TrxRecord,
    ) -> Result<(), CapabilityError>;

    async fn get_peer_record(
        &self,
        peer_key: &PublicKey,
        transaction_code: &str,
    ) -> Result<Option<TrxRecord>, CapabilityError>;

    /// Pushes `record` to `peer_key` over whatever transport the host
    /// provides. The mechanism is opaque to the core.
    async fn push_peer_record(
        &self,
        peer_key: &PublicKey,
        record: &TrxRecord,
    ) -> Result<(), CapabilityError>;

    async fn log_invalid(
        &self,
        record: &TrxRecord,
        error: &str,
    ) -> Result<(), CapabilityError>;
}

/// Whether this node approves a promise or commit. Supplied by the host;
/// the core never inspects the policy behind it.
#[async_trait]
pub trait Decider: Send + Sync {
    async fn should_promise(&self, record: &TrxRecord) -> Result<bool, CapabilityError>;

    async fn should_commit(&self, record: &TrxRecord) -> Result<bool, CapabilityError>;
}

/// Randomness-check parameters for `transactionCode`/`sessionCode` (§6).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CodeOptions {
    pub entropy_check: ShannonEntropyCheck,
}

/// Timing policy (§6/§9): `minPromiseTime`, and the resolved direction of
/// the commit-approval deadline comparison (see DESIGN.md Open Question 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingOptions {
    pub min_promise_time: i64,
    /// If `true` (the default), commit approval requires
    /// `now >= commitsDue`. If `false`, it requires `now <= commitsDue`.
    pub commit_requires_deadline_passed: bool,
}

impl Default for TimingOptions {
    fn default() -> Self {
        TimingOptions {
            min_promise_time: 0,
            commit_requires_deadline_passed: true,
        }
    }
}

/// The injected configuration of §6.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Config {
    pub code_options: CodeOptions,
    pub timing_options: TimingOptions,
}

impl Config {
    pub fn entropy_check(&self) -> &dyn CodeEntropyCheck {
        &self.code_options.entropy_check
    }
}
