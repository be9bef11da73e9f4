//! [`TrxRecord`], the protocol message and unit of storage (§3), and the
//! Validator + Merger of §4.4.

use crate::crypto::{PublicKey, SignatureValue};
use crate::error::ProtocolError;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The sign of a signature entry. The wire encoding is the fixed mapping in
/// §6: `promise: 1, nopromise: -1, commit: 2, nocommit: -2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigType {
    Promise,
    NoPromise,
    Commit,
    NoCommit,
}

impl SigType {
    /// The fixed wire code from §6.
    pub fn wire_code(self) -> i8 {
        match self {
            SigType::Promise => 1,
            SigType::NoPromise => -1,
            SigType::Commit => 2,
            SigType::NoCommit => -2,
        }
    }

    /// Is this a promise-phase sign (as opposed to a commit-phase one)?
    pub fn is_promise_phase(self) -> bool {
        matches!(self, SigType::Promise | SigType::NoPromise)
    }
}

impl std::fmt::Display for SigType {
    /// The `sigType.toString()` form §4.1/§4.6 feed into `additionalData`
    /// when signing — the fixed wire code as a decimal string.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_code())
    }
}

/// One entry of `promises` or `commits`: `(type, key, value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub sig_type: SigType,
    pub key: PublicKey,
    pub value: SignatureValue,
}

/// The protocol message and unit of storage (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrxRecord {
    pub transaction_code: String,
    pub session_code: String,
    pub payload: Value,
    pub topology: Topology,
    pub start: i64,
    pub promises_due: i64,
    pub commits_due: i64,
    /// Insertion-ordered; at most one entry per key.
    pub promises: Vec<SignatureEntry>,
    /// Insertion-ordered; at most one entry per key.
    pub commits: Vec<SignatureEntry>,
}

/// Checks a high-entropy identifier (`transactionCode`/`sessionCode`)
/// against a minimum randomness floor.
pub trait CodeEntropyCheck {
    fn passes(&self, code: &str) -> bool;
}

/// The default entropy predicate: approximate Shannon entropy per
/// character must clear `min_bits_per_char`, and the code must be at
/// least `min_length` characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShannonEntropyCheck {
    pub min_length: usize,
    pub min_bits_per_char: f64,
}

impl Default for ShannonEntropyCheck {
    fn default() -> Self {
        ShannonEntropyCheck {
            min_length: 16,
            min_bits_per_char: 3.0,
        }
    }
}

impl CodeEntropyCheck for ShannonEntropyCheck {
    fn passes(&self, code: &str) -> bool {
        if code.len() < self.min_length {
            return false;
        }
        shannon_entropy_per_char(code) >= self.min_bits_per_char
    }
}

fn shannon_entropy_per_char(s: &str) -> f64 {
    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0u32) += 1;
    }
    let len = s.chars().count() as f64;
    if len == 0.0 {
        return 0.0;
    }
    -counts
        .values()
        .map(|&count| {
            let p = count as f64 / len;
            p * p.log2()
        })
        .sum::<f64>()
}

/// An extension point for the host to cross-check a brand-new transaction
/// against knowledge only it has (e.g. that `sessionCode` was actually
/// handed out by this node). Left unimplemented by default (a no-op; see
/// DESIGN.md Open Question 2).
pub trait SessionKnowledge {
    fn check(&self, record: &TrxRecord) -> Result<(), ProtocolError>;
}

/// Checks a freshly-observed record with no prior storage entry (§4.4).
pub fn validate_new(
    record: &TrxRecord,
    entropy_check: &dyn CodeEntropyCheck,
    now: i64,
    min_promise_time: i64,
    session_knowledge: Option<&dyn SessionKnowledge>,
) -> Result<(), ProtocolError> {
    if !entropy_check.passes(&record.transaction_code) || !entropy_check.passes(&record.session_code)
    {
        return Err(ProtocolError::CodeEntropyTooLow);
    }
    if record.start > now {
        return Err(ProtocolError::TemporalViolation(format!(
            "start ({}) is in the future (now = {now})",
            record.start
        )));
    }
    if record.promises_due < record.start + min_promise_time {
        return Err(ProtocolError::TemporalViolation(format!(
            "promisesDue ({}) is earlier than start + minPromiseTime ({})",
            record.promises_due,
            record.start + min_promise_time
        )));
    }
    if let Some(session_knowledge) = session_knowledge {
        session_knowledge.check(record)?;
    }
    Ok(())
}

/// Checks an incoming record against a stored prior for the same
/// `transactionCode` (§4.4): every immutable field must match by deep
/// equality.
pub fn validate_update(prior: &TrxRecord, incoming: &TrxRecord) -> Result<(), ProtocolError> {
    if prior.transaction_code != incoming.transaction_code {
        return Err(ProtocolError::FieldMismatch {
            field: "transactionCode",
        });
    }
    if prior.session_code != incoming.session_code {
        return Err(ProtocolError::FieldMismatch {
            field: "sessionCode",
        });
    }
    if prior.payload != incoming.payload {
        return Err(ProtocolError::FieldMismatch { field: "payload" });
    }
    if prior.topology != incoming.topology {
        return Err(ProtocolError::FieldMismatch { field: "topology" });
    }
    if prior.start != incoming.start {
        return Err(ProtocolError::FieldMismatch { field: "start" });
    }
    if prior.promises_due != incoming.promises_due {
        return Err(ProtocolError::FieldMismatch {
            field: "promisesDue",
        });
    }
    if prior.commits_due != incoming.commits_due {
        return Err(ProtocolError::FieldMismatch {
            field: "commitsDue",
        });
    }
    Ok(())
}

/// The Merger of §4.4: returns `incoming` verbatim when there is no prior;
/// otherwise returns a new record with immutable fields copied from either
/// (already proven equal by [`validate_update`]) and `promises`/`commits`
/// set to the signature-merge of prior and incoming.
pub fn merge(prior: Option<&TrxRecord>, incoming: &TrxRecord) -> Result<TrxRecord, ProtocolError> {
    let Some(prior) = prior else {
        return Ok(incoming.clone());
    };
    validate_update(prior, incoming)?;
    Ok(TrxRecord {
        transaction_code: prior.transaction_code.clone(),
        session_code: prior.session_code.clone(),
        payload: prior.payload.clone(),
        topology: prior.topology.clone(),
        start: prior.start,
        promises_due: prior.promises_due,
        commits_due: prior.commits_due,
        promises: crate::signature_merge::merge_signatures(&prior.promises, &incoming.promises)?,
        commits: crate::signature_merge::merge_signatures(&prior.commits, &incoming.commits)?,
    })
}
