use thiserror::Error;

/// A protocol-level violation detected while validating, merging, or
/// evaluating the role of a [`crate::record::TrxRecord`].
///
/// Every variant here terminates the current `update` immediately: it is
/// logged once to the invalid-record sink and re-raised to the caller
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("transactionCode or sessionCode failed the configured entropy check")]
    CodeEntropyTooLow,
    #[error("temporal violation: {0}")]
    TemporalViolation(String),
    #[error("field mismatch on immutable field `{field}`")]
    FieldMismatch { field: &'static str },
    #[error("duplicate signature for key in `{collection}`")]
    DuplicateSignature { collection: &'static str },
    #[error("signer is not a member of the expected role set `{collection}`")]
    UnknownSigner { collection: &'static str },
    #[error("signature failed to verify for key in `{collection}`")]
    BadSignature { collection: &'static str },
    #[error("commits present before all participants have promised")]
    OutOfPhaseCommit,
    #[error("merge saw the same key with a different (type, value) pair")]
    SignatureMutated,
}

/// The crate-level error, wrapping protocol violations and passthrough
/// failures from the host-supplied capabilities.
#[derive(Error, Debug)]
pub enum Error {
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),
}

/// An opaque error surfaced by a [`crate::capability::Signer`],
/// [`crate::capability::Storage`], or [`crate::capability::Decider`]
/// implementation. The core never interprets this; it only propagates it.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct CapabilityError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl CapabilityError {
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        CapabilityError(Box::new(source))
    }
}
