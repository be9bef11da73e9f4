//! A meta-protocol library for executing multi-party transactions across a
//! network of mutually-distrustful nodes. Given a fixed [`topology::Topology`]
//! and an opaque payload, [`driver::ParticipantDriver`] drives one node
//! through a two-phase promise-then-commit protocol: participants sign a
//! promise, then a majority of referees sign a commit.
//!
//! Transport, durable storage, signing keys, and approval policy are
//! host-supplied capabilities ([`capability::Signer`], [`capability::Storage`],
//! [`capability::Decider`]); this crate never constructs them.

pub mod canonical_json;
pub mod capability;
pub mod crypto;
pub mod digest;
pub mod driver;
pub mod error;
pub mod record;
pub mod role;
pub mod signature_merge;
pub mod topology;

pub use capability::{CodeOptions, Config, Decider, Signer, Storage, TimingOptions};
pub use crypto::{CryptoError, Digest as Hash, PrivateKey, PublicKey, SignatureValue};
pub use driver::ParticipantDriver;
pub use error::{CapabilityError, Error, ProtocolError};
pub use record::{SigType, SignatureEntry, TrxRecord};
pub use role::{get_record_state, RecordState};
pub use topology::{Link, Member, Role, Topology, TopologyView};
