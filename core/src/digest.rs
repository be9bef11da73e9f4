//! The two digests of §4.1: deterministic base64-SHA-256 over a canonical
//! byte stream, used as the signing target for promises and commits.

use crate::canonical_json::canonicalize;
use crate::crypto::Digest;
use crate::record::TrxRecord;

/// The base digest fields, concatenated in the exact order of §4.1, plus
/// whatever `additional_data` the caller supplies (already stringified).
fn base_digest(record: &TrxRecord, additional_data: &[String]) -> Digest {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(record.transaction_code.as_bytes());
    bytes.extend_from_slice(record.session_code.as_bytes());
    bytes.extend_from_slice(canonicalize(&record.payload).as_bytes());
    bytes.extend_from_slice(
        canonicalize(&serde_json::to_value(&record.topology).expect("Topology always serializes"))
            .as_bytes(),
    );
    bytes.extend_from_slice(record.start.to_string().as_bytes());
    bytes.extend_from_slice(record.promises_due.to_string().as_bytes());
    bytes.extend_from_slice(record.commits_due.to_string().as_bytes());
    for extra in additional_data {
        bytes.extend_from_slice(extra.as_bytes());
    }
    Digest::of(bytes)
}

/// The digest every entry of `promises` must verify against.
/// `additional_data` is typically empty when verifying, and
/// `[sigType.toString()]` when signing one's own promise.
pub fn promise_digest(record: &TrxRecord, additional_data: &[String]) -> Digest {
    base_digest(record, additional_data)
}

/// The digest every entry of `commits` must verify against. Binds the
/// exact set and order of promise signatures: once any promise is
/// appended, earlier commits are only verifiable against the pre-promise
/// state.
pub fn commit_digest(record: &TrxRecord, caller_extras: &[String]) -> Digest {
    let mut additional_data: Vec<String> = record
        .promises
        .iter()
        .map(|entry| serde_json::to_string(entry).expect("SignatureEntry always serializes"))
        .collect();
    additional_data.extend_from_slice(caller_extras);
    base_digest(record, &additional_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SigType;
    use crate::topology::Topology;
    use std::collections::BTreeMap;

    fn bare_record() -> TrxRecord {
        TrxRecord {
            transaction_code: "tx-code".to_string(),
            session_code: "session-code".to_string(),
            payload: serde_json::json!({"b": 1, "a": 2}),
            topology: Topology {
                links: vec![],
                members: BTreeMap::new(),
            },
            start: 1_000,
            promises_due: 11_000,
            commits_due: 21_000,
            promises: vec![],
            commits: vec![],
        }
    }

    #[test]
    fn promise_digest_is_deterministic() {
        let record = bare_record();
        assert_eq!(promise_digest(&record, &[]), promise_digest(&record, &[]));
    }

    #[test]
    fn promise_digest_insensitive_to_payload_key_order() {
        let mut reordered = bare_record();
        reordered.payload = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(
            promise_digest(&bare_record(), &[]),
            promise_digest(&reordered, &[])
        );
    }

    #[test]
    fn promise_digest_sensitive_to_additional_data() {
        let record = bare_record();
        let with_extra = promise_digest(&record, &[SigType::Promise.to_string()]);
        let without_extra = promise_digest(&record, &[]);
        assert_ne!(with_extra, without_extra);
    }

    #[test]
    fn commit_digest_binds_promise_order() {
        use crate::crypto::{PublicKey, SignatureValue};
        use crate::record::SignatureEntry;

        let mut with_one_promise = bare_record();
        with_one_promise.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: PublicKey::from_base64("k1"),
            value: SignatureValue::from_base64("v1"),
        });

        let mut with_two_promises = with_one_promise.clone();
        with_two_promises.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: PublicKey::from_base64("k2"),
            value: SignatureValue::from_base64("v2"),
        });

        assert_ne!(
            commit_digest(&with_one_promise, &[]),
            commit_digest(&with_two_promises, &[])
        );
    }

    #[test]
    fn digest_sensitive_to_every_base_field() {
        let base = bare_record();
        let mut variants = vec![base.clone(); 6];
        variants[0].transaction_code = "different".to_string();
        variants[1].session_code = "different".to_string();
        variants[2].payload = serde_json::json!({"different": true});
        variants[3].start += 1;
        variants[4].promises_due += 1;
        variants[5].commits_due += 1;
        for variant in variants {
            assert_ne!(promise_digest(&base, &[]), promise_digest(&variant, &[]));
        }
    }
}
