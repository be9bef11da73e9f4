//! The role evaluator of §4.5: computes what (if anything) this node must
//! do next with a merged record, verifying every signature along the way.

use crate::capability::Signer;
use crate::crypto::PublicKey;
use crate::digest::{commit_digest, promise_digest};
use crate::error::{Error, ProtocolError};
use crate::record::TrxRecord;
use std::collections::BTreeSet;

/// What the role evaluator determined this node needs to do, and what the
/// record's overall commit status is. Emitted progressively: the fields
/// populated depend on how far through §4.5's steps evaluation got before
/// settling (steps 6/8/9 each emit a strict subset of this struct's facts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordState {
    pub our_promise_needed: bool,
    pub fully_promised: bool,
    pub our_commit_needed: bool,
    pub consensus_committed: bool,
    pub fully_committed: bool,
}

/// Computes the [`RecordState`] of `record` for this node, per §4.5.
/// Any failure here is fatal to the current `update`.
pub async fn get_record_state(
    record: &TrxRecord,
    signer: &dyn Signer,
) -> Result<RecordState, Error> {
    let view = record.topology.view();
    let participants = view.participants();
    let referees = view.referees();

    reject_duplicate_or_unknown_keys(&record.promises, &participants, "promises")?;

    for entry in &record.promises {
        let digest = promise_digest(record, &[entry.sig_type.to_string()]);
        let ok = signer.verify(&entry.key, &digest, &entry.value).await?;
        if !ok {
            return Err(ProtocolError::BadSignature {
                collection: "promises",
            }
            .into());
        }
    }

    let our_key = signer.get_our_key(&record.session_code).await?;
    let promised_keys: BTreeSet<PublicKey> =
        record.promises.iter().map(|e| e.key.clone()).collect();

    let our_promise_needed = participants.contains(&our_key) && !promised_keys.contains(&our_key);
    if our_promise_needed {
        if !record.commits.is_empty() {
            return Err(ProtocolError::OutOfPhaseCommit.into());
        }
        return Ok(RecordState {
            our_promise_needed: true,
            ..Default::default()
        });
    }

    let fully_promised = participants.iter().all(|key| promised_keys.contains(key));
    if !fully_promised {
        if !record.commits.is_empty() {
            return Err(ProtocolError::OutOfPhaseCommit.into());
        }
        return Ok(RecordState {
            our_promise_needed: false,
            fully_promised: false,
            ..Default::default()
        });
    }

    reject_duplicate_or_unknown_keys(&record.commits, &referees, "commits")?;

    for entry in &record.commits {
        let digest = commit_digest(record, &[entry.sig_type.to_string()]);
        let ok = signer.verify(&entry.key, &digest, &entry.value).await?;
        if !ok {
            return Err(ProtocolError::BadSignature {
                collection: "commits",
            }
            .into());
        }
    }

    let committed_keys: BTreeSet<PublicKey> =
        record.commits.iter().map(|e| e.key.clone()).collect();
    let our_commit_needed = referees.contains(&our_key) && !committed_keys.contains(&our_key);
    let consensus_threshold = referees.len().div_ceil(2);
    let consensus_committed = record.commits.len() >= consensus_threshold;
    let fully_committed = record.commits.len() == referees.len();

    Ok(RecordState {
        our_promise_needed: false,
        fully_promised: true,
        our_commit_needed,
        consensus_committed,
        fully_committed,
    })
}

fn reject_duplicate_or_unknown_keys(
    entries: &[crate::record::SignatureEntry],
    allowed: &BTreeSet<PublicKey>,
    collection: &'static str,
) -> Result<(), ProtocolError> {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.key.clone()) {
            return Err(ProtocolError::DuplicateSignature { collection });
        }
        if !allowed.contains(&entry.key) {
            return Err(ProtocolError::UnknownSigner { collection });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Signer;
    use crate::crypto::{generate_keypair, Digest, PrivateKey, SignatureValue};
    use crate::error::CapabilityError;
    use crate::record::{SigType, SignatureEntry};
    use crate::topology::{Member, Role, Topology};
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct FakeSigner {
        our_key: PublicKey,
    }

    #[async_trait]
    impl Signer for FakeSigner {
        async fn get_our_key(&self, _session_code: &str) -> Result<PublicKey, CapabilityError> {
            Ok(self.our_key.clone())
        }

        async fn sign(&self, _digest: &Digest) -> Result<SignatureValue, CapabilityError> {
            unreachable!("role evaluator never signs")
        }

        async fn verify(
            &self,
            key: &PublicKey,
            digest: &Digest,
            value: &SignatureValue,
        ) -> Result<bool, CapabilityError> {
            Ok(value.verify(digest, key).unwrap_or(false))
        }
    }

    struct Fixture {
        record: TrxRecord,
        p1_key: PublicKey,
        p1_private: PrivateKey,
        p2_key: PublicKey,
    }

    fn build_fixture() -> Fixture {
        let (p1_key, p1_private) = generate_keypair("p1");
        let (p2_key, _) = generate_keypair("p2");
        let mut members = BTreeMap::new();
        members.insert(
            p1_key.clone(),
            Member {
                address: None,
                agent_secret: None,
                roles: [Role::Participant, Role::Referee].into_iter().collect(),
            },
        );
        members.insert(
            p2_key.clone(),
            Member {
                address: None,
                agent_secret: None,
                roles: [Role::Participant].into_iter().collect(),
            },
        );
        let record = TrxRecord {
            transaction_code: "tx".repeat(10),
            session_code: "se".repeat(10),
            payload: serde_json::json!({}),
            topology: Topology {
                links: vec![],
                members,
            },
            start: 0,
            promises_due: 10_000,
            commits_due: 20_000,
            promises: vec![],
            commits: vec![],
        };
        Fixture {
            record,
            p1_key,
            p1_private,
            p2_key,
        }
    }

    #[tokio::test]
    async fn our_promise_needed_when_participant_has_not_signed() {
        let fixture = build_fixture();
        let signer = FakeSigner {
            our_key: fixture.p1_key.clone(),
        };
        let state = get_record_state(&fixture.record, &signer).await.unwrap();
        assert!(state.our_promise_needed);
        assert!(!state.fully_promised);
    }

    #[tokio::test]
    async fn not_fully_promised_until_every_participant_signs() {
        let mut fixture = build_fixture();
        let digest = promise_digest(&fixture.record, &[SigType::Promise.to_string()]);
        let signature = fixture.p1_private.sign(&digest);
        fixture.record.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: fixture.p1_key.clone(),
            value: signature,
        });
        let signer = FakeSigner {
            our_key: fixture.p2_key.clone(),
        };
        let state = get_record_state(&fixture.record, &signer).await.unwrap();
        assert!(state.our_promise_needed);
        assert!(!state.fully_promised);
    }

    #[tokio::test]
    async fn commits_before_full_promises_is_fatal() {
        let mut fixture = build_fixture();
        fixture.record.commits.push(SignatureEntry {
            sig_type: SigType::Commit,
            key: fixture.p1_key.clone(),
            value: SignatureValue::from_base64("bogus"),
        });
        let signer = FakeSigner {
            our_key: fixture.p2_key.clone(),
        };
        let err = get_record_state(&fixture.record, &signer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::OutOfPhaseCommit)
        ));
    }

    #[tokio::test]
    async fn bad_signature_is_fatal() {
        let mut fixture = build_fixture();
        fixture.record.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: fixture.p1_key.clone(),
            value: SignatureValue::from_base64("bogus"),
        });
        let signer = FakeSigner {
            our_key: fixture.p2_key.clone(),
        };
        let err = get_record_state(&fixture.record, &signer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::BadSignature { .. })
        ));
    }

    #[tokio::test]
    async fn our_commit_needed_once_fully_promised() {
        let mut fixture = build_fixture();
        let digest = promise_digest(&fixture.record, &[SigType::Promise.to_string()]);
        let (_, p2_private) = (
            fixture.p2_key.clone(),
            crate::crypto::generate_keypair("p2").1,
        );
        fixture.record.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: fixture.p1_key.clone(),
            value: fixture.p1_private.sign(&digest),
        });
        fixture.record.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: fixture.p2_key.clone(),
            value: p2_private.sign(&digest),
        });
        let signer = FakeSigner {
            our_key: fixture.p1_key.clone(),
        };
        let state = get_record_state(&fixture.record, &signer).await.unwrap();
        assert!(state.fully_promised);
        assert!(state.our_commit_needed);
        assert!(!state.consensus_committed);
    }

    #[tokio::test]
    async fn consensus_threshold_is_majority_of_referees() {
        let mut fixture = build_fixture();
        let digest = promise_digest(&fixture.record, &[SigType::Promise.to_string()]);
        let p2_private = crate::crypto::generate_keypair("p2").1;
        fixture.record.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: fixture.p1_key.clone(),
            value: fixture.p1_private.sign(&digest),
        });
        fixture.record.promises.push(SignatureEntry {
            sig_type: SigType::Promise,
            key: fixture.p2_key.clone(),
            value: p2_private.sign(&digest),
        });
        let commit_digest = commit_digest(&fixture.record, &[SigType::Commit.to_string()]);
        fixture.record.commits.push(SignatureEntry {
            sig_type: SigType::Commit,
            key: fixture.p1_key.clone(),
            value: fixture.p1_private.sign(&commit_digest),
        });
        let signer = FakeSigner {
            our_key: fixture.p1_key.clone(),
        };
        let state = get_record_state(&fixture.record, &signer).await.unwrap();
        assert!(state.consensus_committed);
        assert!(state.fully_committed);
        assert!(!state.our_commit_needed);
    }
}
