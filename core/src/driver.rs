//! The participant driver of §4.6: the single entry point that ties
//! validation, role evaluation, signing, and gossip together.

use crate::capability::{Config, Decider, Signer, Storage};
use crate::crypto::PublicKey;
use crate::digest::{commit_digest, promise_digest};
use crate::error::Error;
use crate::record::{self, SigType, SignatureEntry, TrxRecord};
use crate::role::get_record_state;
use futures::future::join_all;
use std::sync::Arc;

/// Orchestrates `update → validate+merge → role → sign → gossip` for one
/// node. Holds its four capabilities by generic type parameter, the same
/// dependency-injection-by-generic shape a consensus state machine would
/// use for its own injected pieces.
pub struct ParticipantDriver<S, T, D> {
    signer: Arc<S>,
    storage: Arc<T>,
    decider: Arc<D>,
    config: Config,
}

impl<S, T, D> ParticipantDriver<S, T, D>
where
    S: Signer,
    T: Storage,
    D: Decider,
{
    pub fn new(signer: Arc<S>, storage: Arc<T>, decider: Arc<D>, config: Config) -> Self {
        ParticipantDriver {
            signer,
            storage,
            decider,
            config,
        }
    }

    /// The single entry point of §4.6. `from_key` is the peer the record
    /// arrived from, if any; `None` means it came from the originator or a
    /// non-gossip source.
    pub async fn update(
        &self,
        record: TrxRecord,
        from_key: Option<&PublicKey>,
        now: i64,
    ) -> Result<TrxRecord, Error> {
        if let Some(from_key) = from_key {
            self.storage.set_peer_record(from_key, &record).await?;
        }

        let prior = self.storage.get_transaction(&record.transaction_code).await?;

        let merged = match self.validate_and_merge(prior.as_ref(), &record, now).await {
            Ok(merged) => merged,
            Err(err) => return self.reject(&record, err).await,
        };

        let our_key = self.signer.get_our_key(&merged.session_code).await?;
        let mut final_record = merged;

        // Re-evaluates role after signing our own promise: a node that is
        // simultaneously the last participant and a referee both completes
        // the promise phase and casts its commit within this one call.
        for _ in 0..2 {
            let state = match get_record_state(&final_record, self.signer.as_ref()).await {
                Ok(state) => state,
                Err(err) => return self.reject(&record, err).await,
            };
            if state.our_promise_needed {
                final_record = self.append_our_promise(&final_record, &our_key, now).await?;
            } else if state.our_commit_needed {
                final_record = self.append_our_commit(&final_record, &our_key, now).await?;
                break;
            } else {
                break;
            }
        }

        self.storage.set_transaction(&final_record).await?;
        self.gossip(&final_record, &our_key).await?;

        log::debug!(
            "processed update for transaction {}",
            final_record.transaction_code
        );
        Ok(final_record)
    }

    /// Logs `record` to the invalid-record sink and re-raises `err`
    /// unchanged, the shared failure path for both validation and role
    /// evaluation errors.
    async fn reject(&self, record: &TrxRecord, err: Error) -> Result<TrxRecord, Error> {
        self.storage.log_invalid(record, &err.to_string()).await?;
        log::warn!(
            "rejected update for transaction {}: {err}",
            record.transaction_code
        );
        Err(err)
    }

    async fn validate_and_merge(
        &self,
        prior: Option<&TrxRecord>,
        incoming: &TrxRecord,
        now: i64,
    ) -> Result<TrxRecord, Error> {
        if prior.is_none() {
            record::validate_new(
                incoming,
                self.config.entropy_check(),
                now,
                self.config.timing_options.min_promise_time,
                None,
            )?;
        }
        Ok(record::merge(prior, incoming)?)
    }

    async fn append_our_promise(
        &self,
        merged: &TrxRecord,
        our_key: &PublicKey,
        now: i64,
    ) -> Result<TrxRecord, Error> {
        let approved = self.decider.should_promise(merged).await? && now <= merged.promises_due;
        let sig_type = if approved {
            SigType::Promise
        } else {
            SigType::NoPromise
        };
        let digest = promise_digest(merged, &[sig_type.to_string()]);
        let signature = self.signer.sign(&digest).await?;
        let mut record = merged.clone();
        record.promises.push(SignatureEntry {
            sig_type,
            key: our_key.clone(),
            value: signature,
        });
        Ok(record)
    }

    async fn append_our_commit(
        &self,
        merged: &TrxRecord,
        our_key: &PublicKey,
        now: i64,
    ) -> Result<TrxRecord, Error> {
        let deadline_condition = if self.config.timing_options.commit_requires_deadline_passed {
            now >= merged.commits_due
        } else {
            now <= merged.commits_due
        };
        let approved = self.decider.should_commit(merged).await? && deadline_condition;
        let sig_type = if approved {
            SigType::Commit
        } else {
            SigType::NoCommit
        };
        let digest = commit_digest(merged, &[sig_type.to_string()]);
        let signature = self.signer.sign(&digest).await?;
        let mut record = merged.clone();
        record.commits.push(SignatureEntry {
            sig_type,
            key: our_key.clone(),
            value: signature,
        });
        Ok(record)
    }

    /// Pushes `record` to every reachable peer whose storage-recorded
    /// last-known record is absent or stale. Pushes run in parallel;
    /// individual failures propagate only after all have been awaited.
    async fn gossip(&self, record: &TrxRecord, our_key: &PublicKey) -> Result<(), Error> {
        let reachable = record.topology.view().reachable_peers(our_key);
        let mut targets = Vec::new();
        for peer_key in reachable {
            let last_known = self
                .storage
                .get_peer_record(&peer_key, &record.transaction_code)
                .await?;
            if is_stale(last_known.as_ref(), record) {
                targets.push(peer_key);
            }
        }

        let pushed = targets.len();
        let results = join_all(
            targets
                .iter()
                .map(|peer_key| self.storage.push_peer_record(peer_key, record)),
        )
        .await;
        log::debug!("gossiped to {pushed} of the reachable peers");
        for result in results {
            result?;
        }
        Ok(())
    }
}

/// A peer's last-known record is stale if it has fewer signatures than
/// `record` in either `promises` or `commits` (or is absent entirely).
fn is_stale(last_known: Option<&TrxRecord>, record: &TrxRecord) -> bool {
    match last_known {
        None => true,
        Some(last_known) => {
            last_known.promises.len() < record.promises.len()
                || last_known.commits.len() < record.commits.len()
        }
    }
}
