use async_trait::async_trait;
use concord_core::{CapabilityError, PublicKey, Storage, TrxRecord};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory [`Storage`]: two `HashMap`s behind a lock, no
/// persistence across process restarts.
/// `push_peer_record` has no transport of its own to reach for: it just
/// writes into the same table `set_peer_record` reads from, so a test
/// driving several [`concord_core::ParticipantDriver`]s against a shared
/// `MemoryStorage` can treat a push as delivered immediately.
#[derive(Default)]
pub struct MemoryStorage {
    transactions: RwLock<HashMap<String, TrxRecord>>,
    peer_records: RwLock<HashMap<(PublicKey, String), TrxRecord>>,
    invalid_log: RwLock<Vec<(TrxRecord, String)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn invalid_log(&self) -> Vec<(TrxRecord, String)> {
        self.invalid_log.read().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_transaction(
        &self,
        transaction_code: &str,
    ) -> Result<Option<TrxRecord>, CapabilityError> {
        Ok(self.transactions.read().get(transaction_code).cloned())
    }

    async fn set_transaction(&self, record: &TrxRecord) -> Result<(), CapabilityError> {
        self.transactions
            .write()
            .insert(record.transaction_code.clone(), record.clone());
        Ok(())
    }

    async fn set_peer_record(
        &self,
        peer_key: &PublicKey,
        record: &TrxRecord,
    ) -> Result<(), CapabilityError> {
        self.peer_records.write().insert(
            (peer_key.clone(), record.transaction_code.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn get_peer_record(
        &self,
        peer_key: &PublicKey,
        transaction_code: &str,
    ) -> Result<Option<TrxRecord>, CapabilityError> {
        Ok(self
            .peer_records
            .read()
            .get(&(peer_key.clone(), transaction_code.to_string()))
            .cloned())
    }

    async fn push_peer_record(
        &self,
        peer_key: &PublicKey,
        record: &TrxRecord,
    ) -> Result<(), CapabilityError> {
        self.set_peer_record(peer_key, record).await
    }

    async fn log_invalid(&self, record: &TrxRecord, error: &str) -> Result<(), CapabilityError> {
        self.invalid_log
            .write()
            .push((record.clone(), error.to_string()));
        Ok(())
    }
}
