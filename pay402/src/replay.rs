//! Replay ledger guarding against reuse of signed payment authorizations.
//!
//! The ledger is the authoritative record of which (signer, asset, network,
//! nonce) combinations have already been consumed. It is the only shared
//! mutable state in the verification pipeline, so its test-and-insert must be
//! atomic under concurrent access: two concurrent settlement attempts for the
//! same authorization must produce exactly one reservation.
//!
//! The store is abstracted behind [`ReplayLedger`] so multi-instance
//! deployments can inject a shared backend; [`InMemoryReplayLedger`] is the
//! single-process default and does not survive restarts.

use alloy_primitives::{Address, B256};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::timestamp::UnixTimestamp;

/// The identity of one consumable authorization slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayKey {
    /// The recovered authorization signer.
    pub signer: Address,
    /// The asset contract the authorization targets.
    pub asset: Address,
    /// The network the authorization settles on.
    pub network: String,
    /// The 32-byte per-authorization nonce.
    pub nonce: B256,
}

/// Storage failure in a replay ledger backend.
#[derive(Debug, thiserror::Error)]
#[error("replay ledger storage error: {0}")]
pub struct ReplayLedgerError(pub String);

/// Outcome of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The key was free and is now held by this caller.
    Reserved,
    /// The key was already consumed.
    AlreadyConsumed,
}

/// Atomic record of consumed authorization nonces.
#[async_trait::async_trait]
pub trait ReplayLedger: Send + Sync {
    /// Atomically tests and inserts `key`. At most one caller ever receives
    /// [`Reservation::Reserved`] for a given key while it is held.
    async fn reserve(&self, key: &ReplayKey) -> Result<Reservation, ReplayLedgerError>;

    /// Releases a held reservation so the nonce slot can be retried.
    ///
    /// Called only when settlement definitively failed on-chain. Releasing a
    /// key that is not held is a no-op.
    async fn release(&self, key: &ReplayKey) -> Result<(), ReplayLedgerError>;

    /// Reports whether `key` is currently consumed, without reserving it.
    async fn is_consumed(&self, key: &ReplayKey) -> Result<bool, ReplayLedgerError>;
}

/// Process-local replay ledger backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryReplayLedger {
    entries: DashMap<ReplayKey, UnixTimestamp>,
}

impl InMemoryReplayLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently held reservations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no reservations are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl ReplayLedger for InMemoryReplayLedger {
    async fn reserve(&self, key: &ReplayKey) -> Result<Reservation, ReplayLedgerError> {
        // The entry guard holds the shard lock across the test and insert.
        match self.entries.entry(key.clone()) {
            Entry::Occupied(_) => Ok(Reservation::AlreadyConsumed),
            Entry::Vacant(slot) => {
                slot.insert(UnixTimestamp::now());
                Ok(Reservation::Reserved)
            }
        }
    }

    async fn release(&self, key: &ReplayKey) -> Result<(), ReplayLedgerError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn is_consumed(&self, key: &ReplayKey) -> Result<bool, ReplayLedgerError> {
        Ok(self.entries.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use std::sync::Arc;

    fn key(nonce_byte: u8) -> ReplayKey {
        ReplayKey {
            signer: address!("209693Bc6afc0C5328bA36FaF03C514EF312287C"),
            asset: address!("036CbD53842c5426634e7929541eC2318f3dCF7e"),
            network: "base-sepolia".to_owned(),
            nonce: B256::repeat_byte(nonce_byte),
        }
    }

    #[tokio::test]
    async fn second_reservation_is_rejected() {
        let ledger = InMemoryReplayLedger::new();
        assert_eq!(ledger.reserve(&key(1)).await.unwrap(), Reservation::Reserved);
        assert_eq!(
            ledger.reserve(&key(1)).await.unwrap(),
            Reservation::AlreadyConsumed
        );
        assert!(ledger.is_consumed(&key(1)).await.unwrap());
    }

    #[tokio::test]
    async fn distinct_nonces_do_not_collide() {
        let ledger = InMemoryReplayLedger::new();
        assert_eq!(ledger.reserve(&key(1)).await.unwrap(), Reservation::Reserved);
        assert_eq!(ledger.reserve(&key(2)).await.unwrap(), Reservation::Reserved);
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn release_frees_the_slot() {
        let ledger = InMemoryReplayLedger::new();
        ledger.reserve(&key(1)).await.unwrap();
        ledger.release(&key(1)).await.unwrap();
        assert!(!ledger.is_consumed(&key(1)).await.unwrap());
        assert_eq!(ledger.reserve(&key(1)).await.unwrap(), Reservation::Reserved);
    }

    #[tokio::test]
    async fn releasing_an_unheld_key_is_a_no_op() {
        let ledger = InMemoryReplayLedger::new();
        ledger.release(&key(9)).await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_reservations_yield_exactly_one_winner() {
        let ledger = Arc::new(InMemoryReplayLedger::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.reserve(&key(7)).await.unwrap()
            }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() == Reservation::Reserved {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
