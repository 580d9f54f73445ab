//! Collaborators the read plane consumes, with in-memory implementations.

use std::collections::HashMap;

use hashlock_ledger::{BlockOutcome, ChainState, LedgerSnapshot, WalletDirectory};
use hashlock_types::{ChainTip, HashlockError, LockId, Result, SettlingTransaction, TransactionId};

/// Metadata of the last accepted block.
pub trait ChainTipProvider {
    fn current(&self) -> ChainTip;
}

impl<W: WalletDirectory + Clone + 'static> ChainTipProvider for ChainState<W> {
    fn current(&self) -> ChainTip {
        self.tip()
    }
}

impl<W> ChainTipProvider for LedgerSnapshot<W> {
    fn current(&self) -> ChainTip {
        self.tip()
    }
}

/// A fixed tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticTip(pub ChainTip);

impl ChainTipProvider for StaticTip {
    fn current(&self) -> ChainTip {
        self.0
    }
}

/// Lookup of the claim and refund transactions that settled locks.
pub trait TransactionHistory {
    fn find_by_lock_id(&self, lock_id: &LockId) -> Option<SettlingTransaction>;

    /// Transactions with the given ids. Unknown ids are left out.
    fn find_by_ids(&self, ids: &[TransactionId]) -> Vec<SettlingTransaction>;
}

// ---------------------------------------------------------------------------
// TransactionLog
// ---------------------------------------------------------------------------

/// In-memory settling transaction store, fed from block outcomes.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    transactions: HashMap<TransactionId, SettlingTransaction>,
    by_lock: HashMap<LockId, TransactionId>,
}

impl TransactionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one settling transaction.
    ///
    /// Recording the same transaction twice is a no-op.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the lock is already settled by a
    /// different transaction, or the id is reused for a different lock.
    pub fn record(&mut self, tx: SettlingTransaction) -> Result<()> {
        if let Some(existing) = self.by_lock.get(&tx.lock_id) {
            if *existing == tx.id {
                return Ok(());
            }
            return Err(HashlockError::InvariantViolation {
                reason: format!(
                    "lock {} already settled by {}, not {}",
                    tx.lock_id, existing, tx.id
                ),
            });
        }
        if self.transactions.contains_key(&tx.id) {
            return Err(HashlockError::InvariantViolation {
                reason: format!("transaction {} already settled another lock", tx.id),
            });
        }
        self.by_lock.insert(tx.lock_id, tx.id);
        self.transactions.insert(tx.id, tx);
        Ok(())
    }

    /// Store every claim and refund accepted in a block.
    ///
    /// # Errors
    /// See [`record`](Self::record).
    pub fn record_block(&mut self, outcome: &BlockOutcome) -> Result<usize> {
        let mut recorded = 0;
        for tx in outcome.settling_transactions() {
            self.record(tx.clone())?;
            recorded += 1;
        }
        tracing::debug!(height = outcome.height, recorded, "Settling transactions recorded");
        Ok(recorded)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl TransactionHistory for TransactionLog {
    fn find_by_lock_id(&self, lock_id: &LockId) -> Option<SettlingTransaction> {
        self.by_lock
            .get(lock_id)
            .and_then(|id| self.transactions.get(id))
            .cloned()
    }

    fn find_by_ids(&self, ids: &[TransactionId]) -> Vec<SettlingTransaction> {
        ids.iter()
            .filter_map(|id| self.transactions.get(id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use hashlock_types::{BlockId, SettlementType};

    use super::*;

    fn settling(lock: u64, tx: u64, height: u64) -> SettlingTransaction {
        SettlingTransaction {
            id: TransactionId::deterministic("claim", tx),
            lock_id: LockId::deterministic("lock", lock),
            settlement_type: SettlementType::Claimed,
            block_id: BlockId::for_height(height),
            height,
        }
    }

    #[test]
    fn static_tip_reports_its_value() {
        let tip = ChainTip {
            height: 4,
            timestamp: 32,
        };
        assert_eq!(StaticTip(tip).current(), tip);
    }

    #[test]
    fn chain_state_reports_published_tip() {
        let state = ChainState::new();
        assert_eq!(state.current(), ChainTip::genesis());
        assert_eq!(state.snapshot().current(), ChainTip::genesis());
    }

    #[test]
    fn record_and_find() {
        let mut log = TransactionLog::new();
        let tx = settling(1, 1, 5);
        log.record(tx.clone()).unwrap();
        log.record(tx.clone()).unwrap();
        assert_eq!(log.len(), 1);

        assert_eq!(log.find_by_lock_id(&tx.lock_id), Some(tx.clone()));
        assert_eq!(log.find_by_lock_id(&LockId::deterministic("lock", 2)), None);

        let found = log.find_by_ids(&[tx.id, TransactionId::deterministic("claim", 9)]);
        assert_eq!(found, vec![tx]);
    }

    #[test]
    fn second_settlement_of_a_lock_is_rejected() {
        let mut log = TransactionLog::new();
        log.record(settling(1, 1, 5)).unwrap();
        let err = log.record(settling(1, 2, 6)).unwrap_err();
        assert!(matches!(err, HashlockError::InvariantViolation { .. }));
        let err = log.record(settling(2, 1, 6)).unwrap_err();
        assert!(matches!(err, HashlockError::InvariantViolation { .. }));
        assert_eq!(log.len(), 1);
    }
}
