//! Which of a set of locks have been resolved, and by what transaction.
//!
//! Callers pass candidate ids; the answer only ever contains settled
//! locks. Active ids and ids the ledger never saw are left out without
//! error. A lock is reported only when its settling block is visible from
//! the tip under the configured [`SettlementVisibility`].

use std::collections::{BTreeSet, HashMap};

use hashlock_ledger::{LedgerSnapshot, WalletDirectory, WalletRepository};
use hashlock_types::{
    ChainTip, HashlockConfig, LockId, Page, Pagination, Result, SettlementEntry, SettlementRecord,
    SettlementVisibility, SettlingTransaction,
};

use crate::collaborators::{ChainTipProvider, TransactionHistory};

/// The `unlocked` lookup.
pub struct SettlementResolver<'h, H, W = WalletRepository> {
    snapshot: LedgerSnapshot<W>,
    history: &'h H,
    tip: ChainTip,
    visibility: SettlementVisibility,
    max_limit: u32,
}

impl<'h, H: TransactionHistory, W: WalletDirectory> SettlementResolver<'h, H, W> {
    /// Resolve against `snapshot`, judging visibility at the tip `tips`
    /// reports now.
    #[must_use]
    pub fn new(
        snapshot: LedgerSnapshot<W>,
        history: &'h H,
        tips: &impl ChainTipProvider,
        config: &HashlockConfig,
    ) -> Self {
        Self {
            snapshot,
            history,
            tip: tips.current(),
            visibility: config.settlement.visibility,
            max_limit: config.query.max_limit,
        }
    }

    /// Settlement records for the settled, visible locks among `lock_ids`,
    /// ordered by settlement height then lock id.
    ///
    /// # Errors
    /// Returns `ValidationError` for invalid pagination.
    pub fn resolve(&self, lock_ids: &[LockId], pagination: Pagination) -> Result<Page<SettlementRecord>> {
        pagination.validate(self.max_limit)?;

        let ledger = self.snapshot.ledger();
        let mut settled: Vec<&SettlementEntry> = lock_ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| ledger.settlement(id))
            .filter(|entry| self.visibility.is_visible(entry.height, self.tip.height))
            .collect();
        settled.sort_by_key(|entry| (entry.height, entry.lock.id));

        let tx_ids: Vec<_> = settled.iter().map(|e| e.settling_transaction_id).collect();
        let mut found: HashMap<LockId, SettlingTransaction> = self
            .history
            .find_by_ids(&tx_ids)
            .into_iter()
            .map(|tx| (tx.lock_id, tx))
            .collect();

        let records: Vec<SettlementRecord> = settled
            .into_iter()
            .filter_map(|entry| {
                let lock_id = entry.lock.id;
                let tx = found
                    .remove(&lock_id)
                    .or_else(|| self.history.find_by_lock_id(&lock_id));
                match tx {
                    Some(tx) => Some(SettlementRecord::from(&tx)),
                    None => {
                        tracing::warn!(
                            lock = %lock_id.short(),
                            tx = %entry.settling_transaction_id.short(),
                            height = entry.height,
                            "Settled lock has no settling transaction in history"
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(Page::slice(records, pagination))
    }

    /// [`resolve`](Self::resolve) for string ids. Ids that do not parse
    /// cannot name a lock and are skipped.
    ///
    /// # Errors
    /// Returns `ValidationError` for invalid pagination.
    pub fn unlocked<I, S>(&self, ids: I, pagination: Pagination) -> Result<Page<SettlementRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lock_ids: Vec<LockId> = ids
            .into_iter()
            .filter_map(|id| id.as_ref().parse().ok())
            .collect();
        self.resolve(&lock_ids, pagination)
    }
}
