//! Read-only lock queries over a published ledger snapshot.
//!
//! Every call sees the same ledger version and the same tip, no matter how
//! many blocks the writer publishes in the meantime.

use hashlock_ledger::{LedgerSnapshot, WalletDirectory, WalletRepository};
use hashlock_types::{
    ChainTip, HashlockError, Lock, LockId, Page, Pagination, QueryConfig, Result,
};

use crate::{criteria::SearchCriteria, view::LockView};

/// `index`, `show` and `search` over one [`LedgerSnapshot`].
#[derive(Debug, Clone)]
pub struct LockQueryService<W = WalletRepository> {
    snapshot: LedgerSnapshot<W>,
    config: QueryConfig,
}

impl<W: WalletDirectory> LockQueryService<W> {
    #[must_use]
    pub fn new(snapshot: LedgerSnapshot<W>, config: QueryConfig) -> Self {
        Self { snapshot, config }
    }

    /// Tip the snapshot was taken at.
    #[must_use]
    pub fn tip(&self) -> ChainTip {
        self.snapshot.tip()
    }

    /// First page at the configured default limit.
    #[must_use]
    pub fn default_pagination(&self) -> Pagination {
        Pagination::new(1, self.config.default_limit)
    }

    /// All active locks in creation order.
    ///
    /// # Errors
    /// Returns `ValidationError` for invalid pagination.
    pub fn index(&self, pagination: Pagination) -> Result<Page<LockView>> {
        pagination.validate(self.config.max_limit)?;
        let locks = self.ordered(|_| true);
        Ok(self.page(locks, pagination))
    }

    /// One active lock by its string id.
    ///
    /// An id that does not parse is reported like any other unknown id.
    ///
    /// # Errors
    /// Returns `NotFound` if no active lock has this id.
    pub fn show(&self, id: &str) -> Result<LockView> {
        let lock_id: LockId = id
            .parse()
            .map_err(|_| HashlockError::NotFound(id.to_owned()))?;
        self.lock(&lock_id)
    }

    /// # Errors
    /// Returns `NotFound` if no active lock has this id.
    pub fn lock(&self, lock_id: &LockId) -> Result<LockView> {
        let lock = self.snapshot.ledger().get(lock_id)?;
        Ok(LockView::new(lock, &self.tip()))
    }

    /// Active locks matching every set field of `criteria`, in creation order.
    ///
    /// # Errors
    /// Returns `ValidationError` for invalid pagination or an inverted range.
    pub fn search(&self, criteria: &SearchCriteria, pagination: Pagination) -> Result<Page<LockView>> {
        pagination.validate(self.config.max_limit)?;
        criteria.validate()?;
        let tip = self.tip();
        let locks = self.ordered(|lock| criteria.matches(lock, &tip));
        tracing::debug!(
            matched = locks.len(),
            page = pagination.page,
            limit = pagination.limit,
            "Lock search"
        );
        Ok(self.page(locks, pagination))
    }

    fn ordered(&self, mut keep: impl FnMut(&Lock) -> bool) -> Vec<&Lock> {
        let mut locks: Vec<&Lock> = self
            .snapshot
            .ledger()
            .active_locks()
            .filter(|lock| keep(*lock))
            .collect();
        locks.sort_by_key(|lock| lock.creation_key());
        locks
    }

    fn page(&self, locks: Vec<&Lock>, pagination: Pagination) -> Page<LockView> {
        let tip = self.tip();
        Page::slice(locks, pagination).map(|lock| LockView::new(lock, &tip))
    }
}
