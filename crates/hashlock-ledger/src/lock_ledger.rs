//! The lock ledger: active locks per wallet, locked balances, and the
//! settlement history.
//!
//! Every mutation either fully applies or leaves the ledger unchanged.
//! A balance underflow is treated as data corruption: the ledger halts
//! and refuses all later mutations.

use std::collections::HashMap;

use hashlock_types::{
    Address, BlockId, HashlockError, Lock, LockId, LockStatus, Result, SettlementEntry,
    SettlementType, TransactionId, Wallet,
};
use rust_decimal::Decimal;

use crate::wallet_directory::{WalletDirectory, WalletRepository};

/// The transaction and block that settle a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub settlement_type: SettlementType,
    pub transaction_id: TransactionId,
    pub block_id: BlockId,
    pub height: u64,
}

/// Owns wallet lock attributes and the global lock indexes.
///
/// The ledger is the source of truth for lock state. Transaction handlers
/// call into it; the query plane reads published snapshots of it.
#[derive(Debug, Clone)]
pub struct LockLedger<W = WalletRepository> {
    /// Per-wallet lock maps and locked balances.
    wallets: W,
    /// Active lock id → sending wallet.
    active: HashMap<LockId, Address>,
    /// Resolved locks, append-only.
    settlements: HashMap<LockId, SettlementEntry>,
    /// Set once a fatal error has been seen.
    halted: Option<String>,
}

impl LockLedger<WalletRepository> {
    /// Create an empty ledger backed by an in-memory wallet repository.
    #[must_use]
    pub fn new() -> Self {
        Self::with_wallets(WalletRepository::new())
    }
}

impl Default for LockLedger<WalletRepository> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WalletDirectory> LockLedger<W> {
    /// Build a ledger over an existing wallet directory.
    ///
    /// Any locks already held by the wallets are indexed as active.
    pub fn with_wallets(wallets: W) -> Self {
        let active: HashMap<LockId, Address> = wallets
            .wallets()
            .flat_map(|w| w.locks().map(|l| (l.id, w.address.clone())))
            .collect();
        Self {
            wallets,
            active,
            settlements: HashMap::new(),
            halted: None,
        }
    }

    /// Insert `lock` as active for `wallet` and raise its locked balance.
    ///
    /// # Errors
    /// - `LedgerHalted` after a fatal error
    /// - `DuplicateLock` if the id was ever used, active or settled
    /// - `InvalidLock` if `wallet` is not the lock's sender or the amount is malformed
    /// - `BalanceOverflow` if the locked balance would overflow
    pub fn add_lock(&mut self, wallet: &Address, lock: Lock) -> Result<()> {
        self.ensure_running()?;

        if self.active.contains_key(&lock.id) || self.settlements.contains_key(&lock.id) {
            return Err(HashlockError::DuplicateLock(lock.id));
        }
        if &lock.sender != wallet {
            return Err(HashlockError::InvalidLock {
                reason: format!("lock {} is sent by {}, not {wallet}", lock.id, lock.sender),
            });
        }
        Lock::validate_amount(lock.amount)?;

        // Check the balance arithmetic before touching the directory so an
        // overflow does not leave a freshly created wallet behind.
        let current = self
            .wallets
            .by_address(wallet)
            .map_or(Decimal::ZERO, Wallet::locked_balance);
        if current.checked_add(lock.amount).is_none() {
            return Err(HashlockError::BalanceOverflow {
                sender: wallet.clone(),
            });
        }

        let lock_id = lock.id;
        let amount = lock.amount;
        self.wallets.by_address_mut(wallet).htlc_mut().insert(lock)?;
        self.active.insert(lock_id, wallet.clone());

        tracing::debug!(
            lock = %lock_id.short(),
            sender = %wallet,
            %amount,
            "Lock added"
        );
        Ok(())
    }

    /// Remove an active lock, lower its sender's locked balance, and
    /// record how it was settled.
    ///
    /// # Errors
    /// - `LedgerHalted` after a fatal error
    /// - `LockNotFound` if the lock is not active for `wallet`
    /// - `BalanceUnderflow` if the locked balance is smaller than the lock
    ///   amount (the ledger halts)
    pub fn resolve_lock(
        &mut self,
        wallet: &Address,
        lock_id: LockId,
        resolution: Resolution,
    ) -> Result<Lock> {
        self.ensure_running()?;

        if self.active.get(&lock_id) != Some(wallet) {
            return Err(HashlockError::LockNotFound(lock_id));
        }

        let removed = self
            .wallets
            .by_address_mut(wallet)
            .htlc_mut()
            .remove(&lock_id);
        let lock = match removed {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                return Err(self.halt(HashlockError::InvariantViolation {
                    reason: format!("lock {lock_id} is indexed for {wallet} but not held by it"),
                }));
            }
            Err(err) => return Err(self.halt(err)),
        };

        self.active.remove(&lock_id);
        self.settlements.insert(
            lock_id,
            SettlementEntry {
                lock: lock.clone(),
                settlement_type: resolution.settlement_type,
                settling_transaction_id: resolution.transaction_id,
                block_id: resolution.block_id,
                height: resolution.height,
            },
        );

        tracing::debug!(
            lock = %lock_id.short(),
            sender = %wallet,
            amount = %lock.amount,
            outcome = %resolution.settlement_type,
            "Lock resolved"
        );
        Ok(lock)
    }

    /// Look up an active lock.
    ///
    /// # Errors
    /// Returns `NotFound` if no active lock has this id.
    pub fn get(&self, lock_id: &LockId) -> Result<&Lock> {
        self.active
            .get(lock_id)
            .and_then(|sender| self.wallets.by_address(sender))
            .and_then(|wallet| wallet.lock(lock_id))
            .ok_or_else(|| HashlockError::NotFound(lock_id.to_string()))
    }

    /// Derived lifecycle state. `None` for an id the ledger never saw.
    #[must_use]
    pub fn status(&self, lock_id: &LockId) -> Option<LockStatus> {
        if self.active.contains_key(lock_id) {
            Some(LockStatus::Active)
        } else {
            self.settlements
                .get(lock_id)
                .map(|entry| entry.settlement_type.status())
        }
    }

    /// Settlement history entry for a resolved lock.
    #[must_use]
    pub fn settlement(&self, lock_id: &LockId) -> Option<&SettlementEntry> {
        self.settlements.get(lock_id)
    }

    /// All settlement history entries, in no particular order.
    pub fn settlements(&self) -> impl Iterator<Item = &SettlementEntry> {
        self.settlements.values()
    }

    #[must_use]
    pub fn wallet(&self, address: &Address) -> Option<&Wallet> {
        self.wallets.by_address(address)
    }

    /// Locked balance of a wallet; zero for unknown wallets.
    #[must_use]
    pub fn locked_balance(&self, address: &Address) -> Decimal {
        self.wallet(address).map_or(Decimal::ZERO, Wallet::locked_balance)
    }

    #[must_use]
    pub fn wallets(&self) -> &W {
        &self.wallets
    }

    /// Every active lock across all wallets, grouped by wallet.
    pub fn active_locks(&self) -> impl Iterator<Item = &Lock> {
        self.wallets.wallets().flat_map(|w| w.locks())
    }

    /// Sending wallet of an active lock.
    #[must_use]
    pub fn active_sender(&self, lock_id: &LockId) -> Option<&Address> {
        self.active.get(lock_id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Sum of all locked balances.
    #[must_use]
    pub fn total_locked(&self) -> Decimal {
        self.wallets.wallets().map(Wallet::locked_balance).sum()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Why the ledger halted, if it did.
    #[must_use]
    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    fn ensure_running(&self) -> Result<()> {
        match &self.halted {
            Some(reason) => Err(HashlockError::LedgerHalted {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn halt(&mut self, err: HashlockError) -> HashlockError {
        tracing::error!(error = %err, "Lock ledger halted");
        self.halted = Some(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use hashlock_types::Expiration;

    use super::*;

    fn alice() -> Address {
        Address::new("alice")
    }

    fn lock(amount: i64) -> Lock {
        Lock::dummy("alice", amount, Expiration::BlockHeight(100), 1)
    }

    fn resolution(settlement_type: SettlementType) -> Resolution {
        Resolution {
            settlement_type,
            transaction_id: TransactionId::random(),
            block_id: BlockId::for_height(2),
            height: 2,
        }
    }

    fn assert_balance_invariant(ledger: &LockLedger) {
        for wallet in ledger.wallets().wallets() {
            let sum: Decimal = wallet.locks().map(|l| l.amount).sum();
            assert_eq!(wallet.locked_balance(), sum, "wallet {}", wallet.address);
        }
    }

    #[test]
    fn add_lock_increases_locked_balance() {
        let mut ledger = LockLedger::new();
        let l = lock(1);
        let id = l.id;
        ledger.add_lock(&alice(), l).unwrap();

        assert_eq!(ledger.locked_balance(&alice()), Decimal::ONE);
        assert_eq!(ledger.status(&id), Some(LockStatus::Active));
        assert_eq!(ledger.get(&id).unwrap().id, id);
        assert_eq!(ledger.active_count(), 1);
        assert_balance_invariant(&ledger);
    }

    #[test]
    fn duplicate_lock_rejected_without_side_effects() {
        let mut ledger = LockLedger::new();
        let l = lock(3);
        ledger.add_lock(&alice(), l.clone()).unwrap();

        let err = ledger.add_lock(&alice(), l).unwrap_err();
        assert!(matches!(err, HashlockError::DuplicateLock(_)));
        assert_eq!(ledger.locked_balance(&alice()), Decimal::new(3, 0));
        assert_eq!(ledger.active_count(), 1);
        assert_balance_invariant(&ledger);
    }

    #[test]
    fn settled_id_cannot_be_reused() {
        let mut ledger = LockLedger::new();
        let l = lock(3);
        let id = l.id;
        ledger.add_lock(&alice(), l.clone()).unwrap();
        ledger
            .resolve_lock(&alice(), id, resolution(SettlementType::Claimed))
            .unwrap();

        let err = ledger.add_lock(&alice(), l).unwrap_err();
        assert!(matches!(err, HashlockError::DuplicateLock(got) if got == id));
        assert_eq!(ledger.status(&id), Some(LockStatus::Claimed));
    }

    #[test]
    fn add_lock_rejects_foreign_wallet() {
        let mut ledger = LockLedger::new();
        let err = ledger.add_lock(&Address::new("bob"), lock(1)).unwrap_err();
        assert!(matches!(err, HashlockError::InvalidLock { .. }));
        assert!(ledger.wallet(&Address::new("bob")).is_none());
    }

    #[test]
    fn overflow_leaves_no_trace() {
        let mut ledger = LockLedger::new();
        let mut big = lock(0);
        big.amount = Decimal::MAX;
        ledger.add_lock(&alice(), big).unwrap();

        let l = lock(1);
        let id = l.id;
        let err = ledger.add_lock(&alice(), l).unwrap_err();
        assert!(matches!(err, HashlockError::BalanceOverflow { .. }));
        assert_eq!(ledger.status(&id), None);
        assert_eq!(ledger.active_count(), 1);
    }

    #[test]
    fn resolve_lock_releases_balance_and_records_settlement() {
        let mut ledger = LockLedger::new();
        let keep = lock(2);
        let gone = lock(5);
        let gone_id = gone.id;
        ledger.add_lock(&alice(), keep).unwrap();
        ledger.add_lock(&alice(), gone).unwrap();

        let res = resolution(SettlementType::Refunded);
        let removed = ledger.resolve_lock(&alice(), gone_id, res).unwrap();
        assert_eq!(removed.id, gone_id);

        assert_eq!(ledger.locked_balance(&alice()), Decimal::new(2, 0));
        assert_eq!(ledger.status(&gone_id), Some(LockStatus::Refunded));
        let entry = ledger.settlement(&gone_id).unwrap();
        assert_eq!(entry.settling_transaction_id, res.transaction_id);
        assert_eq!(entry.height, 2);
        assert!(matches!(
            ledger.get(&gone_id),
            Err(HashlockError::NotFound(_))
        ));
        assert_balance_invariant(&ledger);
    }

    #[test]
    fn resolve_twice_is_lock_not_found() {
        let mut ledger = LockLedger::new();
        let l = lock(1);
        let id = l.id;
        ledger.add_lock(&alice(), l).unwrap();
        ledger
            .resolve_lock(&alice(), id, resolution(SettlementType::Claimed))
            .unwrap();

        let err = ledger
            .resolve_lock(&alice(), id, resolution(SettlementType::Refunded))
            .unwrap_err();
        assert!(matches!(err, HashlockError::LockNotFound(got) if got == id));
        assert_eq!(ledger.status(&id), Some(LockStatus::Claimed));
    }

    #[test]
    fn resolve_for_wrong_wallet_is_lock_not_found() {
        let mut ledger = LockLedger::new();
        let l = lock(1);
        let id = l.id;
        ledger.add_lock(&alice(), l).unwrap();
        let err = ledger
            .resolve_lock(&Address::new("bob"), id, resolution(SettlementType::Claimed))
            .unwrap_err();
        assert!(matches!(err, HashlockError::LockNotFound(_)));
        assert_eq!(ledger.locked_balance(&alice()), Decimal::ONE);
    }

    #[test]
    fn underflow_halts_ledger() {
        let mut wallets = WalletRepository::new();
        let l = lock(9);
        let id = l.id;
        {
            let attrs = wallets.by_address_mut(&alice()).htlc_mut();
            attrs.insert(l).unwrap();
            attrs.force_locked_balance(Decimal::new(4, 0));
        }
        let mut ledger = LockLedger::with_wallets(wallets);
        assert_eq!(ledger.status(&id), Some(LockStatus::Active));

        let err = ledger
            .resolve_lock(&alice(), id, resolution(SettlementType::Claimed))
            .unwrap_err();
        assert!(matches!(err, HashlockError::BalanceUnderflow { .. }));
        assert!(ledger.is_halted());
        // Not clamped: balance and lock untouched.
        assert_eq!(ledger.locked_balance(&alice()), Decimal::new(4, 0));
        assert_eq!(ledger.status(&id), Some(LockStatus::Active));

        let err = ledger.add_lock(&alice(), lock(1)).unwrap_err();
        assert!(matches!(err, HashlockError::LedgerHalted { .. }));
    }

    #[test]
    fn unknown_id_has_no_status() {
        let ledger = LockLedger::new();
        let id = LockId::random();
        assert_eq!(ledger.status(&id), None);
        let err = ledger.get(&id).unwrap_err();
        assert!(format!("{err}").contains(&format!("Lock {id} not found")));
    }

    #[test]
    fn invariant_holds_across_mixed_operations() {
        let mut ledger = LockLedger::new();
        let mut ids = Vec::new();
        for amount in 1..=10 {
            let l = lock(amount);
            ids.push(l.id);
            ledger.add_lock(&alice(), l).unwrap();
            assert_balance_invariant(&ledger);
        }
        for (i, id) in ids.iter().enumerate().filter(|(i, _)| i % 3 == 0) {
            let kind = if i % 2 == 0 {
                SettlementType::Claimed
            } else {
                SettlementType::Refunded
            };
            ledger.resolve_lock(&alice(), *id, resolution(kind)).unwrap();
            assert_balance_invariant(&ledger);
        }
        // 1..=10 minus amounts at indexes 0, 3, 6, 9 (1 + 4 + 7 + 10).
        assert_eq!(ledger.locked_balance(&alice()), Decimal::new(55 - 22, 0));
        assert_eq!(ledger.total_locked(), Decimal::new(33, 0));
    }
}
