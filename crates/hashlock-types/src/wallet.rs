//! Per-wallet lock attributes.
//!
//! A wallet that never sent a lock carries no HTLC attributes at all;
//! the typed getters on [`Wallet`] read that as a zero locked balance
//! and an empty lock map.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, HashlockError, Lock, LockId, Result};

/// Locks a wallet has sent, with their aggregated amount.
///
/// `locked_balance` always equals the sum of `amount` over `locks`.
/// Both fields change together inside one `&mut self` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletLockAttributes {
    locked_balance: Decimal,
    locks: BTreeMap<LockId, Lock>,
}

impl WalletLockAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn locked_balance(&self) -> Decimal {
        self.locked_balance
    }

    #[must_use]
    pub fn locks(&self) -> &BTreeMap<LockId, Lock> {
        &self.locks
    }

    #[must_use]
    pub fn get(&self, lock_id: &LockId) -> Option<&Lock> {
        self.locks.get(lock_id)
    }

    #[must_use]
    pub fn contains(&self, lock_id: &LockId) -> bool {
        self.locks.contains_key(lock_id)
    }

    /// Insert a lock and add its amount to the locked balance.
    ///
    /// The new balance is computed before anything is written, so a
    /// failure leaves the attributes unchanged.
    ///
    /// # Errors
    /// - `DuplicateLock` if the id is already present
    /// - `BalanceOverflow` if the sum does not fit
    pub fn insert(&mut self, lock: Lock) -> Result<()> {
        if self.locks.contains_key(&lock.id) {
            return Err(HashlockError::DuplicateLock(lock.id));
        }
        let balance = self.locked_balance.checked_add(lock.amount).ok_or_else(|| {
            HashlockError::BalanceOverflow {
                sender: lock.sender.clone(),
            }
        })?;
        self.locks.insert(lock.id, lock);
        self.locked_balance = balance;
        Ok(())
    }

    /// Remove a lock and subtract its amount from the locked balance.
    ///
    /// Returns `Ok(None)` if the lock is not held by this wallet.
    ///
    /// # Errors
    /// Returns `BalanceUnderflow` if the balance is smaller than the lock
    /// amount. Nothing is removed in that case.
    pub fn remove(&mut self, lock_id: &LockId) -> Result<Option<Lock>> {
        let Some(amount) = self.locks.get(lock_id).map(|l| l.amount) else {
            return Ok(None);
        };
        if self.locked_balance < amount {
            let sender = self.locks[lock_id].sender.clone();
            return Err(HashlockError::BalanceUnderflow {
                sender,
                balance: self.locked_balance,
                amount,
            });
        }
        self.locked_balance -= amount;
        Ok(self.locks.remove(lock_id))
    }

    /// Sum of lock amounts, recomputed from the map.
    #[must_use]
    pub fn recomputed_balance(&self) -> Decimal {
        self.locks.values().map(|l| l.amount).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty() && self.locked_balance.is_zero()
    }
}

/// Corrupt attributes for invariant tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl WalletLockAttributes {
    pub fn force_locked_balance(&mut self, balance: Decimal) {
        self.locked_balance = balance;
    }
}

/// A wallet as seen by the lock engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub address: Address,
    /// Absent until the wallet sends its first lock.
    pub htlc: Option<WalletLockAttributes>,
}

impl Wallet {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            htlc: None,
        }
    }

    #[must_use]
    pub fn locked_balance(&self) -> Decimal {
        self.htlc
            .as_ref()
            .map_or(Decimal::ZERO, WalletLockAttributes::locked_balance)
    }

    /// Active locks sent by this wallet, in id order.
    pub fn locks(&self) -> impl Iterator<Item = &Lock> {
        self.htlc.iter().flat_map(|attrs| attrs.locks().values())
    }

    #[must_use]
    pub fn lock(&self, lock_id: &LockId) -> Option<&Lock> {
        self.htlc.as_ref().and_then(|attrs| attrs.get(lock_id))
    }

    /// Attributes for mutation, created on first use.
    pub fn htlc_mut(&mut self) -> &mut WalletLockAttributes {
        self.htlc.get_or_insert_with(WalletLockAttributes::new)
    }
}
