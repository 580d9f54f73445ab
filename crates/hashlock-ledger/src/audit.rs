//! Lock ledger invariant checker.
//!
//! Invariants enforced after every committed block:
//! ```text
//! ∀ wallet: locked_balance == Σ amount(wallet.locks)
//! ∀ active lock: indexed exactly once, under its sender
//! active ∩ settled == ∅
//! ```
//!
//! A violation means the ledger state is corrupt, so the block that
//! produced it is never published.

use std::collections::HashSet;

use hashlock_types::{HashlockError, Result};
use rust_decimal::Decimal;

use crate::{lock_ledger::LockLedger, wallet_directory::WalletDirectory};

/// Stateless checker over a [`LockLedger`].
pub struct LockAudit;

impl LockAudit {
    /// # Errors
    /// Returns [`HashlockError::InvariantViolation`] describing the first
    /// broken invariant.
    pub fn verify<W: WalletDirectory>(ledger: &LockLedger<W>) -> Result<()> {
        let mut seen = HashSet::new();

        for wallet in ledger.wallets().wallets() {
            let sum: Decimal = wallet.locks().map(|l| l.amount).sum();
            if wallet.locked_balance() != sum {
                return Err(violation(format!(
                    "wallet {}: locked balance {} != sum of locks {sum}",
                    wallet.address,
                    wallet.locked_balance()
                )));
            }

            for lock in wallet.locks() {
                if lock.sender != wallet.address {
                    return Err(violation(format!(
                        "lock {} sent by {} is held by {}",
                        lock.id, lock.sender, wallet.address
                    )));
                }
                if ledger.active_sender(&lock.id) != Some(&wallet.address) {
                    return Err(violation(format!(
                        "lock {} is held by {} but not indexed for it",
                        lock.id, wallet.address
                    )));
                }
                if ledger.settlement(&lock.id).is_some() {
                    return Err(violation(format!(
                        "lock {} is both active and settled",
                        lock.id
                    )));
                }
                if !seen.insert(lock.id) {
                    return Err(violation(format!("lock {} held twice", lock.id)));
                }
            }
        }

        if seen.len() != ledger.active_count() {
            return Err(violation(format!(
                "{} locks indexed as active, {} held by wallets",
                ledger.active_count(),
                seen.len()
            )));
        }
        Ok(())
    }
}

fn violation(reason: String) -> HashlockError {
    HashlockError::InvariantViolation { reason }
}
