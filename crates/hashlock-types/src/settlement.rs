//! Settlement history types.
//!
//! When a lock leaves the active index it is recorded once, keyed by lock
//! id, with the transaction and block that settled it. History entries are
//! append-only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BlockId, Lock, LockId, LockStatus, TransactionId};

/// How a lock was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementType {
    Claimed,
    Refunded,
}

impl SettlementType {
    /// Lock status after this settlement.
    #[must_use]
    pub fn status(self) -> LockStatus {
        match self {
            Self::Claimed => LockStatus::Claimed,
            Self::Refunded => LockStatus::Refunded,
        }
    }
}

impl fmt::Display for SettlementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claimed => write!(f, "CLAIMED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Ledger-side record of a resolved lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    /// The lock as it was when it left the active index.
    pub lock: Lock,
    pub settlement_type: SettlementType,
    pub settling_transaction_id: TransactionId,
    pub block_id: BlockId,
    /// Height of the settling block.
    pub height: u64,
}

/// A claim or refund transaction as stored by the transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlingTransaction {
    pub id: TransactionId,
    pub lock_id: LockId,
    pub settlement_type: SettlementType,
    pub block_id: BlockId,
    pub height: u64,
}

/// Answer to "has this lock been resolved, and by what?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub lock_id: LockId,
    pub settlement_type: SettlementType,
    pub settling_transaction_id: TransactionId,
    pub block_id: BlockId,
}

impl From<&SettlingTransaction> for SettlementRecord {
    fn from(tx: &SettlingTransaction) -> Self {
        Self {
            lock_id: tx.lock_id,
            settlement_type: tx.settlement_type,
            settling_transaction_id: tx.id,
            block_id: tx.block_id,
        }
    }
}
