//! HTLC transaction shapes.
//!
//! Signatures, fees and nonces have been checked by the transaction
//! pipeline before a block reaches the lock ledger. These types carry only
//! what the lock lifecycle needs.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Expiration, LockId, SecretHash, TransactionId};

/// Creates a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTransaction {
    pub id: TransactionId,
    pub sender: Address,
    pub recipient: Address,
    pub amount: Decimal,
    pub secret_hash: SecretHash,
    pub expiration: Expiration,
    pub vendor_field: Option<String>,
}

/// Claims a lock by revealing the preimage of its secret hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTransaction {
    pub id: TransactionId,
    pub lock_id: LockId,
    pub unlock_secret: Vec<u8>,
}

/// Returns an expired lock's funds to its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTransaction {
    pub id: TransactionId,
    pub lock_id: LockId,
}

/// Which handler a transaction is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum TransactionKind {
    HtlcLock,
    HtlcClaim,
    HtlcRefund,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtlcLock => write!(f, "HTLC_LOCK"),
            Self::HtlcClaim => write!(f, "HTLC_CLAIM"),
            Self::HtlcRefund => write!(f, "HTLC_REFUND"),
        }
    }
}

/// Any transaction the lock ledger applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtlcTransaction {
    Lock(LockTransaction),
    Claim(ClaimTransaction),
    Refund(RefundTransaction),
}

impl HtlcTransaction {
    #[must_use]
    pub fn id(&self) -> TransactionId {
        match self {
            Self::Lock(tx) => tx.id,
            Self::Claim(tx) => tx.id,
            Self::Refund(tx) => tx.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Lock(_) => TransactionKind::HtlcLock,
            Self::Claim(_) => TransactionKind::HtlcClaim,
            Self::Refund(_) => TransactionKind::HtlcRefund,
        }
    }

    /// The lock a claim or refund settles. `None` for lock transactions.
    #[must_use]
    pub fn settled_lock(&self) -> Option<LockId> {
        match self {
            Self::Lock(_) => None,
            Self::Claim(tx) => Some(tx.lock_id),
            Self::Refund(tx) => Some(tx.lock_id),
        }
    }
}
