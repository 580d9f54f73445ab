//! Lock resource as returned by list and show queries.

use hashlock_ledger::ExpirationEvaluator;
use hashlock_types::{Address, BlockStamp, ChainTip, Expiration, Lock, LockId, SecretHash};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An active lock, with its expiry judged against the query tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockView {
    pub lock_id: LockId,
    pub sender: Address,
    pub recipient: Address,
    pub amount: Decimal,
    pub secret_hash: SecretHash,
    pub expiration: Expiration,
    /// Block that created the lock.
    pub created_at: BlockStamp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vendor_field: Option<String>,
    pub is_expired: bool,
}

impl LockView {
    #[must_use]
    pub fn new(lock: &Lock, tip: &ChainTip) -> Self {
        Self {
            lock_id: lock.id,
            sender: lock.sender.clone(),
            recipient: lock.recipient.clone(),
            amount: lock.amount,
            secret_hash: lock.secret_hash,
            expiration: lock.expiration,
            created_at: lock.created_at,
            vendor_field: lock.vendor_field.clone(),
            is_expired: ExpirationEvaluator::is_expired(&lock.expiration, tip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_against_tip() {
        let lock = Lock::dummy("alice", 1, Expiration::BlockHeight(13), 4);
        let at = |height| ChainTip {
            height,
            timestamp: height * 8,
        };
        assert!(!LockView::new(&lock, &at(12)).is_expired);
        assert!(LockView::new(&lock, &at(13)).is_expired);
    }

    #[test]
    fn serializes_camel_case_with_lock_id() {
        let lock = Lock::dummy("alice", 1, Expiration::BlockHeight(13), 4);
        let view = LockView::new(&lock, &ChainTip::genesis());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["lockId"], serde_json::json!(lock.id.to_string()));
        assert_eq!(json["isExpired"], serde_json::json!(false));
        assert_eq!(json["createdAt"]["height"], serde_json::json!(4));
        assert!(json.get("vendorField").is_none());
    }
}
