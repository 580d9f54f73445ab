//! Search filters over active locks.
//!
//! All set fields must match. Ranges are inclusive at both ends; an open
//! end is unbounded.

use hashlock_ledger::ExpirationEvaluator;
use hashlock_types::{
    Address, ChainTip, ExpirationKind, HashlockError, Lock, LockId, Result, SecretHash,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inclusive `[from, to]` bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T> {
    pub from: Option<T>,
    pub to: Option<T>,
}

impl<T: PartialOrd + Copy + std::fmt::Display> Range<T> {
    #[must_use]
    pub fn between(from: T, to: T) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.from.is_none_or(|from| value >= from) && self.to.is_none_or(|to| value <= to)
    }

    fn validate(&self, field: &str) -> Result<()> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(HashlockError::ValidationError {
                reason: format!("{field}: from {from} is greater than to {to}"),
            }),
            _ => Ok(()),
        }
    }
}

/// Filter for [`LockQueryService::search`](crate::LockQueryService::search).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    #[serde(alias = "id")]
    pub lock_id: Option<LockId>,
    pub sender: Option<Address>,
    pub recipient: Option<Address>,
    pub secret_hash: Option<SecretHash>,
    pub expiration_kind: Option<ExpirationKind>,
    /// Expired as of the query tip.
    pub expired: Option<bool>,
    pub expiration_value: Option<Range<u64>>,
    pub amount: Option<Range<Decimal>>,
    /// Height of the block that created the lock.
    pub created_height: Option<Range<u64>>,
}

impl SearchCriteria {
    /// Criteria matching one lock id.
    #[must_use]
    pub fn by_id(lock_id: LockId) -> Self {
        Self {
            lock_id: Some(lock_id),
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns `ValidationError` for a range whose `from` exceeds its `to`.
    pub fn validate(&self) -> Result<()> {
        if let Some(r) = &self.expiration_value {
            r.validate("expirationValue")?;
        }
        if let Some(r) = &self.amount {
            r.validate("amount")?;
        }
        if let Some(r) = &self.created_height {
            r.validate("createdHeight")?;
        }
        Ok(())
    }

    #[must_use]
    pub fn matches(&self, lock: &Lock, tip: &ChainTip) -> bool {
        self.lock_id.is_none_or(|id| lock.id == id)
            && self.sender.as_ref().is_none_or(|s| &lock.sender == s)
            && self.recipient.as_ref().is_none_or(|r| &lock.recipient == r)
            && self.secret_hash.is_none_or(|h| lock.secret_hash == h)
            && self
                .expiration_kind
                .is_none_or(|k| lock.expiration.kind() == k)
            && self
                .expired
                .is_none_or(|e| ExpirationEvaluator::is_expired(&lock.expiration, tip) == e)
            && self
                .expiration_value
                .is_none_or(|r| r.contains(lock.expiration.value()))
            && self.amount.is_none_or(|r| r.contains(lock.amount))
            && self
                .created_height
                .is_none_or(|r| r.contains(lock.created_at.height))
    }
}
