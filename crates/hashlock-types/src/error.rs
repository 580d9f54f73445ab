//! Error types for the Hashlock lock engine.
//!
//! All errors use the `HL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Lock errors
//! - 2xx: Balance errors
//! - 3xx: Claim / commitment errors
//! - 4xx: Query errors
//! - 8xx: Safety errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, LockId};

/// Central error enum for all Hashlock operations.
#[derive(Debug, Error)]
pub enum HashlockError {
    // =================================================================
    // Lock Errors (1xx)
    // =================================================================
    /// Query path: no active lock with this id.
    #[error("HL_ERR_100: Lock not found: Lock {0} not found")]
    NotFound(String),

    /// A lock with this id already exists (active or settled).
    #[error("HL_ERR_101: Duplicate lock: {0}")]
    DuplicateLock(LockId),

    /// Resolve path: the lock is absent or was already resolved.
    #[error("HL_ERR_102: No active lock {0}")]
    LockNotFound(LockId),

    /// The lock transaction is malformed (bad amount, etc.).
    #[error("HL_ERR_103: Invalid lock: {reason}")]
    InvalidLock { reason: String },

    /// The lock's expiration has been reached; it can no longer be claimed.
    #[error("HL_ERR_104: Lock expired: {0}")]
    LockExpired(LockId),

    /// Refund attempted before the lock's expiration.
    #[error("HL_ERR_105: Lock not yet expired: {0}")]
    LockNotExpired(LockId),

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Resolving a lock would make the locked balance negative.
    #[error("HL_ERR_200: Locked balance underflow for {sender}: balance {balance}, releasing {amount}")]
    BalanceUnderflow {
        sender: Address,
        balance: Decimal,
        amount: Decimal,
    },

    /// Adding a lock would overflow the locked balance.
    #[error("HL_ERR_201: Locked balance overflow for {sender}")]
    BalanceOverflow { sender: Address },

    // =================================================================
    // Claim Errors (3xx)
    // =================================================================
    /// The claim preimage does not hash to the lock's commitment.
    #[error("HL_ERR_300: Invalid preimage for lock {0}")]
    InvalidPreimage(LockId),

    /// A secret hash could not be decoded.
    #[error("HL_ERR_301: Invalid secret hash: {reason}")]
    InvalidSecretHash { reason: String },

    // =================================================================
    // Query Errors (4xx)
    // =================================================================
    /// Malformed pagination or filter input.
    #[error("HL_ERR_400: Validation error: {reason}")]
    ValidationError { reason: String },

    // =================================================================
    // Safety Errors (8xx)
    // =================================================================
    /// Ledger invariant violated. Critical safety alert.
    #[error("HL_ERR_800: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// A fatal error halted the ledger; no further mutation is accepted.
    #[error("HL_ERR_801: Ledger halted: {reason}")]
    LedgerHalted { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("HL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("HL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (unknown expiration kind, missing handler, bad limits).
    #[error("HL_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl HashlockError {
    /// Whether this error rejects only the offending transaction.
    ///
    /// Everything else aborts the enclosing block application.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPreimage(_)
                | Self::InvalidLock { .. }
                | Self::LockExpired(_)
                | Self::LockNotExpired(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, HashlockError>;

impl From<serde_json::Error> for HashlockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_matches_query_contract() {
        let err = HashlockError::NotFound("non_existing_lock_id".into());
        let msg = format!("{err}");
        assert!(msg.starts_with("HL_ERR_100: Lock not found"), "Got: {msg}");
        assert!(msg.contains("Lock non_existing_lock_id not found"));
    }

    #[test]
    fn underflow_display_has_amounts() {
        let err = HashlockError::BalanceUnderflow {
            sender: Address::new("alice"),
            balance: Decimal::new(1, 0),
            amount: Decimal::new(5, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("HL_ERR_200"));
        assert!(msg.contains("alice"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn recoverable_classification() {
        let id = LockId::deterministic("lock", 0);
        assert!(HashlockError::InvalidPreimage(id).is_recoverable());
        assert!(HashlockError::LockExpired(id).is_recoverable());
        assert!(HashlockError::LockNotExpired(id).is_recoverable());
        assert!(!HashlockError::DuplicateLock(id).is_recoverable());
        assert!(!HashlockError::LockNotFound(id).is_recoverable());
        assert!(
            !HashlockError::InvariantViolation {
                reason: "x".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn all_errors_have_hl_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(HashlockError::DuplicateLock(LockId::deterministic("a", 1))),
            Box::new(HashlockError::ValidationError {
                reason: "limit".into(),
            }),
            Box::new(HashlockError::LedgerHalted {
                reason: "underflow".into(),
            }),
            Box::new(HashlockError::Configuration("kind 7".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("HL_ERR_"),
                "Error missing HL_ERR_ prefix: {msg}"
            );
        }
    }
}
