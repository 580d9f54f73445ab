//! # Lock: the hashed-timelock commitment
//!
//! A `Lock` holds `amount` of the sender's funds until either the
//! recipient reveals a preimage of `secret_hash` (claim) or the
//! `expiration` is reached and the sender takes the funds back (refund).
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  claim (preimage, before expiry)  ┌─────────┐
//!   │ ACTIVE ├──────────────────────────────────▶│ CLAIMED │
//!   └───┬────┘                                   └─────────┘
//!       │ refund (expiry reached)
//!       ▼
//!   ┌──────────┐
//!   │ REFUNDED │
//!   └──────────┘
//! ```
//!
//! Status is never stored on the lock. The ledger derives it from the
//! active index and the settlement history.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, BlockStamp, HashlockError, LockId, Result, constants};

// ---------------------------------------------------------------------------
// SecretHash
// ---------------------------------------------------------------------------

/// SHA-256 commitment to the claim secret. Immutable once the lock exists.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretHash(pub [u8; constants::SECRET_HASH_LEN]);

impl SecretHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::SECRET_HASH_LEN] {
        &self.0
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for SecretHash {
    type Err = HashlockError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| HashlockError::InvalidSecretHash {
            reason: format!("not valid hex: {e}"),
        })?;
        let len = bytes.len();
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| HashlockError::InvalidSecretHash {
                reason: format!(
                    "expected {} bytes, got {len}",
                    constants::SECRET_HASH_LEN
                ),
            })
    }
}

impl TryFrom<String> for SecretHash {
    type Error = HashlockError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<SecretHash> for String {
    fn from(hash: SecretHash) -> Self {
        hash.to_string()
    }
}

// ---------------------------------------------------------------------------
// Expiration
// ---------------------------------------------------------------------------

/// Discriminant of an [`Expiration`], usable as a search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ExpirationKind {
    EpochTimestamp,
    BlockHeight,
}

impl ExpirationKind {
    /// Wire tag used by lock transactions.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::EpochTimestamp => constants::EXPIRATION_KIND_EPOCH_TIMESTAMP,
            Self::BlockHeight => constants::EXPIRATION_KIND_BLOCK_HEIGHT,
        }
    }
}

impl TryFrom<u8> for ExpirationKind {
    type Error = HashlockError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            constants::EXPIRATION_KIND_EPOCH_TIMESTAMP => Ok(Self::EpochTimestamp),
            constants::EXPIRATION_KIND_BLOCK_HEIGHT => Ok(Self::BlockHeight),
            other => Err(HashlockError::Configuration(format!(
                "unrecognized expiration kind {other}"
            ))),
        }
    }
}

impl fmt::Display for ExpirationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EpochTimestamp => write!(f, "EPOCH_TIMESTAMP"),
            Self::BlockHeight => write!(f, "BLOCK_HEIGHT"),
        }
    }
}

/// When a lock becomes refundable.
///
/// Both thresholds are inclusive: a lock expires on the block whose
/// timestamp (or height) first reaches the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Expiration {
    /// Seconds since the network epoch.
    EpochTimestamp(u64),
    /// Block height.
    BlockHeight(u64),
}

impl Expiration {
    /// Build from the raw `(kind, value)` pair carried on the wire.
    ///
    /// # Errors
    /// Returns `Configuration` for an unrecognized kind tag.
    pub fn from_raw(kind: u8, value: u64) -> Result<Self> {
        Ok(match ExpirationKind::try_from(kind)? {
            ExpirationKind::EpochTimestamp => Self::EpochTimestamp(value),
            ExpirationKind::BlockHeight => Self::BlockHeight(value),
        })
    }

    #[must_use]
    pub fn kind(&self) -> ExpirationKind {
        match self {
            Self::EpochTimestamp(_) => ExpirationKind::EpochTimestamp,
            Self::BlockHeight(_) => ExpirationKind::BlockHeight,
        }
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        match *self {
            Self::EpochTimestamp(v) | Self::BlockHeight(v) => v,
        }
    }
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

// ---------------------------------------------------------------------------
// LockStatus
// ---------------------------------------------------------------------------

/// Derived lifecycle state of a lock.
///
/// Transitions are **monotonic**:
/// - `Active → Claimed` (valid preimage revealed)
/// - `Active → Refunded` (expiration reached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockStatus {
    Active,
    Claimed,
    Refunded,
}

impl LockStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Claimed | Self::Refunded))
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Claimed => write!(f, "CLAIMED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

/// Funds committed by `sender` to `recipient` under a hash and a timelock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Id of the lock transaction.
    pub id: LockId,
    pub sender: Address,
    pub recipient: Address,
    /// Integer amount; fractional values are rejected at creation.
    pub amount: Decimal,
    pub secret_hash: SecretHash,
    pub expiration: Expiration,
    /// Block that applied the lock transaction.
    pub created_at: BlockStamp,
    /// Index of the lock transaction within its block.
    pub position: u32,
    /// Optional memo carried by the lock transaction. Not interpreted.
    pub vendor_field: Option<String>,
}

impl Lock {
    /// Sort key for creation order: height, position in block, then id.
    #[must_use]
    pub fn creation_key(&self) -> (u64, u32, LockId) {
        (self.created_at.height, self.position, self.id)
    }

    /// Check amount shape: non-negative and integral.
    ///
    /// # Errors
    /// Returns `InvalidLock` describing the first problem found.
    pub fn validate_amount(amount: Decimal) -> Result<()> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(HashlockError::InvalidLock {
                reason: format!("amount {amount} is negative"),
            });
        }
        if amount.fract() != Decimal::ZERO {
            return Err(HashlockError::InvalidLock {
                reason: format!("amount {amount} is not an integer"),
            });
        }
        Ok(())
    }
}

/// Dummy lock for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Lock {
    pub fn dummy(sender: &str, amount: i64, expiration: Expiration, height: u64) -> Self {
        Self {
            id: LockId::random(),
            sender: Address::new(sender),
            recipient: Address::new("recipient"),
            amount: Decimal::new(amount, 0),
            secret_hash: SecretHash(rand::random::<[u8; 32]>()),
            expiration,
            created_at: BlockStamp {
                height,
                timestamp: height * 8,
            },
            position: 0,
            vendor_field: None,
        }
    }
}
