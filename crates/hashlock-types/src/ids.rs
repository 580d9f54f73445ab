//! Identifiers used throughout Hashlock.
//!
//! Transaction and block identifiers are 32-byte hashes rendered as
//! lowercase hex. A lock is identified by the id of the transaction
//! that created it, so [`LockId`] is an alias of [`TransactionId`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{HashlockError, Result};

fn decode_hash(kind: &str, s: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(s).map_err(|e| HashlockError::ValidationError {
        reason: format!("{kind} {s:?} is not valid hex: {e}"),
    })?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| HashlockError::ValidationError {
            reason: format!("{kind} must be 32 bytes, got {}", b.len()),
        })
}

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// Hash of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(pub [u8; 32]);

impl TransactionId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 4 bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Deterministic id derived from a label and a sequence number.
    ///
    /// Fixtures on different runs produce the same ids, which keeps
    /// ordering assertions stable.
    #[must_use]
    pub fn deterministic(label: &str, sequence: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"hashlock:tx_id:v1:");
        hasher.update(label.as_bytes());
        hasher.update(sequence.to_le_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for TransactionId {
    type Err = HashlockError;

    fn from_str(s: &str) -> Result<Self> {
        decode_hash("transaction id", s).map(Self)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = HashlockError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_string()
    }
}

/// A lock is named after the transaction that created it.
pub type LockId = TransactionId;

// ---------------------------------------------------------------------------
// BlockId
// ---------------------------------------------------------------------------

/// Hash of an accepted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(pub [u8; 32]);

impl BlockId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Deterministic block id for a given height.
    #[must_use]
    pub fn for_height(height: u64) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"hashlock:block_id:v1:");
        hasher.update(height.to_le_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for BlockId {
    type Err = HashlockError;

    fn from_str(s: &str) -> Result<Self> {
        decode_hash("block id", s).map(Self)
    }
}

impl TryFrom<String> for BlockId {
    type Error = HashlockError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Wallet address. Opaque to this crate; address encoding and checksum
/// validation belong to the transaction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Random identifiers for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl TransactionId {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl BlockId {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}
