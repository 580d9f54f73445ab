//! Claim secret verification.
//!
//! The commitment is `SHA-256(preimage)`. Comparison touches every byte
//! regardless of where the first difference is.

use hashlock_types::{HashlockError, LockId, Result, SecretHash};
use sha2::{Digest, Sha256};

/// Verifies claim secrets against lock commitments.
pub struct PreimageValidator;

impl PreimageValidator {
    /// Commitment for a secret.
    #[must_use]
    pub fn hash(preimage: &[u8]) -> SecretHash {
        SecretHash(Sha256::digest(preimage).into())
    }

    /// `true` iff `SHA-256(preimage)` equals `secret_hash` exactly.
    #[must_use]
    pub fn verify(secret_hash: &SecretHash, preimage: &[u8]) -> bool {
        let digest = Self::hash(preimage);
        constant_time_eq(digest.as_bytes(), secret_hash.as_bytes())
    }

    /// [`verify`](Self::verify) as a `Result` for the claim path.
    ///
    /// # Errors
    /// Returns `InvalidPreimage` on mismatch.
    pub fn check(lock_id: LockId, secret_hash: &SecretHash, preimage: &[u8]) -> Result<()> {
        if Self::verify(secret_hash, preimage) {
            Ok(())
        } else {
            Err(HashlockError::InvalidPreimage(lock_id))
        }
    }
}

#[inline]
fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
