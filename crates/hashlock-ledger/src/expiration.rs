//! Expiration checks against the chain tip.
//!
//! Two clocks exist: the tip timestamp and the tip height. Each
//! [`Expiration`] variant reads exactly one of them, and both thresholds
//! are inclusive.

use hashlock_types::{ChainTip, Expiration};

/// Decides whether a lock's timelock has been reached.
pub struct ExpirationEvaluator;

impl ExpirationEvaluator {
    /// `true` once the tip has reached the expiration value.
    #[must_use]
    pub fn is_expired(expiration: &Expiration, tip: &ChainTip) -> bool {
        match *expiration {
            Expiration::EpochTimestamp(value) => tip.timestamp >= value,
            Expiration::BlockHeight(value) => tip.height >= value,
        }
    }

    /// Seconds (timestamp expiration) or blocks (height expiration) left
    /// before expiry. Zero once expired.
    #[must_use]
    pub fn remaining(expiration: &Expiration, tip: &ChainTip) -> u64 {
        match *expiration {
            Expiration::EpochTimestamp(value) => value.saturating_sub(tip.timestamp),
            Expiration::BlockHeight(value) => value.saturating_sub(tip.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip(height: u64, timestamp: u64) -> ChainTip {
        ChainTip { height, timestamp }
    }

    #[test]
    fn block_height_boundary_is_inclusive() {
        let exp = Expiration::BlockHeight(13);
        assert!(!ExpirationEvaluator::is_expired(&exp, &tip(12, 0)));
        assert!(ExpirationEvaluator::is_expired(&exp, &tip(13, 0)));
        assert!(ExpirationEvaluator::is_expired(&exp, &tip(14, 0)));
    }

    #[test]
    fn epoch_timestamp_boundary_is_inclusive() {
        let exp = Expiration::EpochTimestamp(1_000);
        assert!(!ExpirationEvaluator::is_expired(&exp, &tip(500, 999)));
        assert!(ExpirationEvaluator::is_expired(&exp, &tip(1, 1_000)));
    }

    #[test]
    fn clocks_do_not_mix() {
        // A huge height says nothing about a timestamp expiration, and the
        // other way around.
        let by_time = Expiration::EpochTimestamp(1_000);
        assert!(!ExpirationEvaluator::is_expired(&by_time, &tip(5_000, 10)));

        let by_height = Expiration::BlockHeight(50);
        assert!(!ExpirationEvaluator::is_expired(&by_height, &tip(10, 5_000)));
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let exp = Expiration::BlockHeight(13);
        assert_eq!(ExpirationEvaluator::remaining(&exp, &tip(4, 0)), 9);
        assert_eq!(ExpirationEvaluator::remaining(&exp, &tip(13, 0)), 0);
        assert_eq!(ExpirationEvaluator::remaining(&exp, &tip(20, 0)), 0);

        let exp = Expiration::EpochTimestamp(100);
        assert_eq!(ExpirationEvaluator::remaining(&exp, &tip(0, 1)), 99);
    }
}
