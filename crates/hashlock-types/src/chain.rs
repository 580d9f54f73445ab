//! Block and chain-tip types.
//!
//! The chain tip is the single clock for expiration decisions: nothing in
//! Hashlock reads wall-clock time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BlockId, HtlcTransaction};

/// Height and timestamp of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BlockStamp {
    pub height: u64,
    /// Seconds since the network epoch.
    pub timestamp: u64,
}

/// The last accepted block.
pub type ChainTip = BlockStamp;

impl BlockStamp {
    /// The chain before any block has been applied.
    #[must_use]
    pub fn genesis() -> Self {
        Self {
            height: 0,
            timestamp: 0,
        }
    }
}

/// Header fields of an accepted block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: BlockId,
    pub height: u64,
    pub timestamp: u64,
    pub reward: Decimal,
    pub total_fee: Decimal,
    pub total_amount: Decimal,
}

impl BlockHeader {
    #[must_use]
    pub fn stamp(&self) -> BlockStamp {
        BlockStamp {
            height: self.height,
            timestamp: self.timestamp,
        }
    }
}

/// A block as handed over by the block-application pipeline.
///
/// Only the HTLC transactions matter here; everything else in the block
/// has already been applied upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// In block order.
    pub transactions: Vec<HtlcTransaction>,
}

impl Block {
    /// Block at `height` with a deterministic id and no fees.
    #[must_use]
    pub fn new(height: u64, timestamp: u64, transactions: Vec<HtlcTransaction>) -> Self {
        Self {
            header: BlockHeader {
                id: BlockId::for_height(height),
                height,
                timestamp,
                reward: Decimal::ZERO,
                total_fee: Decimal::ZERO,
                total_amount: Decimal::ZERO,
            },
            transactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_stamp() {
        let block = Block::new(4, 32, Vec::new());
        assert_eq!(
            block.header.stamp(),
            BlockStamp {
                height: 4,
                timestamp: 32
            }
        );
        assert_eq!(block.header.id, BlockId::for_height(4));
    }

    #[test]
    fn stamps_order_by_height_first() {
        let a = BlockStamp {
            height: 1,
            timestamp: 100,
        };
        let b = BlockStamp {
            height: 2,
            timestamp: 50,
        };
        assert!(a < b);
        assert!(BlockStamp::genesis() < a);
    }
}
