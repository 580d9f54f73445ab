//! Block application and snapshot publication.
//!
//! ```text
//!            apply_block (single writer)
//!   published ──clone──► working ──handlers──► audit ──► published'
//!       ▲                    │
//!       │                    └── fatal error: discarded, published unchanged
//!   snapshot() (any number of readers, never blocked by the writer's work)
//! ```
//!
//! Readers take a [`LedgerSnapshot`]: an `Arc` of an immutable ledger plus
//! the tip it was built at. The writer holds the writer mutex for the whole
//! block and takes the publication lock only to swap the `Arc`.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hashlock_types::{
    Block, BlockId, ChainTip, HashlockError, Result, SettlingTransaction, TransactionId,
    TransactionKind,
};

use crate::{
    audit::LockAudit,
    handlers::{HandlerRegistry, Transition, TransitionContext},
    lock_ledger::LockLedger,
    wallet_directory::{WalletDirectory, WalletRepository},
};

/// Immutable view of the ledger at one chain tip.
#[derive(Debug)]
pub struct LedgerSnapshot<W = WalletRepository> {
    ledger: Arc<LockLedger<W>>,
    tip: ChainTip,
    version: u64,
}

impl<W> Clone for LedgerSnapshot<W> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            tip: self.tip,
            version: self.version,
        }
    }
}

impl<W> LedgerSnapshot<W> {
    #[must_use]
    pub fn ledger(&self) -> &LockLedger<W> {
        &self.ledger
    }

    /// Tip of the last block applied to this ledger.
    #[must_use]
    pub fn tip(&self) -> ChainTip {
        self.tip
    }

    /// Number of blocks published before this snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// A transaction the block kept but the ledger did not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedTransaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub reason: String,
}

/// What applying one block did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    pub block_id: BlockId,
    pub height: u64,
    /// In block order.
    pub accepted: Vec<Transition>,
    pub rejected: Vec<RejectedTransaction>,
}

impl BlockOutcome {
    /// Claims and refunds accepted in this block.
    pub fn settling_transactions(&self) -> impl Iterator<Item = &SettlingTransaction> {
        self.accepted.iter().filter_map(|t| match t {
            Transition::Settled(s) => Some(s),
            Transition::Locked(_) => None,
        })
    }
}

#[derive(Debug, Default)]
struct WriterState {
    halted: Option<String>,
}

/// Current ledger state, shared between one block writer and many readers.
#[derive(Debug)]
pub struct ChainState<W = WalletRepository> {
    published: RwLock<LedgerSnapshot<W>>,
    writer: Mutex<WriterState>,
}

impl ChainState<WalletRepository> {
    /// Empty ledger at genesis.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ledger(LockLedger::new(), ChainTip::genesis())
    }
}

impl Default for ChainState<WalletRepository> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WalletDirectory + Clone + 'static> ChainState<W> {
    /// Start from an existing ledger whose last applied block is `tip`.
    pub fn with_ledger(ledger: LockLedger<W>, tip: ChainTip) -> Self {
        let halted = ledger.halt_reason().map(str::to_owned);
        Self {
            published: RwLock::new(LedgerSnapshot {
                ledger: Arc::new(ledger),
                tip,
                version: 0,
            }),
            writer: Mutex::new(WriterState { halted }),
        }
    }

    /// The latest published ledger.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot<W> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn tip(&self) -> ChainTip {
        self.snapshot().tip
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halt_reason().is_some()
    }

    /// Why block application stopped, if it did.
    #[must_use]
    pub fn halt_reason(&self) -> Option<String> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .halted
            .clone()
    }

    /// Apply every HTLC transaction of `block` and publish the result.
    ///
    /// Recoverable handler errors reject the offending transaction and the
    /// block carries on. Any other error discards the whole block; if that
    /// error halted the ledger, later blocks are refused too.
    ///
    /// # Errors
    /// - `LedgerHalted` after a fatal error
    /// - `Configuration` if `block` does not extend the current tip, or a
    ///   transaction kind has no handler
    /// - `LockNotFound`, `BalanceUnderflow`, `InvariantViolation` and other
    ///   fatal handler errors
    pub fn apply_block(&self, registry: &HandlerRegistry<W>, block: &Block) -> Result<BlockOutcome> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(reason) = &writer.halted {
            return Err(HashlockError::LedgerHalted {
                reason: reason.clone(),
            });
        }

        let current = self.snapshot();
        let header = &block.header;
        if header.height != current.tip.height + 1 {
            return Err(HashlockError::Configuration(format!(
                "block {} at height {} does not extend tip {}",
                header.id.short(),
                header.height,
                current.tip.height
            )));
        }
        if header.timestamp < current.tip.timestamp {
            return Err(HashlockError::Configuration(format!(
                "block {} timestamp {} precedes tip timestamp {}",
                header.id.short(),
                header.timestamp,
                current.tip.timestamp
            )));
        }

        let mut working = LockLedger::clone(&current.ledger);
        let mut outcome = BlockOutcome {
            block_id: header.id,
            height: header.height,
            accepted: Vec::new(),
            rejected: Vec::new(),
        };

        for (position, tx) in block.transactions.iter().enumerate() {
            let position = u32::try_from(position).map_err(|_| {
                HashlockError::Internal(format!("block {} has too many transactions", header.id))
            })?;
            let ctx = TransitionContext {
                block: header,
                tip: current.tip,
                position,
            };
            match registry.apply(&mut working, tx, &ctx) {
                Ok(transition) => outcome.accepted.push(transition),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(
                        tx = %tx.id().short(),
                        kind = %tx.kind(),
                        height = header.height,
                        error = %err,
                        "HTLC transaction rejected"
                    );
                    outcome.rejected.push(RejectedTransaction {
                        id: tx.id(),
                        kind: tx.kind(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    if let Some(reason) = working.halt_reason() {
                        writer.halted = Some(reason.to_owned());
                    }
                    tracing::error!(
                        tx = %tx.id().short(),
                        kind = %tx.kind(),
                        height = header.height,
                        error = %err,
                        "Block discarded"
                    );
                    return Err(err);
                }
            }
        }

        if let Err(err) = LockAudit::verify(&working) {
            tracing::error!(height = header.height, error = %err, "Lock audit failed");
            writer.halted = Some(err.to_string());
            return Err(err);
        }

        let version = current.version + 1;
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = LedgerSnapshot {
            ledger: Arc::new(working),
            tip: header.stamp(),
            version,
        };

        tracing::info!(
            block = %header.id.short(),
            height = header.height,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            version,
            "Block applied"
        );
        Ok(outcome)
    }
}
