//! Transaction handlers: the state transitions that mutate the lock ledger.
//!
//! Each HTLC transaction kind has one handler. Handlers are looked up in a
//! [`HandlerRegistry`] owned by whoever applies blocks. No handler table
//! is process-global: build a registry, pass it in, drop it when done.
//!
//! ## Rules
//!
//! All expiration checks read the tip *before* the block being applied.
//!
//! | Kind | Rejected when |
//! |---|---|
//! | lock | amount negative or fractional; expiration already reached |
//! | claim | lock not active; expiration reached; preimage mismatch |
//! | refund | lock not active; expiration not yet reached |

use std::collections::BTreeMap;

use hashlock_types::{
    Address, BlockHeader, ChainTip, HashlockError, HtlcTransaction, Lock, LockId, Result,
    SettlementType, SettlingTransaction, TransactionId, TransactionKind,
};

use crate::{
    expiration::ExpirationEvaluator,
    lock_ledger::{LockLedger, Resolution},
    preimage::PreimageValidator,
    wallet_directory::{WalletDirectory, WalletRepository},
};

/// Where in the chain a transaction is being applied.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// Block containing the transaction.
    pub block: &'a BlockHeader,
    /// Last accepted block before `block`. Expiration is judged against this.
    pub tip: ChainTip,
    /// Index of the transaction within `block`.
    pub position: u32,
}

/// Effect of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Locked(LockId),
    Settled(SettlingTransaction),
}

/// Applies one kind of HTLC transaction to the ledger.
pub trait TransactionHandler<W = WalletRepository>: Send + Sync {
    fn kind(&self) -> TransactionKind;

    /// # Errors
    /// Recoverable errors reject this transaction only; anything else
    /// aborts the block.
    fn apply(
        &self,
        ledger: &mut LockLedger<W>,
        tx: &HtlcTransaction,
        ctx: &TransitionContext<'_>,
    ) -> Result<Transition>;
}

fn wrong_kind(expected: TransactionKind, tx: &HtlcTransaction) -> HashlockError {
    HashlockError::Internal(format!(
        "{expected} handler received {} transaction {}",
        tx.kind(),
        tx.id()
    ))
}

/// The lock a claim or refund points at. Absent or settled is fatal.
fn active_lock<'l, W: WalletDirectory>(
    ledger: &'l LockLedger<W>,
    lock_id: &LockId,
) -> Result<&'l Lock> {
    ledger
        .get(lock_id)
        .map_err(|_| HashlockError::LockNotFound(*lock_id))
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

/// Creates locks.
pub struct LockHandler;

impl<W: WalletDirectory> TransactionHandler<W> for LockHandler {
    fn kind(&self) -> TransactionKind {
        TransactionKind::HtlcLock
    }

    fn apply(
        &self,
        ledger: &mut LockLedger<W>,
        tx: &HtlcTransaction,
        ctx: &TransitionContext<'_>,
    ) -> Result<Transition> {
        let HtlcTransaction::Lock(tx) = tx else {
            return Err(wrong_kind(TransactionKind::HtlcLock, tx));
        };

        Lock::validate_amount(tx.amount)?;
        if ExpirationEvaluator::is_expired(&tx.expiration, &ctx.tip) {
            return Err(HashlockError::LockExpired(tx.id));
        }

        let lock = Lock {
            id: tx.id,
            sender: tx.sender.clone(),
            recipient: tx.recipient.clone(),
            amount: tx.amount,
            secret_hash: tx.secret_hash,
            expiration: tx.expiration,
            created_at: ctx.block.stamp(),
            position: ctx.position,
            vendor_field: tx.vendor_field.clone(),
        };
        ledger.add_lock(&tx.sender, lock)?;
        Ok(Transition::Locked(tx.id))
    }
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// Settles a lock to its recipient on a valid preimage.
pub struct ClaimHandler;

impl<W: WalletDirectory> TransactionHandler<W> for ClaimHandler {
    fn kind(&self) -> TransactionKind {
        TransactionKind::HtlcClaim
    }

    fn apply(
        &self,
        ledger: &mut LockLedger<W>,
        tx: &HtlcTransaction,
        ctx: &TransitionContext<'_>,
    ) -> Result<Transition> {
        let HtlcTransaction::Claim(tx) = tx else {
            return Err(wrong_kind(TransactionKind::HtlcClaim, tx));
        };

        let lock = active_lock(ledger, &tx.lock_id)?;
        if ExpirationEvaluator::is_expired(&lock.expiration, &ctx.tip) {
            return Err(HashlockError::LockExpired(tx.lock_id));
        }
        PreimageValidator::check(tx.lock_id, &lock.secret_hash, &tx.unlock_secret)?;

        let sender = lock.sender.clone();
        settle(ledger, &sender, tx.lock_id, tx.id, SettlementType::Claimed, ctx)
    }
}

// ---------------------------------------------------------------------------
// Refund
// ---------------------------------------------------------------------------

/// Returns an expired lock to its sender.
pub struct RefundHandler;

impl<W: WalletDirectory> TransactionHandler<W> for RefundHandler {
    fn kind(&self) -> TransactionKind {
        TransactionKind::HtlcRefund
    }

    fn apply(
        &self,
        ledger: &mut LockLedger<W>,
        tx: &HtlcTransaction,
        ctx: &TransitionContext<'_>,
    ) -> Result<Transition> {
        let HtlcTransaction::Refund(tx) = tx else {
            return Err(wrong_kind(TransactionKind::HtlcRefund, tx));
        };

        let lock = active_lock(ledger, &tx.lock_id)?;
        if !ExpirationEvaluator::is_expired(&lock.expiration, &ctx.tip) {
            return Err(HashlockError::LockNotExpired(tx.lock_id));
        }

        let sender = lock.sender.clone();
        settle(ledger, &sender, tx.lock_id, tx.id, SettlementType::Refunded, ctx)
    }
}

fn settle<W: WalletDirectory>(
    ledger: &mut LockLedger<W>,
    sender: &Address,
    lock_id: LockId,
    tx_id: TransactionId,
    settlement_type: SettlementType,
    ctx: &TransitionContext<'_>,
) -> Result<Transition> {
    let resolution = Resolution {
        settlement_type,
        transaction_id: tx_id,
        block_id: ctx.block.id,
        height: ctx.block.height,
    };
    ledger.resolve_lock(sender, lock_id, resolution)?;
    Ok(Transition::Settled(SettlingTransaction {
        id: tx_id,
        lock_id,
        settlement_type,
        block_id: ctx.block.id,
        height: ctx.block.height,
    }))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps transaction kinds to their handlers.
pub struct HandlerRegistry<W = WalletRepository> {
    handlers: BTreeMap<TransactionKind, Box<dyn TransactionHandler<W>>>,
}

impl<W: WalletDirectory + 'static> HandlerRegistry<W> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// A registry with the lock, claim and refund handlers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut handlers: BTreeMap<TransactionKind, Box<dyn TransactionHandler<W>>> =
            BTreeMap::new();
        handlers.insert(TransactionKind::HtlcLock, Box::new(LockHandler));
        handlers.insert(TransactionKind::HtlcClaim, Box::new(ClaimHandler));
        handlers.insert(TransactionKind::HtlcRefund, Box::new(RefundHandler));
        Self { handlers }
    }

    /// # Errors
    /// Returns `Configuration` if a handler for this kind is already registered.
    pub fn register(&mut self, handler: Box<dyn TransactionHandler<W>>) -> Result<()> {
        let kind = handler.kind();
        if self.handlers.contains_key(&kind) {
            return Err(HashlockError::Configuration(format!(
                "handler for {kind} already registered"
            )));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// # Errors
    /// Returns `Configuration` if no handler for this kind is registered.
    pub fn deregister(&mut self, kind: TransactionKind) -> Result<Box<dyn TransactionHandler<W>>> {
        self.handlers
            .remove(&kind)
            .ok_or_else(|| HashlockError::Configuration(format!("no handler for {kind}")))
    }

    #[must_use]
    pub fn is_registered(&self, kind: TransactionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Dispatch `tx` to its handler.
    ///
    /// # Errors
    /// `Configuration` if no handler is registered, otherwise whatever the
    /// handler returns.
    pub fn apply(
        &self,
        ledger: &mut LockLedger<W>,
        tx: &HtlcTransaction,
        ctx: &TransitionContext<'_>,
    ) -> Result<Transition> {
        let kind = tx.kind();
        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| HashlockError::Configuration(format!("no handler for {kind}")))?;
        handler.apply(ledger, tx, ctx)
    }
}

impl<W: WalletDirectory + 'static> Default for HandlerRegistry<W> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use hashlock_types::{
        Address, Block, ClaimTransaction, Expiration, LockStatus, LockTransaction,
        RefundTransaction, TransactionId,
    };
    use rust_decimal::Decimal;

    use super::*;

    const SECRET: &[u8] = b"c-c-c-claim me if you can please";

    fn lock_tx(expiration: Expiration) -> LockTransaction {
        LockTransaction {
            id: TransactionId::random(),
            sender: Address::new("alice"),
            recipient: Address::new("bob"),
            amount: Decimal::new(10, 0),
            secret_hash: PreimageValidator::hash(SECRET),
            expiration,
            vendor_field: None,
        }
    }

    fn apply_at(
        registry: &HandlerRegistry,
        ledger: &mut LockLedger,
        tip_height: u64,
        tx: HtlcTransaction,
    ) -> Result<Transition> {
        let block = Block::new(tip_height + 1, (tip_height + 1) * 8, Vec::new());
        let ctx = TransitionContext {
            block: &block.header,
            tip: ChainTip {
                height: tip_height,
                timestamp: tip_height * 8,
            },
            position: 0,
        };
        registry.apply(ledger, &tx, &ctx)
    }

    fn locked(registry: &HandlerRegistry, ledger: &mut LockLedger, exp: Expiration) -> LockId {
        let tx = lock_tx(exp);
        let id = tx.id;
        let t = apply_at(registry, ledger, 4, HtlcTransaction::Lock(tx)).unwrap();
        assert_eq!(t, Transition::Locked(id));
        id
    }

    fn claim(lock_id: LockId, secret: &[u8]) -> HtlcTransaction {
        HtlcTransaction::Claim(ClaimTransaction {
            id: TransactionId::random(),
            lock_id,
            unlock_secret: secret.to_vec(),
        })
    }

    fn refund(lock_id: LockId) -> HtlcTransaction {
        HtlcTransaction::Refund(RefundTransaction {
            id: TransactionId::random(),
            lock_id,
        })
    }

    #[test]
    fn lock_records_block_position() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let id = locked(&registry, &mut ledger, Expiration::BlockHeight(13));
        let lock = ledger.get(&id).unwrap();
        assert_eq!(lock.created_at.height, 5);
        assert_eq!(lock.position, 0);
        assert_eq!(ledger.locked_balance(&Address::new("alice")), Decimal::new(10, 0));
    }

    #[test]
    fn lock_already_expired_is_rejected() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let tx = lock_tx(Expiration::BlockHeight(4));
        let err = apply_at(&registry, &mut ledger, 4, HtlcTransaction::Lock(tx)).unwrap_err();
        assert!(matches!(err, HashlockError::LockExpired(_)));
        assert!(err.is_recoverable());
        assert_eq!(ledger.active_count(), 0);
    }

    #[test]
    fn lock_with_fractional_amount_is_rejected() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let mut tx = lock_tx(Expiration::BlockHeight(13));
        tx.amount = Decimal::new(15, 1);
        let err = apply_at(&registry, &mut ledger, 4, HtlcTransaction::Lock(tx)).unwrap_err();
        assert!(matches!(err, HashlockError::InvalidLock { .. }));
    }

    #[test]
    fn claim_with_valid_preimage_settles() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let id = locked(&registry, &mut ledger, Expiration::BlockHeight(13));

        let t = apply_at(&registry, &mut ledger, 5, claim(id, SECRET)).unwrap();
        let Transition::Settled(settled) = t else {
            panic!("expected settlement, got {t:?}");
        };
        assert_eq!(settled.lock_id, id);
        assert_eq!(settled.settlement_type, SettlementType::Claimed);
        assert_eq!(settled.height, 6);
        assert_eq!(ledger.status(&id), Some(LockStatus::Claimed));
        assert_eq!(ledger.locked_balance(&Address::new("alice")), Decimal::ZERO);
    }

    #[test]
    fn claim_with_wrong_preimage_is_rejected() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let id = locked(&registry, &mut ledger, Expiration::BlockHeight(13));

        let mut wrong = SECRET.to_vec();
        wrong[0] ^= 0xff;
        let err = apply_at(&registry, &mut ledger, 5, claim(id, &wrong)).unwrap_err();
        assert!(matches!(err, HashlockError::InvalidPreimage(got) if got == id));
        assert_eq!(ledger.status(&id), Some(LockStatus::Active));
    }

    #[test]
    fn claim_at_expiry_height_is_rejected() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let id = locked(&registry, &mut ledger, Expiration::BlockHeight(13));

        // Tip 12: still claimable.
        let mut probe = ledger.clone();
        assert!(apply_at(&registry, &mut probe, 12, claim(id, SECRET)).is_ok());

        // Tip 13: expired.
        let err = apply_at(&registry, &mut ledger, 13, claim(id, SECRET)).unwrap_err();
        assert!(matches!(err, HashlockError::LockExpired(_)));
    }

    #[test]
    fn refund_requires_expiry() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let id = locked(&registry, &mut ledger, Expiration::BlockHeight(13));

        let err = apply_at(&registry, &mut ledger, 12, refund(id)).unwrap_err();
        assert!(matches!(err, HashlockError::LockNotExpired(_)));

        let t = apply_at(&registry, &mut ledger, 13, refund(id)).unwrap();
        assert!(matches!(
            t,
            Transition::Settled(SettlingTransaction {
                settlement_type: SettlementType::Refunded,
                ..
            })
        ));
        assert_eq!(ledger.status(&id), Some(LockStatus::Refunded));
    }

    #[test]
    fn refund_by_timestamp() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        // Tip timestamp at height h is h * 8.
        let id = locked(&registry, &mut ledger, Expiration::EpochTimestamp(80));
        assert!(apply_at(&registry, &mut ledger, 9, refund(id)).is_err());
        assert!(apply_at(&registry, &mut ledger, 10, refund(id)).is_ok());
    }

    #[test]
    fn settling_unknown_lock_is_fatal() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let err = apply_at(&registry, &mut ledger, 5, refund(LockId::random())).unwrap_err();
        assert!(matches!(err, HashlockError::LockNotFound(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn claim_after_refund_fails() {
        let registry = HandlerRegistry::with_defaults();
        let mut ledger = LockLedger::new();
        let id = locked(&registry, &mut ledger, Expiration::BlockHeight(13));
        apply_at(&registry, &mut ledger, 20, refund(id)).unwrap();
        let err = apply_at(&registry, &mut ledger, 21, claim(id, SECRET)).unwrap_err();
        assert!(matches!(err, HashlockError::LockNotFound(_)));
    }

    #[test]
    fn registry_register_and_deregister() {
        let mut registry: HandlerRegistry = HandlerRegistry::new();
        assert!(!registry.is_registered(TransactionKind::HtlcLock));
        registry.register(Box::new(LockHandler)).unwrap();
        assert!(registry.is_registered(TransactionKind::HtlcLock));

        let err = registry.register(Box::new(LockHandler)).unwrap_err();
        assert!(matches!(err, HashlockError::Configuration(_)));

        let removed = registry.deregister(TransactionKind::HtlcLock).unwrap();
        assert_eq!(
            TransactionHandler::<WalletRepository>::kind(removed.as_ref()),
            TransactionKind::HtlcLock
        );
        assert!(registry.deregister(TransactionKind::HtlcLock).is_err());
    }

    #[test]
    fn missing_handler_is_configuration_error() {
        let mut registry = HandlerRegistry::with_defaults();
        registry.deregister(TransactionKind::HtlcRefund).unwrap();
        let mut ledger = LockLedger::new();
        let err = apply_at(&registry, &mut ledger, 5, refund(LockId::random())).unwrap_err();
        assert!(matches!(err, HashlockError::Configuration(_)));
    }

    #[test]
    fn handler_rejects_foreign_kind() {
        let mut ledger = LockLedger::new();
        let block = Block::new(1, 8, Vec::new());
        let ctx = TransitionContext {
            block: &block.header,
            tip: ChainTip::genesis(),
            position: 0,
        };
        let err = ClaimHandler
            .apply(&mut ledger, &refund(LockId::random()), &ctx)
            .unwrap_err();
        assert!(matches!(err, HashlockError::Internal(_)));
    }
}
