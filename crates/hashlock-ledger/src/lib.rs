//! # hashlock-ledger
//!
//! **Write Plane**: HTLC lock state, the lock/claim/refund transitions, and
//! block application.
//!
//! ## Architecture
//!
//! A block handed over by the node flows through:
//! 1. **ChainState**: single writer; clones the published ledger
//! 2. **HandlerRegistry**: dispatches each transaction to its handler
//! 3. **ExpirationEvaluator / PreimageValidator**: the two checks handlers rely on
//! 4. **LockLedger**: owns wallet lock maps, locked balances and settlement history
//! 5. **LockAudit**: verifies ledger invariants before the new state is published
//!
//! ## Lock Lifecycle
//!
//! ```text
//!            claim (preimage ok, tip < expiration)
//!          ┌─────────────────────────────────────► CLAIMED
//! ACTIVE ──┤
//!          └─────────────────────────────────────► REFUNDED
//!            refund (tip >= expiration)
//! ```
//!
//! Both end states are terminal. A lock id is never reused.

pub mod audit;
pub mod chain_state;
pub mod expiration;
pub mod handlers;
pub mod lock_ledger;
pub mod preimage;
pub mod wallet_directory;

pub use audit::LockAudit;
pub use chain_state::{BlockOutcome, ChainState, LedgerSnapshot, RejectedTransaction};
pub use expiration::ExpirationEvaluator;
pub use handlers::{
    ClaimHandler, HandlerRegistry, LockHandler, RefundHandler, TransactionHandler, Transition,
    TransitionContext,
};
pub use lock_ledger::{LockLedger, Resolution};
pub use preimage::PreimageValidator;
pub use wallet_directory::{WalletDirectory, WalletRepository};
