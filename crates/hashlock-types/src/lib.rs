//! # hashlock-types
//!
//! Shared types, errors, and configuration for the **Hashlock** HTLC lock
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`TransactionId`], [`LockId`], [`BlockId`], [`Address`]
//! - **Lock model**: [`Lock`], [`SecretHash`], [`Expiration`], [`ExpirationKind`], [`LockStatus`]
//! - **Wallet model**: [`Wallet`], [`WalletLockAttributes`]
//! - **Chain model**: [`BlockStamp`], [`ChainTip`], [`BlockHeader`], [`Block`]
//! - **Transactions**: [`HtlcTransaction`], [`LockTransaction`], [`ClaimTransaction`], [`RefundTransaction`]
//! - **Settlement**: [`SettlementType`], [`SettlementEntry`], [`SettlingTransaction`], [`SettlementRecord`]
//! - **Pagination**: [`Pagination`], [`Page`], [`PageMeta`]
//! - **Configuration**: [`HashlockConfig`], [`QueryConfig`], [`SettlementConfig`]
//! - **Errors**: [`HashlockError`] with `HL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod lock;
pub mod pagination;
pub mod settlement;
pub mod transaction;
pub mod wallet;

pub use chain::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use lock::*;
pub use pagination::*;
pub use settlement::*;
pub use transaction::*;
pub use wallet::*;

// Constants are accessed via `hashlock_types::constants::FOO`
// (not re-exported to avoid name collisions).
