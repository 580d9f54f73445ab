//! # hashlock-query
//!
//! **Read Plane**: paginated lock listing, lookup and search, and the
//! `unlocked` settlement lookup.
//!
//! ## Architecture
//!
//! Queries never touch the live ledger. They run over a
//! [`LedgerSnapshot`](hashlock_ledger::LedgerSnapshot) taken from
//! [`ChainState`](hashlock_ledger::ChainState):
//! 1. **LockQueryService**: `index`, `show`, `search` over active locks
//! 2. **SettlementResolver**: `unlocked`, joining ledger settlement history
//!    with the node's [`TransactionHistory`]
//!
//! ## Operations
//!
//! | Operation | Input | Output |
//! |---|---|---|
//! | index | pagination | `Page<LockView>` |
//! | show | lock id | `LockView` or `NotFound` |
//! | search | [`SearchCriteria`] + pagination | `Page<LockView>` |
//! | unlocked | lock ids + pagination | `Page<SettlementRecord>` |

pub mod collaborators;
pub mod criteria;
pub mod lock_query;
pub mod settlement_resolver;
pub mod view;

pub use collaborators::{ChainTipProvider, StaticTip, TransactionHistory, TransactionLog};
pub use criteria::{Range, SearchCriteria};
pub use lock_query::LockQueryService;
pub use settlement_resolver::SettlementResolver;
pub use view::LockView;
