//! Wallet lookup used by the lock ledger.
//!
//! The wallet store itself belongs to the node's state layer. The ledger
//! only needs address lookup, get-or-create for mutation, and iteration
//! for the read side.

use std::collections::BTreeMap;

use hashlock_types::{Address, Wallet};

/// Read/write access to wallets by address.
pub trait WalletDirectory {
    fn by_address(&self, address: &Address) -> Option<&Wallet>;

    /// Wallet for mutation, created empty if unknown.
    fn by_address_mut(&mut self, address: &Address) -> &mut Wallet;

    /// All known wallets.
    fn wallets(&self) -> Box<dyn Iterator<Item = &Wallet> + '_>;
}

/// In-memory wallet directory, iterated in address order.
#[derive(Debug, Clone, Default)]
pub struct WalletRepository {
    wallets: BTreeMap<Address, Wallet>,
}

impl WalletRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wallets tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

impl WalletDirectory for WalletRepository {
    fn by_address(&self, address: &Address) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    fn by_address_mut(&mut self, address: &Address) -> &mut Wallet {
        self.wallets
            .entry(address.clone())
            .or_insert_with(|| Wallet::new(address.clone()))
    }

    fn wallets(&self) -> Box<dyn Iterator<Item = &Wallet> + '_> {
        Box::new(self.wallets.values())
    }
}
