//! System-wide constants for the Hashlock lock engine.

/// Length in bytes of a secret hash (SHA-256 digest).
pub const SECRET_HASH_LEN: usize = 32;

/// Wire tag for an epoch-timestamp expiration.
pub const EXPIRATION_KIND_EPOCH_TIMESTAMP: u8 = 1;

/// Wire tag for a block-height expiration.
pub const EXPIRATION_KIND_BLOCK_HEIGHT: u8 = 2;

/// Default page size for lock queries.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Largest page size a query caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;
