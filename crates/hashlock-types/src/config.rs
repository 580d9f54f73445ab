//! Configuration types for the lock engine.

use serde::{Deserialize, Serialize};

use crate::{HashlockError, Result, constants};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashlockConfig {
    pub query: QueryConfig,
    pub settlement: SettlementConfig,
}

impl HashlockConfig {
    /// Parse from JSON. Missing sections take their defaults.
    ///
    /// # Errors
    /// Returns `Configuration` for malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| HashlockError::Configuration(format!("invalid config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `Configuration` if the query limits are zero or inverted.
    pub fn validate(&self) -> Result<()> {
        let q = &self.query;
        if q.max_limit == 0 || q.default_limit == 0 {
            return Err(HashlockError::Configuration(
                "query limits must be >= 1".into(),
            ));
        }
        if q.default_limit > q.max_limit {
            return Err(HashlockError::Configuration(format!(
                "default_limit {} exceeds max_limit {}",
                q.default_limit, q.max_limit
            )));
        }
        Ok(())
    }
}

/// Limits applied to list queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size used when the caller does not give one.
    pub default_limit: u32,
    /// Largest page size accepted.
    pub max_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: constants::DEFAULT_PAGE_LIMIT,
            max_limit: constants::MAX_PAGE_LIMIT,
        }
    }
}

/// Which settled locks the `unlocked` lookup reports, relative to the tip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementVisibility {
    /// Settled at or below the tip height (the tip block included).
    #[default]
    IncludeTipBlock,
    /// Settled strictly below the tip height.
    StrictlyBeforeTip,
}

impl SettlementVisibility {
    #[must_use]
    pub fn is_visible(self, settled_height: u64, tip_height: u64) -> bool {
        match self {
            Self::IncludeTipBlock => settled_height <= tip_height,
            Self::StrictlyBeforeTip => settled_height < tip_height,
        }
    }
}

/// Settlement lookup configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub visibility: SettlementVisibility,
}
