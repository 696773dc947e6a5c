//! Batch-delete configuration.

use std::env;

/// Tuning knobs for the query side of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteConfig {
    /// Query `Limit` per page. `None` lets the store size pages.
    pub page_limit: Option<i32>,
    /// Query `ConsistentRead`. `None` uses the store default.
    pub consistent_read: Option<bool>,
}

impl BatchDeleteConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `BATCH_DELETE_PAGE_LIMIT` and `BATCH_DELETE_CONSISTENT_READ`.
    /// Unset or unparsable values fall back to `None`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            page_limit: env_parse("BATCH_DELETE_PAGE_LIMIT").filter(|limit| *limit > 0),
            consistent_read: env_bool("BATCH_DELETE_CONSISTENT_READ"),
        }
    }
}

fn env_parse(key: &str) -> Option<i32> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES"))
}
