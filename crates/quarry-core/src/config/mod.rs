//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::errors::AccessError;

/// Configuration for the data-access engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// Path to the database file. None = private in-memory database.
    pub db_path: Option<String>,
    /// Busy timeout applied to every connection, in milliseconds.
    /// Default: 5000.
    pub busy_timeout_ms: Option<u64>,
    /// Default page size for page streams. Default: 100.
    pub page_size: Option<u64>,
    /// Query cache capacity in entries. None = unbounded; setting a capacity
    /// enables size-based eviction, which is an extension over the base
    /// hit/miss contract.
    pub cache_capacity: Option<u64>,
    /// Upper bound on concurrently running gather tasks.
    /// None = one thread per task.
    pub max_concurrent_fetches: Option<usize>,
}

impl AccessConfig {
    /// Returns the effective busy timeout, defaulting to 5000ms.
    pub fn effective_busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms.unwrap_or(5_000)
    }

    /// Returns the effective default page size, defaulting to 100.
    pub fn effective_page_size(&self) -> u64 {
        self.page_size.unwrap_or(100)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AccessError> {
        toml::from_str(text).map_err(|e| AccessError::InvalidArgument {
            message: format!("invalid config: {e}"),
        })
    }
}
