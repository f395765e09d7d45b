use crate::core::error::DispatchError;
use crate::core::signature::SPACER;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CACHE_CAPACITY: usize = 20;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 16;

/// Shell settings. Every field has a default, so partial JSON documents load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Provider name used for queued dispatch when a signature names none.
    pub spacer_name: String,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub max_delegation_depth: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            spacer_name: SPACER.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }
}

impl ShellConfig {
    pub fn from_json(json: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(json)
            .map_err(|e| DispatchError::Configuration(format!("invalid shell config: {e}")))
    }

    pub fn with_spacer_name(mut self, name: impl Into<String>) -> Self {
        self.spacer_name = name.into();
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
