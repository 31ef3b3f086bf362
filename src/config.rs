//! Cache configuration

use std::time::Duration;

/// Configuration for the two-tier cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held by the memory tier
    pub memory_max_capacity: u64,
    /// Memory-tier retention when a call gives no TTL override
    pub memory_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_max_capacity: 1000,
            memory_ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Per-call cache options
///
/// `ttl` overrides the retention of the entry written by this call; `None`
/// leaves each tier on its own default. The two flags select which tiers
/// are consulted and populated.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// TTL override for the entry written on a miss
    pub ttl: Option<Duration>,
    /// Consult and populate the remote tier
    pub use_remote: bool,
    /// Consult and populate the memory tier
    pub use_memory: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            use_remote: true,
            use_memory: true,
        }
    }
}

impl CacheOptions {
    /// Both tiers enabled with the given TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Remote tier only, with the given TTL
    ///
    /// Used for payloads too large to hold in process memory.
    pub fn remote_only(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            use_remote: true,
            use_memory: false,
        }
    }
}
