//! parkcache - Two-tier caching library
//!
//! This library provides a generic two-tier caching strategy for park
//! catalog reads:
//! - Memory tier: in-process Moka cache (fastest)
//! - Remote tier: Redis cache (shared across instances)
//!
//! On a full miss the cache falls back to a caller-supplied fetch function
//! and writes the result back through both tiers.
//!
//! The cache supports:
//! - Per-call TTL overrides and tier selection
//! - Wildcard invalidation (client-side match in memory, pattern delete in Redis)
//! - Request coalescing for concurrent misses on the same key
//! - Generic value types, one payload type per cache instance

mod config;
mod error;
mod memory;
mod pattern;
mod remote;
#[cfg(test)]
mod test_util;
mod two_tier_cache;

pub mod attraction_cache;
pub mod park_cache;

pub use attraction_cache::{Attraction, AttractionCache, WaitTime, WaitTimeHistory, WaitTimeSample};
pub use config::{CacheConfig, CacheOptions};
pub use error::CacheError;
pub use memory::MemoryCache;
pub use park_cache::{ParkCache, ParkData, ParkHours};
pub use pattern::GlobPattern;
pub use remote::{RedisRemoteCache, RemoteCache};
pub use two_tier_cache::{Cacheable, TwoTierCache};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
