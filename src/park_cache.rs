//! Park data cache
//!
//! Facade fixing the key namespace and retention for park-level catalog
//! reads, so route handlers never pass TTLs inline.
//!
//! ## Cache Keys
//!
//! - Park metadata: `park:{park_id}` (1 hour)
//! - Operating hours: `hours:{park_id}:{date}` (30 minutes)
//!
//! The key prefixes are shared with other consumers of the remote store
//! and must not change.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, CacheError, CacheOptions, RemoteCache, TwoTierCache};

/// Park metadata changes rarely
const PARK_DATA_TTL: Duration = Duration::from_secs(3600);
/// Operating hours change a few times a day
const PARK_HOURS_TTL: Duration = Duration::from_secs(1800);

fn park_key(park_id: &str) -> String {
    format!("park:{park_id}")
}

fn hours_key(park_id: &str, date: &str) -> String {
    format!("hours:{park_id}:{date}")
}

/// Park metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkData {
    /// Park ID (e.g. `mk`)
    pub id: String,
    /// Display name
    pub name: String,
    /// IANA timezone of the park
    pub timezone: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Operating hours for one park on one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkHours {
    pub park_id: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Opening time, `HH:MM` park-local
    pub opens_at: String,
    /// Closing time, `HH:MM` park-local
    pub closes_at: String,
    /// Whether resort guests get early entry on this date
    #[serde(default)]
    pub early_entry: bool,
}

/// Two-tier cache for park metadata and operating hours
pub struct ParkCache {
    data: TwoTierCache<ParkData>,
    hours: TwoTierCache<ParkHours>,
}

impl Clone for ParkCache {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            hours: self.hours.clone(),
        }
    }
}

impl ParkCache {
    /// Create a new ParkCache over the given remote tier
    pub fn new(remote: Arc<dyn RemoteCache>, config: &CacheConfig) -> Self {
        Self {
            data: TwoTierCache::new(Arc::clone(&remote), config),
            hours: TwoTierCache::new(remote, config),
        }
    }

    /// Get park metadata, falling back to `fetch` on a miss
    pub async fn get_park_data<F, Fut>(
        &self,
        park_id: &str,
        fetch: F,
    ) -> Result<Arc<ParkData>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ParkData, Box<dyn std::error::Error + Send + Sync>>>,
    {
        self.data
            .get(
                &park_key(park_id),
                fetch,
                CacheOptions::with_ttl(PARK_DATA_TTL),
            )
            .await
    }

    /// Get operating hours for a park on a date, falling back to `fetch`
    pub async fn get_park_hours<F, Fut>(
        &self,
        park_id: &str,
        date: &str,
        fetch: F,
    ) -> Result<Arc<ParkHours>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ParkHours, Box<dyn std::error::Error + Send + Sync>>>,
    {
        self.hours
            .get(
                &hours_key(park_id, date),
                fetch,
                CacheOptions::with_ttl(PARK_HOURS_TTL),
            )
            .await
    }

    /// Drop everything cached for a park: metadata and all dated hours
    pub async fn invalidate_park(&self, park_id: &str) -> Result<(), CacheError> {
        self.data
            .invalidate_pattern(&format!("park:{park_id}*"))
            .await?;
        self.hours
            .invalidate_pattern(&format!("hours:{park_id}*"))
            .await
    }
}
