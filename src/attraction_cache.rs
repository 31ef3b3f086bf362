//! Attraction data cache
//!
//! Facade fixing the key namespace and retention for attraction-level
//! catalog reads: descriptions, live wait times, and daily wait-time
//! history.
//!
//! ## Cache Keys
//!
//! - Attraction metadata: `attraction:{id}` (1 hour)
//! - Live wait time: `waittime:{id}` (5 minutes)
//! - Wait-time history: `history:{id}:{date}` (1 day, remote tier only)
//!
//! History payloads are full-day sample arrays; they are deliberately kept
//! out of the memory tier so process memory stays bounded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, CacheError, CacheOptions, RemoteCache, TwoTierCache};

/// Attraction descriptions change rarely
const ATTRACTION_TTL: Duration = Duration::from_secs(3600);
/// Wait times are highly volatile
const WAIT_TIME_TTL: Duration = Duration::from_secs(300);
/// Daily aggregates are expensive to recompute and safe to hold a full day
const HISTORY_TTL: Duration = Duration::from_secs(86400);

fn attraction_key(id: &str) -> String {
    format!("attraction:{id}")
}

fn wait_time_key(id: &str) -> String {
    format!("waittime:{id}")
}

fn history_key(id: &str, date: &str) -> String {
    format!("history:{id}:{date}")
}

/// Attraction metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attraction {
    /// Attraction ID
    pub id: String,
    /// Park the attraction belongs to
    pub park_id: String,
    /// Display name
    pub name: String,
    /// Themed land within the park
    #[serde(default)]
    pub land: Option<String>,
    /// Minimum rider height, if any
    #[serde(default)]
    pub height_requirement_cm: Option<u32>,
    /// Whether a single-rider line is offered
    #[serde(default)]
    pub single_rider: bool,
}

/// Live wait time for one attraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitTime {
    pub attraction_id: String,
    /// Posted wait in minutes; `None` while the attraction is down
    pub minutes: Option<u32>,
    /// Whether the attraction is currently operating
    pub operating: bool,
    /// Unix timestamp of the sample
    pub sampled_at: u64,
}

impl WaitTime {
    /// A posted wait of five minutes or less
    pub fn is_walk_on(&self) -> bool {
        self.operating && self.minutes.is_some_and(|m| m <= 5)
    }
}

/// One point in a day's wait-time history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitTimeSample {
    /// Unix timestamp of the sample
    pub sampled_at: u64,
    /// Posted wait in minutes
    pub minutes: u32,
}

/// A full day of wait-time samples for one attraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitTimeHistory {
    pub attraction_id: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub samples: Vec<WaitTimeSample>,
}

impl WaitTimeHistory {
    /// Mean posted wait over the day, `None` for an empty day
    pub fn average_minutes(&self) -> Option<u32> {
        if self.samples.is_empty() {
            return None;
        }
        let total: u64 = self.samples.iter().map(|s| u64::from(s.minutes)).sum();
        Some((total / self.samples.len() as u64) as u32)
    }

    /// The sample with the longest posted wait
    pub fn peak(&self) -> Option<&WaitTimeSample> {
        self.samples.iter().max_by_key(|s| s.minutes)
    }
}

/// Two-tier cache for attraction metadata, wait times, and history
pub struct AttractionCache {
    attractions: TwoTierCache<Attraction>,
    wait_times: TwoTierCache<WaitTime>,
    history: TwoTierCache<WaitTimeHistory>,
}

impl Clone for AttractionCache {
    fn clone(&self) -> Self {
        Self {
            attractions: self.attractions.clone(),
            wait_times: self.wait_times.clone(),
            history: self.history.clone(),
        }
    }
}

impl AttractionCache {
    /// Create a new AttractionCache over the given remote tier
    pub fn new(remote: Arc<dyn RemoteCache>, config: &CacheConfig) -> Self {
        Self {
            attractions: TwoTierCache::new(Arc::clone(&remote), config),
            wait_times: TwoTierCache::new(Arc::clone(&remote), config),
            history: TwoTierCache::new(remote, config),
        }
    }

    /// Get attraction metadata, falling back to `fetch` on a miss
    pub async fn get_attraction<F, Fut>(
        &self,
        id: &str,
        fetch: F,
    ) -> Result<Arc<Attraction>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Attraction, Box<dyn std::error::Error + Send + Sync>>>,
    {
        self.attractions
            .get(
                &attraction_key(id),
                fetch,
                CacheOptions::with_ttl(ATTRACTION_TTL),
            )
            .await
    }

    /// Get the live wait time for an attraction, falling back to `fetch`
    pub async fn get_wait_time<F, Fut>(
        &self,
        id: &str,
        fetch: F,
    ) -> Result<Arc<WaitTime>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WaitTime, Box<dyn std::error::Error + Send + Sync>>>,
    {
        self.wait_times
            .get(
                &wait_time_key(id),
                fetch,
                CacheOptions::with_ttl(WAIT_TIME_TTL),
            )
            .await
    }

    /// Get a day of wait-time history, falling back to `fetch`
    ///
    /// History entries bypass the memory tier; they are served from the
    /// remote tier on every hit.
    pub async fn get_wait_time_history<F, Fut>(
        &self,
        id: &str,
        date: &str,
        fetch: F,
    ) -> Result<Arc<WaitTimeHistory>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WaitTimeHistory, Box<dyn std::error::Error + Send + Sync>>>,
    {
        self.history
            .get(
                &history_key(id, date),
                fetch,
                CacheOptions::remote_only(HISTORY_TTL),
            )
            .await
    }

    /// Drop every cached live wait time
    pub async fn invalidate_wait_times(&self) -> Result<(), CacheError> {
        self.wait_times.invalidate_pattern("waittime:*").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockRemote;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_wait_time(minutes: u32) -> WaitTime {
        WaitTime {
            attraction_id: "space-mountain".to_owned(),
            minutes: Some(minutes),
            operating: true,
            sampled_at: 1_754_300_000,
        }
    }

    fn sample_history() -> WaitTimeHistory {
        WaitTimeHistory {
            attraction_id: "space-mountain".to_owned(),
            date: "2026-08-04".to_owned(),
            samples: vec![
                WaitTimeSample {
                    sampled_at: 1_754_300_000,
                    minutes: 30,
                },
                WaitTimeSample {
                    sampled_at: 1_754_303_600,
                    minutes: 70,
                },
            ],
        }
    }

    fn new_cache(remote: &Arc<MockRemote>) -> AttractionCache {
        AttractionCache::new(
            Arc::clone(remote) as Arc<dyn RemoteCache>,
            &CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_wait_time_key_and_ttl() {
        let remote = Arc::new(MockRemote::default());
        let cache = new_cache(&remote);

        let value = cache
            .get_wait_time("space-mountain", || async { Ok(sample_wait_time(30)) })
            .await
            .unwrap();
        assert_eq!(value.minutes, Some(30));

        let set_calls = remote.set_calls.lock().unwrap().clone();
        assert_eq!(set_calls[0].0, "waittime:space-mountain");
        assert_eq!(set_calls[0].2, Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn test_attraction_key_and_ttl() {
        let remote = Arc::new(MockRemote::default());
        let cache = new_cache(&remote);

        cache
            .get_attraction("space-mountain", || async {
                Ok(Attraction {
                    id: "space-mountain".to_owned(),
                    park_id: "mk".to_owned(),
                    name: "Space Mountain".to_owned(),
                    land: Some("Tomorrowland".to_owned()),
                    height_requirement_cm: Some(112),
                    single_rider: false,
                })
            })
            .await
            .unwrap();

        let set_calls = remote.set_calls.lock().unwrap().clone();
        assert_eq!(set_calls[0].0, "attraction:space-mountain");
        assert_eq!(set_calls[0].2, Some(Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_history_never_populates_memory_tier() {
        let remote = Arc::new(MockRemote::default());
        let cache = new_cache(&remote);
        let fetched = Arc::new(AtomicUsize::new(0));

        let fetch = |count: Arc<AtomicUsize>| {
            move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(sample_history())
            }
        };

        cache
            .get_wait_time_history("space-mountain", "2026-08-04", fetch(Arc::clone(&fetched)))
            .await
            .unwrap();

        let set_calls = remote.set_calls.lock().unwrap().clone();
        assert_eq!(set_calls[0].0, "history:space-mountain:2026-08-04");
        assert_eq!(set_calls[0].2, Some(Duration::from_secs(86400)));

        // Served from the remote tier, not from memory
        cache
            .get_wait_time_history("space-mountain", "2026-08-04", fetch(Arc::clone(&fetched)))
            .await
            .unwrap();
        assert_eq!(fetched.load(Ordering::SeqCst), 1);
        assert_eq!(remote.get_calls.lock().unwrap().len(), 2);

        // With the remote entry gone there is no memory copy to fall back on
        remote.store.lock().unwrap().clear();
        cache
            .get_wait_time_history("space-mountain", "2026-08-04", fetch(Arc::clone(&fetched)))
            .await
            .unwrap();
        assert_eq!(fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_wait_times_triggers_refetch() {
        let remote = Arc::new(MockRemote::default());
        let cache = new_cache(&remote);
        let fetched = Arc::new(AtomicUsize::new(0));

        let fetch = |count: Arc<AtomicUsize>, minutes: u32| {
            move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Box<dyn std::error::Error + Send + Sync>>(sample_wait_time(minutes))
            }
        };

        cache
            .get_wait_time("space-mountain", fetch(Arc::clone(&fetched), 30))
            .await
            .unwrap();

        cache.invalidate_wait_times().await.unwrap();
        assert_eq!(
            remote.pattern_deletes.lock().unwrap().clone(),
            vec!["waittime:*".to_owned()]
        );

        let value = cache
            .get_wait_time("space-mountain", fetch(Arc::clone(&fetched), 45))
            .await
            .unwrap();
        assert_eq!(value.minutes, Some(45));
        assert_eq!(fetched.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_history_helpers() {
        let history = sample_history();

        assert_eq!(history.average_minutes(), Some(50));
        assert_eq!(history.peak().map(|s| s.minutes), Some(70));

        let empty = WaitTimeHistory {
            attraction_id: "x".to_owned(),
            date: "2026-08-04".to_owned(),
            samples: Vec::new(),
        };
        assert_eq!(empty.average_minutes(), None);
        assert!(empty.peak().is_none());
    }

    #[test]
    fn test_walk_on() {
        assert!(sample_wait_time(5).is_walk_on());
        assert!(!sample_wait_time(30).is_walk_on());

        let down = WaitTime {
            operating: false,
            minutes: None,
            ..sample_wait_time(0)
        };
        assert!(!down.is_walk_on());
    }
}
