//! Generic two-tier cache coordinator
//!
//! Lookup order is memory tier, then remote tier, then the caller-supplied
//! fetch function; results are written back through both enabled tiers on
//! the way out. Per-call [`CacheOptions`] select the tiers and override the
//! entry TTL, so domain facades can pin retention per key family.
//!
//! Tier access is best-effort: a failing remote tier is logged and treated
//! as a miss, never surfaced to the caller. Only fetch and serialization
//! failures propagate, and a failed fetch writes nothing.
//!
//! Concurrent misses on the same key are coalesced onto a single fetch via
//! an in-flight map of watch channels.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{RwLock, watch};
use tracing::{debug, warn};

use crate::memory::MemoryCache;
use crate::pattern::GlobPattern;
use crate::remote::RemoteCache;
use crate::{CacheConfig, CacheError, CacheOptions};

/// Trait for types that can be cached
pub trait Cacheable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
impl<T> Cacheable for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// Represents an in-flight fetch that other requests can wait on
type InFlightResult<V> = Option<Result<Arc<V>, String>>;
type InFlightRx<V> = watch::Receiver<InFlightResult<V>>;
type InFlightTx<V> = watch::Sender<InFlightResult<V>>;
type InFlightMap<V> = Arc<RwLock<HashMap<String, InFlightRx<V>>>>;

/// Guard that ensures in-flight entries are cleaned up even on panic/cancel.
///
/// When dropped, removes the key from the in-flight map and notifies
/// waiters with an error if no result was sent.
struct InFlightGuard<V: Cacheable> {
    key: String,
    in_flight: InFlightMap<V>,
    tx: Option<InFlightTx<V>>,
}

impl<V: Cacheable> InFlightGuard<V> {
    fn new(key: String, in_flight: InFlightMap<V>, tx: InFlightTx<V>) -> Self {
        Self {
            key,
            in_flight,
            tx: Some(tx),
        }
    }

    /// Complete the fetch with a result, consuming the guard.
    fn complete(mut self, result: Result<Arc<V>, String>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(result));
        }
    }
}

impl<V: Cacheable> Drop for InFlightGuard<V> {
    fn drop(&mut self) {
        // If tx is still Some, we're being dropped without calling
        // complete(): a panic or cancellation occurred
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(Err("Fetch was cancelled or panicked".to_owned())));
        }

        // Clean up the in-flight entry without blocking in drop
        let key = std::mem::take(&mut self.key);
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            in_flight.write().await.remove(&key);
        });
    }
}

/// Wait until the executing task publishes its result
async fn wait_for_result<V: Cacheable>(mut rx: InFlightRx<V>) -> Result<Arc<V>, CacheError> {
    loop {
        let current = rx.borrow().clone();
        if let Some(result) = current {
            return match result {
                Ok(value) => Ok(value),
                Err(e) => Err(CacheError::Fetch(e.into())),
            };
        }
        if rx.changed().await.is_err() {
            // Sender dropped without sending - treat as error
            return Err(CacheError::Fetch("In-flight fetch was cancelled".into()));
        }
    }
}

/// Generic two-tier cache
///
/// One instance carries one payload type; facades hold an instance per key
/// family and share the remote tier behind an `Arc`.
pub struct TwoTierCache<V: Cacheable> {
    memory: MemoryCache<V>,
    remote: Arc<dyn RemoteCache>,
    in_flight: InFlightMap<V>,
}

impl<V: Cacheable> Clone for TwoTierCache<V> {
    fn clone(&self) -> Self {
        Self {
            memory: self.memory.clone(),
            remote: Arc::clone(&self.remote),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<V: Cacheable> TwoTierCache<V> {
    /// Create a new two-tier cache over the given remote tier
    pub fn new(remote: Arc<dyn RemoteCache>, config: &CacheConfig) -> Self {
        Self {
            memory: MemoryCache::new(config.memory_max_capacity, config.memory_ttl),
            remote,
            in_flight: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get a value by key, falling back to `fetch` on a full miss
    ///
    /// `fetch` is invoked at most once per call; on success its result is
    /// written to the remote tier (with the per-call TTL) and the memory
    /// tier before being returned. A failed fetch propagates unchanged and
    /// writes nothing.
    pub async fn get<F, Fut>(
        &self,
        key: &str,
        fetch: F,
        options: CacheOptions,
    ) -> Result<Arc<V>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Box<dyn std::error::Error + Send + Sync>>>,
    {
        if options.use_memory {
            if let Some(value) = self.memory.get(key).await {
                debug!("Memory tier hit for key: {}", key);
                return Ok(value);
            }
            debug!("Memory tier miss for key: {}", key);
        }

        if options.use_remote {
            match self.remote.get(key).await {
                Ok(Some(json)) => match serde_json::from_str::<V>(&json) {
                    Ok(value) => {
                        debug!("Remote tier hit for key: {}", key);
                        let value = Arc::new(value);
                        if options.use_memory {
                            self.memory
                                .insert(key, Arc::clone(&value), options.ttl)
                                .await;
                        }
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!(
                            "Failed to deserialize remote entry for key {}: {}. Deleting corrupt entry.",
                            key, e
                        );
                        if let Err(del_err) = self.remote.delete(key).await {
                            warn!(
                                "Failed to delete corrupt remote entry for key {}: {}",
                                key, del_err
                            );
                        }
                    }
                },
                Ok(None) => {
                    debug!("Remote tier miss for key: {}", key);
                }
                Err(e) => {
                    warn!(
                        "Remote tier GET error for key {} ({}). Falling back to fetch.",
                        key, e
                    );
                }
            }
        }

        // Check if there's already an in-flight fetch for this key
        {
            let in_flight = self.in_flight.read().await;
            if let Some(rx) = in_flight.get(key) {
                let rx = rx.clone();
                drop(in_flight);

                debug!("Waiting for in-flight fetch for key: {}", key);
                return wait_for_result(rx).await;
            }
        }

        // No in-flight fetch, start one
        let (tx, rx) = watch::channel(None);
        let guard = {
            let mut in_flight = self.in_flight.write().await;
            // Double-check: another task might have started a fetch while
            // we waited for the write lock
            if let Some(existing) = in_flight.get(key) {
                let rx = existing.clone();
                drop(in_flight);

                debug!("Waiting for in-flight fetch for key (race): {}", key);
                return wait_for_result(rx).await;
            }
            in_flight.insert(key.to_owned(), rx);
            InFlightGuard::new(key.to_owned(), Arc::clone(&self.in_flight), tx)
        };

        // The guard ensures cleanup happens even on panic/cancellation
        let result = match fetch().await {
            Ok(value) => {
                debug!("Cache miss - fetched value for key: {}", key);
                self.fill(key, value, &options).await
            }
            Err(e) => Err(CacheError::Fetch(e)),
        };

        // Notify waiters and clean up the in-flight entry
        guard.complete(match &result {
            Ok(value) => Ok(Arc::clone(value)),
            Err(e) => Err(e.to_string()),
        });

        result
    }

    /// Write a freshly fetched value back through the enabled tiers
    async fn fill(
        &self,
        key: &str,
        value: V,
        options: &CacheOptions,
    ) -> Result<Arc<V>, CacheError> {
        if options.use_remote {
            let json = serde_json::to_string(&value)?;
            // Best effort: a failing remote tier never fails the request
            if let Err(e) = self.remote.set(key, &json, options.ttl).await {
                warn!("Remote tier SET error for key {}: {}. Continuing.", key, e);
            }
        }

        let value = Arc::new(value);
        if options.use_memory {
            self.memory
                .insert(key, Arc::clone(&value), options.ttl)
                .await;
        }
        Ok(value)
    }

    /// Invalidate a single key in both tiers
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        debug!("Invalidating cache for key: {}", key);

        self.memory.invalidate(key).await;

        // Best effort
        if let Err(e) = self.remote.delete(key).await {
            warn!("Remote tier DEL error for key {}: {}. Continuing.", key, e);
        }
        Ok(())
    }

    /// Invalidate every key matching a wildcard pattern
    ///
    /// The wildcard is evaluated client-side against the memory tier; the
    /// remote tier receives the raw pattern string and applies its own glob
    /// dialect.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        debug!("Invalidating cache for pattern: {}", pattern);

        let glob = GlobPattern::compile(pattern)?;
        self.memory.invalidate_pattern(&glob)?;

        // Best effort
        if let Err(e) = self.remote.delete_pattern(pattern).await {
            warn!(
                "Remote tier pattern delete error for {}: {}. Continuing.",
                pattern, e
            );
        }
        Ok(())
    }
}
