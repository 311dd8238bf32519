//! Read-Through Cache
//!
//! Serves read endpoints from the expiring store, fetching on a miss. Expired
//! entries are served while a background fetch replaces them, and concurrent
//! callers for one key share a single in-flight fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api_cache::policy::TtlPolicy;
use crate::cache::{Lookup, Namespace, SharedStore};
use crate::error::FetchError;

type SharedFetch = Shared<BoxFuture<'static, Result<Value, FetchError>>>;

// == Key Pattern ==
/// Matches keys inside a namespace for invalidation.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    Substring(String),
    Regex(Regex),
}

impl KeyPattern {
    pub fn substring(pattern: impl Into<String>) -> Self {
        KeyPattern::Substring(pattern.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(KeyPattern::Regex)
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            KeyPattern::Substring(s) => key.contains(s.as_str()),
            KeyPattern::Regex(re) => re.is_match(key),
        }
    }
}

// == Stats ==
#[derive(Debug, Default)]
struct Counters {
    fresh_hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    shared_waits: AtomicU64,
    fetch_failures: AtomicU64,
    stale_fallbacks: AtomicU64,
    invalidated: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of read-through activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadThroughStats {
    pub fresh_hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    /// Fetches started
    pub fetches: u64,
    /// Callers that joined a fetch already in flight
    pub shared_waits: u64,
    pub fetch_failures: u64,
    /// Failed fetches answered with a stale value
    pub stale_fallbacks: u64,
    /// Entries removed by invalidation
    pub invalidated: u64,
}

// == Read-Through Cache ==
#[derive(Clone)]
pub struct ReadThroughCache {
    store: SharedStore,
    policy: TtlPolicy,
    stale_while_revalidate: bool,
    in_flight: Arc<Mutex<HashMap<String, SharedFetch>>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("policy", &self.policy)
            .field("stale_while_revalidate", &self.stale_while_revalidate)
            .finish_non_exhaustive()
    }
}

impl ReadThroughCache {
    pub fn new(store: SharedStore, policy: TtlPolicy, stale_while_revalidate: bool) -> Self {
        Self {
            store,
            policy,
            stale_while_revalidate,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    // == Fetch With Cache ==
    /// Returns the cached value for `key`, fetching it when needed.
    ///
    /// A fresh entry is returned without calling `fetch`. An expired entry is
    /// returned at once while a background fetch refreshes it, unless
    /// stale-while-revalidate is off, in which case it is only a fallback for
    /// a failed fetch.
    pub async fn fetch_with_cache<T, F, Fut>(
        &self,
        namespace: &Namespace,
        key: &str,
        fetch: F,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let full_key = namespace.key(key);
        let ttl_ms = self.policy.ttl_for(namespace.name());
        let cached: Option<Lookup<Value>> = self.store.write().await.read(&full_key);

        let stale = match cached {
            Some(Lookup::Fresh(value)) => {
                Counters::bump(&self.counters.fresh_hits);
                return decode(value);
            }
            Some(Lookup::Stale(value)) if self.stale_while_revalidate => {
                Counters::bump(&self.counters.stale_hits);
                let refresh = self.join_or_start(&full_key, ttl_ms, fetch).await;
                tokio::spawn(async move {
                    // Outcome is logged and stored by the fetch itself
                    let _ = refresh.await;
                });
                debug!(key = %full_key, "Serving stale entry while revalidating");
                return decode(value);
            }
            Some(Lookup::Stale(value)) => Some(value),
            None => None,
        };

        Counters::bump(&self.counters.misses);
        match self.join_or_start(&full_key, ttl_ms, fetch).await.await {
            Ok(value) => decode(value),
            Err(e) => match stale {
                Some(value) => {
                    Counters::bump(&self.counters.stale_fallbacks);
                    warn!(key = %full_key, error = %e, "Fetch failed, serving stale entry");
                    decode(value)
                }
                None => Err(e),
            },
        }
    }

    /// Joins the fetch in flight for `key`, or starts one with `fetch`.
    async fn join_or_start<T, F, Fut>(&self, key: &str, ttl_ms: u64, fetch: F) -> SharedFetch
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(existing) = in_flight.get(key) {
            Counters::bump(&self.counters.shared_waits);
            return existing.clone();
        }

        Counters::bump(&self.counters.fetches);
        let request = fetch();
        let store = self.store.clone();
        let registry = Arc::clone(&self.in_flight);
        let counters = Arc::clone(&self.counters);
        let owned_key = key.to_string();

        let task = async move {
            let outcome = match request.await {
                Ok(value) => {
                    serde_json::to_value(value).map_err(|e| FetchError::Encode(e.to_string()))
                }
                Err(e) => Err(FetchError::upstream(e)),
            };

            match &outcome {
                Ok(value) => {
                    store.write().await.set(&owned_key, value, ttl_ms);
                    debug!(key = %owned_key, ttl_ms, "Cached fetched value");
                }
                Err(e) => {
                    Counters::bump(&counters.fetch_failures);
                    warn!(key = %owned_key, error = %e, "Fetch failed");
                }
            }

            registry.lock().await.remove(&owned_key);
            outcome
        }
        .boxed()
        .shared();

        in_flight.insert(key.to_string(), task.clone());
        task
    }

    // == Invalidation ==
    /// Removes entries in `namespace` whose key matches `pattern`.
    pub async fn invalidate_pattern(&self, namespace: &Namespace, pattern: &KeyPattern) -> usize {
        let removed = self
            .store
            .write()
            .await
            .remove_matching(&namespace.prefix(), |full_key| {
                namespace
                    .local_key(full_key)
                    .is_some_and(|key| pattern.matches(key))
            });

        self.counters
            .invalidated
            .fetch_add(removed as u64, Ordering::Relaxed);
        info!(namespace = %namespace, removed, "Invalidated cache entries");
        removed
    }

    /// Removes every entry in `namespace`.
    pub async fn invalidate_namespace(&self, namespace: &Namespace) -> usize {
        let removed = self
            .store
            .write()
            .await
            .remove_matching(&namespace.prefix(), |_| true);

        self.counters
            .invalidated
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of fetches currently in flight.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    pub fn stats(&self) -> ReadThroughStats {
        let c = &self.counters;
        ReadThroughStats {
            fresh_hits: c.fresh_hits.load(Ordering::Relaxed),
            stale_hits: c.stale_hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            fetches: c.fetches.load(Ordering::Relaxed),
            shared_waits: c.shared_waits.load(Ordering::Relaxed),
            fetch_failures: c.fetch_failures.load(Ordering::Relaxed),
            stale_fallbacks: c.stale_fallbacks.load(Ordering::Relaxed),
            invalidated: c.invalidated.load(Ordering::Relaxed),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
}
