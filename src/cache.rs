//! Stale-while-revalidate cache for polled remote resources.
//!
//! Entries are stored as `Arc` snapshots and replaced wholesale on every
//! successful fetch, so a reader holding a snapshot never observes a
//! partial write. At most one fetch runs per key at any time.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::error::FetchError;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Arc<T>,
    pub expiry: Instant,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expiry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Absent,
    Loading,
    Fresh,
    Stale,
}

#[derive(Debug)]
pub enum CacheEvent<T> {
    Updated {
        key: String,
        entry: Arc<CacheEntry<T>>,
    },
    Failed {
        key: String,
        error: FetchError,
    },
}

impl<T> CacheEvent<T> {
    pub fn key(&self) -> &str {
        match self {
            CacheEvent::Updated { key, .. } | CacheEvent::Failed { key, .. } => key,
        }
    }
}

impl<T> Clone for CacheEvent<T> {
    fn clone(&self) -> Self {
        match self {
            CacheEvent::Updated { key, entry } => CacheEvent::Updated {
                key: key.clone(),
                entry: entry.clone(),
            },
            CacheEvent::Failed { key, error } => CacheEvent::Failed {
                key: key.clone(),
                error: error.clone(),
            },
        }
    }
}

pub struct PollingCache<T> {
    entries: Arc<DashMap<String, Arc<CacheEntry<T>>>>,
    in_flight: Arc<DashSet<String>>,
    events: broadcast::Sender<CacheEvent<T>>,
}

impl<T> Clone for PollingCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            in_flight: self.in_flight.clone(),
            events: self.events.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Default for PollingCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> PollingCache<T> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashSet::new()),
            events,
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry<T>>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    pub fn freshness(&self, key: &str) -> Freshness {
        if self.is_loading(key) {
            return Freshness::Loading;
        }
        match self.get(key) {
            None => Freshness::Absent,
            Some(entry) if entry.is_fresh() => Freshness::Fresh,
            Some(_) => Freshness::Stale,
        }
    }

    /// Wall-clock time of the most recent successful write across all keys.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|entry| entry.fetched_at).max()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent<T>> {
        self.events.subscribe()
    }

    /// Starts a background fetch for `key` unless its entry is still fresh or
    /// a fetch for it is already running. Returns whether a fetch was started.
    ///
    /// Must be called from within a tokio runtime. Fetch failures are logged
    /// and published as [`CacheEvent::Failed`]; the previous entry is kept.
    pub fn ensure_fresh<F, Fut>(&self, key: &str, max_age: Duration, fetcher: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        if self.get(key).is_some_and(|entry| entry.is_fresh()) {
            return false;
        }

        if !self.in_flight.insert(key.to_string()) {
            tracing::trace!("Fetch for {} already in flight", key);
            return false;
        }
        let guard = InFlightGuard {
            key: key.to_string(),
            in_flight: self.in_flight.clone(),
        };

        // A fetch may have completed between the freshness check and claiming the key.
        if self.get(key).is_some_and(|entry| entry.is_fresh()) {
            return false;
        }

        tracing::debug!("Fetching {}", key);
        let fetch = fetcher();
        let entries = self.entries.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let key = guard.key.clone();
            match fetch.await {
                Ok(data) => {
                    let entry = Arc::new(CacheEntry {
                        data: Arc::new(data),
                        expiry: Instant::now() + max_age,
                        fetched_at: Utc::now(),
                    });
                    entries.insert(key.clone(), entry.clone());
                    drop(guard);
                    tracing::debug!("Refreshed {}", key);
                    let _ = events.send(CacheEvent::Updated { key, entry });
                }
                Err(error) => {
                    drop(guard);
                    tracing::warn!("Fetch for {} failed, serving stale data: {}", key, error);
                    let _ = events.send(CacheEvent::Failed { key, error });
                }
            }
        });

        true
    }
}

struct InFlightGuard {
    key: String,
    in_flight: Arc<DashSet<String>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}
