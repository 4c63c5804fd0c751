//! Query cache with single-flight fetches and stale-while-revalidate.
//!
//! [`QueryCache`] maps a key (usually a [`QueryDescriptor`](crate::query::QueryDescriptor))
//! to the last value fetched for it. Each key owns an explicit
//! [`EntryStatus`] state machine (see [`entry`]):
//!
//! - Concurrent readers of one key share a single request.
//! - Data inside `stale_time` is served without a request.
//! - Older data is served immediately while a background refetch runs.
//! - Failed fetches are retried per the [`RetryPolicy`]; 4xx fail at once.
//! - Entries untouched for `gc_time` are evicted by [`QueryCache::gc`].
//!
//! Fetches run on spawned tokio tasks, so a request keeps going (and its
//! side effects still happen) after every reader has dropped its handle.
//!
//! Entries live in a [`DashMap`]. No map guard is held across an `.await`.

mod entry;
mod traits;

pub use entry::{EntrySnapshot, EntryStatus, Pending};
pub use traits::{AllKeys, KeyPrefix, Matching, QueryPrefix};

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::remote::{ApiError, RetryPolicy, execute_with_retry};

use entry::{EntryState, InFlight, Slot};

/// Default staleness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
/// Default retention window for unused entries.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);

/// Timing and retry settings for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub stale_time: Duration,
    pub gc_time: Duration,
    pub retry: RetryPolicy,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
            retry: RetryPolicy::default(),
        }
    }
}

type Fetcher<K, V> = Arc<dyn Fn(K) -> BoxFuture<'static, Result<V, ApiError>> + Send + Sync>;

/// Result of a non-blocking read.
#[derive(Debug)]
pub enum CacheRead<V> {
    /// Data within the staleness window. No request was made.
    Fresh(Arc<V>),
    /// Previous data, with a background refetch in flight.
    Stale { data: Arc<V>, refresh: Pending<V> },
    /// Nothing to show yet. The first fetch is in flight.
    Loading(Pending<V>),
}

impl<V> CacheRead<V> {
    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            CacheRead::Fresh(data) | CacheRead::Stale { data, .. } => Some(data),
            CacheRead::Loading(_) => None,
        }
    }

    pub fn pending(&self) -> Option<&Pending<V>> {
        match self {
            CacheRead::Stale { refresh, .. } => Some(refresh),
            CacheRead::Loading(pending) => Some(pending),
            CacheRead::Fresh(_) => None,
        }
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub requests: u64,
    pub discarded: u64,
    pub evicted: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
    evicted: AtomicU64,
}

struct CacheInner<K, V> {
    entries: DashMap<K, Slot<V>>,
    options: CacheOptions,
    fetcher: Fetcher<K, V>,
    next_request: AtomicU64,
    counters: Counters,
}

/// Shared handle to a query cache. Clones refer to the same entries.
pub struct QueryCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache that loads missing entries with `fetcher`.
    pub fn new<F, Fut>(options: CacheOptions, fetcher: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let fetcher: Fetcher<K, V> = Arc::new(move |key| fetcher(key).boxed());
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                options,
                fetcher,
                next_request: AtomicU64::new(0),
                counters: Counters::default(),
            }),
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.inner.options
    }

    /// Non-blocking read with stale-while-revalidate semantics.
    ///
    /// Starts a fetch when the entry is missing, stale, or errored, unless
    /// one is already in flight, in which case the caller joins it.
    /// Must be called from within a tokio runtime.
    pub fn read(&self, key: &K) -> CacheRead<V> {
        let now = Instant::now();
        let stale_time = self.inner.options.stale_time;
        let mut slot = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Slot::new(now));
        slot.last_accessed = now;

        match &slot.state {
            EntryState::Fresh { data, updated_at }
                if now.duration_since(*updated_at) < stale_time =>
            {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(?key, "cache hit");
                return CacheRead::Fresh(data.clone());
            }
            EntryState::Loading { fetch } => {
                tracing::debug!(?key, request = fetch.request, "joining in-flight request");
                return CacheRead::Loading(fetch.pending());
            }
            EntryState::Revalidating { data, fetch } => {
                tracing::debug!(?key, request = fetch.request, "joining revalidation");
                return CacheRead::Stale {
                    data: data.clone(),
                    refresh: fetch.pending(),
                };
            }
            _ => {}
        }

        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
        let fetch = self.start_fetch(key.clone());
        let pending = fetch.pending();
        match slot.state.data() {
            Some(data) => {
                tracing::debug!(?key, request = fetch.request, "serving stale data, revalidating");
                slot.state = EntryState::Revalidating {
                    data: data.clone(),
                    fetch,
                };
                CacheRead::Stale {
                    data,
                    refresh: pending,
                }
            }
            None => {
                tracing::debug!(?key, request = fetch.request, "cache miss");
                slot.state = EntryState::Loading { fetch };
                CacheRead::Loading(pending)
            }
        }
    }

    /// Return fresh data, or wait for the network.
    ///
    /// Fresh entries resolve immediately. Otherwise this joins (or starts)
    /// the request for `key` and waits for it.
    pub async fn fetch(&self, key: &K) -> Result<Arc<V>, ApiError> {
        match self.read(key) {
            CacheRead::Fresh(data) => Ok(data),
            CacheRead::Stale { refresh, .. } => refresh.wait().await,
            CacheRead::Loading(pending) => pending.wait().await,
        }
    }

    /// Whether the entry for `key` took the outcome of `request`.
    ///
    /// `false` once the request was detached by invalidation or eviction,
    /// in which case its result no longer reflects the entry.
    pub fn committed(&self, key: &K, request: u64) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|slot| slot.committed == Some(request))
    }

    /// Current data for `key` without touching the network.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.inner
            .entries
            .get(key)
            .and_then(|slot| slot.state.data())
    }

    pub fn status(&self, key: &K) -> EntryStatus {
        let now = Instant::now();
        self.inner
            .entries
            .get(key)
            .map_or(EntryStatus::Empty, |slot| {
                slot.state.status(now, self.inner.options.stale_time)
            })
    }

    pub fn snapshot(&self, key: &K) -> EntrySnapshot<V> {
        let now = Instant::now();
        match self.inner.entries.get(key) {
            Some(slot) => EntrySnapshot {
                status: slot.state.status(now, self.inner.options.stale_time),
                data: slot.state.data(),
                error: match &slot.state {
                    EntryState::Error { error, .. } => Some(error.clone()),
                    _ => None,
                },
            },
            None => EntrySnapshot {
                status: EntryStatus::Empty,
                data: None,
                error: None,
            },
        }
    }

    /// Mark every entry selected by `prefix` stale.
    ///
    /// Data is kept for display but the next read refetches. A request in
    /// flight for a matching entry is detached: readers already waiting on
    /// it still get its result, but it is never written to the cache.
    /// Returns the number of matching entries. Invalidating twice is the
    /// same as invalidating once.
    pub fn invalidate(&self, prefix: &impl KeyPrefix<K>) -> usize {
        let mut matched = 0;
        for mut slot in self.inner.entries.iter_mut() {
            if !prefix.matches(slot.key()) {
                continue;
            }
            matched += 1;
            if let Some(request) = slot.state.in_flight() {
                tracing::debug!(key = ?slot.key(), request, "detaching in-flight request");
            }
            slot.state.invalidate();
        }
        tracing::debug!(matched, "invalidated cache entries");
        matched
    }

    /// Overwrite one entry with a known-good value, marking it fresh.
    pub fn set_entry(&self, key: K, value: V) {
        let now = Instant::now();
        let mut slot = self
            .inner
            .entries
            .entry(key)
            .or_insert_with(|| Slot::new(now));
        slot.last_accessed = now;
        slot.state = EntryState::Fresh {
            data: Arc::new(value),
            updated_at: now,
        };
    }

    /// Apply `update` to the data of every entry selected by `prefix`.
    ///
    /// `update` returns whether it changed anything. Freshness is left
    /// as it was. Returns the number of entries changed.
    pub fn update_entries<P, U>(&self, prefix: &P, mut update: U) -> usize
    where
        P: KeyPrefix<K>,
        U: FnMut(&mut V) -> bool,
    {
        let mut changed = 0;
        for mut slot in self.inner.entries.iter_mut() {
            if !prefix.matches(slot.key()) {
                continue;
            }
            if let Some(data) = slot.state.data_mut() {
                let mut value = (**data).clone();
                if update(&mut value) {
                    *data = Arc::new(value);
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Evict one entry. Returns whether it existed.
    pub fn remove_entry(&self, key: &K) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    /// Evict every entry not read for `gc_time` and not fetching.
    pub fn gc(&self) -> usize {
        let now = Instant::now();
        let gc_time = self.inner.options.gc_time;
        let before = self.inner.entries.len();
        self.inner.entries.retain(|_, slot| {
            slot.state.in_flight().is_some() || now.duration_since(slot.last_accessed) < gc_time
        });
        let evicted = before.saturating_sub(self.inner.entries.len());
        if evicted > 0 {
            self.inner
                .counters
                .evicted
                .fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::debug!(evicted, "cache gc");
        }
        evicted
    }

    /// Run [`QueryCache::gc`] every `interval` until the cache is dropped.
    pub fn spawn_gc(&self, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<CacheInner<K, V>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                QueryCache { inner }.gc();
            }
        })
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            requests: self.inner.next_request.load(Ordering::Relaxed),
            discarded: c.discarded.load(Ordering::Relaxed),
            evicted: c.evicted.load(Ordering::Relaxed),
        }
    }

    fn start_fetch(&self, key: K) -> InFlight<V> {
        let request = self.inner.next_request.fetch_add(1, Ordering::Relaxed) + 1;
        let fetcher = self.inner.fetcher.clone();
        let retry = self.inner.options.retry;
        let fetch_key = key.clone();

        // The commit happens inside the shared future, so every waiter
        // observes the entry already settled.
        let weak = Arc::downgrade(&self.inner);
        let future: BoxFuture<'static, Result<Arc<V>, ApiError>> = async move {
            let result = execute_with_retry(&retry, || fetcher(fetch_key.clone()))
                .await
                .map(Arc::new);
            if let Some(inner) = weak.upgrade() {
                QueryCache { inner }.settle(&key, request, result.clone());
            }
            result
        }
        .boxed();
        let shared = future.shared();

        tokio::spawn(shared.clone());

        InFlight {
            request,
            future: shared,
        }
    }

    /// Commit a finished request, unless the entry has moved on.
    fn settle(&self, key: &K, request: u64, result: Result<Arc<V>, ApiError>) {
        let Some(mut slot) = self.inner.entries.get_mut(key) else {
            self.inner.counters.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(?key, request, "entry evicted before response, discarding");
            return;
        };

        if slot.state.in_flight() != Some(request) {
            self.inner.counters.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(?key, request, "superseded response, discarding");
            return;
        }

        slot.committed = Some(request);
        slot.state = match result {
            Ok(data) => {
                tracing::debug!(?key, request, "cache commit");
                EntryState::Fresh {
                    data,
                    updated_at: Instant::now(),
                }
            }
            Err(error) => {
                tracing::debug!(?key, request, kind = %error.kind(), "fetch failed: {error}");
                EntryState::Error {
                    previous: slot.state.data(),
                    error,
                }
            }
        };
    }
}
