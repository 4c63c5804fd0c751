//! Per-key cache entry state machine.
//!
//! ```text
//! Empty ──read──▶ Loading ──ok──▶ Fresh ──stale_time──▶ Stale
//!                    │                                    │
//!                   err                                 read
//!                    ▼                                    ▼
//!                  Error ◀──────────err────────── Revalidating ──ok──▶ Fresh
//! ```
//!
//! A fetch only settles an entry while the entry still points at that
//! fetch's request id. Invalidation, `set_entry` and eviction all detach
//! the in-flight request, so its late result is dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use crate::remote::ApiError;

pub(crate) type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, ApiError>>>;

/// Handle to a request that is running for an entry.
pub(crate) struct InFlight<V> {
    pub(crate) request: u64,
    pub(crate) future: SharedFetch<V>,
}

impl<V> InFlight<V> {
    pub(crate) fn pending(&self) -> Pending<V> {
        Pending {
            request: self.request,
            future: self.future.clone(),
        }
    }
}

/// A result that will be delivered when an in-flight request settles.
///
/// Every reader that joins the same request receives the same outcome.
pub struct Pending<V> {
    request: u64,
    future: SharedFetch<V>,
}

impl<V> Pending<V> {
    /// Identifier of the underlying request. Readers sharing one request
    /// see the same id.
    pub fn request_id(&self) -> u64 {
        self.request
    }

    pub async fn wait(self) -> Result<Arc<V>, ApiError> {
        self.future.await
    }
}

impl<V> Clone for Pending<V> {
    fn clone(&self) -> Self {
        Self {
            request: self.request,
            future: self.future.clone(),
        }
    }
}

impl<V> fmt::Debug for Pending<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("request", &self.request)
            .finish()
    }
}

pub(crate) enum EntryState<V> {
    Empty,
    Loading {
        fetch: InFlight<V>,
    },
    Fresh {
        data: Arc<V>,
        updated_at: Instant,
    },
    Stale {
        data: Arc<V>,
    },
    Revalidating {
        data: Arc<V>,
        fetch: InFlight<V>,
    },
    Error {
        error: ApiError,
        previous: Option<Arc<V>>,
    },
}

impl<V> EntryState<V> {
    /// Last good data, if any.
    pub(crate) fn data(&self) -> Option<Arc<V>> {
        match self {
            EntryState::Fresh { data, .. }
            | EntryState::Stale { data }
            | EntryState::Revalidating { data, .. } => Some(data.clone()),
            EntryState::Error { previous, .. } => previous.clone(),
            EntryState::Empty | EntryState::Loading { .. } => None,
        }
    }

    pub(crate) fn data_mut(&mut self) -> Option<&mut Arc<V>> {
        match self {
            EntryState::Fresh { data, .. }
            | EntryState::Stale { data }
            | EntryState::Revalidating { data, .. } => Some(data),
            EntryState::Error { previous, .. } => previous.as_mut(),
            EntryState::Empty | EntryState::Loading { .. } => None,
        }
    }

    pub(crate) fn in_flight(&self) -> Option<u64> {
        match self {
            EntryState::Loading { fetch } | EntryState::Revalidating { fetch, .. } => {
                Some(fetch.request)
            }
            _ => None,
        }
    }

    /// Drop freshness and detach any in-flight request, keeping data.
    pub(crate) fn invalidate(&mut self) {
        let next = match std::mem::replace(self, EntryState::Empty) {
            EntryState::Fresh { data, .. }
            | EntryState::Stale { data }
            | EntryState::Revalidating { data, .. } => EntryState::Stale { data },
            EntryState::Loading { .. } | EntryState::Empty => EntryState::Empty,
            error @ EntryState::Error { .. } => error,
        };
        *self = next;
    }

    pub(crate) fn status(&self, now: Instant, stale_time: Duration) -> EntryStatus {
        match self {
            EntryState::Empty => EntryStatus::Empty,
            EntryState::Loading { .. } => EntryStatus::Loading,
            EntryState::Fresh { updated_at, .. } => {
                if now.duration_since(*updated_at) < stale_time {
                    EntryStatus::Fresh
                } else {
                    EntryStatus::Stale
                }
            }
            EntryState::Stale { .. } => EntryStatus::Stale,
            EntryState::Revalidating { .. } => EntryStatus::Revalidating,
            EntryState::Error { .. } => EntryStatus::Error,
        }
    }
}

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// No data and nothing in flight.
    Empty,
    /// First fetch in flight, no data to show yet.
    Loading,
    /// Data within the staleness window.
    Fresh,
    /// Data past the staleness window or invalidated. The next read refetches.
    Stale,
    /// Showing previous data while a refetch runs.
    Revalidating,
    /// Last fetch failed terminally.
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Empty => "empty",
            EntryStatus::Loading => "loading",
            EntryStatus::Fresh => "fresh",
            EntryStatus::Stale => "stale",
            EntryStatus::Revalidating => "revalidating",
            EntryStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot<V> {
    pub status: EntryStatus,
    pub data: Option<Arc<V>>,
    pub error: Option<ApiError>,
}

pub(crate) struct Slot<V> {
    pub(crate) state: EntryState<V>,
    pub(crate) last_accessed: Instant,
    /// Request whose outcome the entry last took.
    pub(crate) committed: Option<u64>,
}

impl<V> Slot<V> {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            state: EntryState::Empty,
            last_accessed: now,
            committed: None,
        }
    }
}
