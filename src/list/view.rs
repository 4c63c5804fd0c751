//! Async driver for a [`ListController`].
//!
//! A [`ListView`] owns the controller, reads pages through a
//! [`QueryCache`] and debounces search input. Each query change is served
//! on its own task; the controller drops any result whose ticket has been
//! superseded, so a slow response for an old query never replaces a newer
//! page. Lock guards are never held across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::{CacheRead, QueryCache, QueryPrefix};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::model::Record;
use crate::query::{FilterSet, PageResult, QueryDescriptor};

use super::{FetchTicket, ListController, ListPhase, ViewState};

type PageCache<F, R> = QueryCache<QueryDescriptor<F>, PageResult<R>>;

struct ViewInner<F, R> {
    controller: Mutex<ListController<F, R>>,
    cache: PageCache<F, R>,
    /// Bumped on every controller change.
    version: watch::Sender<u64>,
}

impl<F: FilterSet, R: Record> ViewInner<F, R> {
    fn update<T>(&self, f: impl FnOnce(&mut ListController<F, R>) -> T) -> T {
        let out = f(&mut self.controller.lock());
        self.version.send_modify(|v| *v += 1);
        out
    }
}

/// A live list: controller, cache and debounced search wired together.
pub struct ListView<F: FilterSet, R: Record> {
    inner: Arc<ViewInner<F, R>>,
    search: Debouncer<String>,
    pump: JoinHandle<()>,
}

impl<F: FilterSet, R: Record> ListView<F, R> {
    /// Must be called from within a tokio runtime.
    pub fn new(cache: PageCache<F, R>, page_size: u32, search_delay: Duration) -> Result<Self> {
        Ok(Self::with_controller(
            cache,
            ListController::new(page_size)?,
            search_delay,
        ))
    }

    pub fn with_controller(
        cache: PageCache<F, R>,
        controller: ListController<F, R>,
        search_delay: Duration,
    ) -> Self {
        let search = Debouncer::new(controller.search_input().to_string(), search_delay);
        let (version, _) = watch::channel(0);
        let inner = Arc::new(ViewInner {
            controller: Mutex::new(controller),
            cache,
            version,
        });
        let pump = tokio::spawn(pump_search(inner.clone(), search.subscribe()));
        Self {
            inner,
            search,
            pump,
        }
    }

    pub fn cache(&self) -> &PageCache<F, R> {
        &self.inner.cache
    }

    /// Issue the first fetch.
    pub fn start(&self) -> JoinHandle<()> {
        let ticket = self.inner.update(|c| c.start());
        drive(self.inner.clone(), ticket)
    }

    /// Record search text. The query changes once typing pauses.
    pub fn type_search(&self, text: &str) {
        self.inner.update(|c| c.set_search_input(text));
        self.search.set(text.to_string());
    }

    /// Apply typed search text now instead of after the debounce delay.
    pub fn flush_search(&self) {
        self.search.flush();
    }

    pub fn set_filter(&self, field: &str, value: &str) -> Result<Option<JoinHandle<()>>> {
        let ticket = self.inner.update(|c| c.set_filter(field, value))?;
        Ok(ticket.map(|t| drive(self.inner.clone(), t)))
    }

    pub fn set_filters(&self, filters: F) -> Option<JoinHandle<()>> {
        let ticket = self.inner.update(|c| c.set_filters(filters))?;
        Some(drive(self.inner.clone(), ticket))
    }

    pub fn go_to_page(&self, page: u32) -> Result<Option<JoinHandle<()>>> {
        let ticket = self.inner.update(|c| c.go_to_page(page))?;
        Ok(ticket.map(|t| drive(self.inner.clone(), t)))
    }

    pub fn next_page(&self) -> Option<JoinHandle<()>> {
        let ticket = self.inner.update(|c| c.next_page())?;
        Some(drive(self.inner.clone(), ticket))
    }

    pub fn previous_page(&self) -> Option<JoinHandle<()>> {
        let ticket = self.inner.update(|c| c.previous_page())?;
        Some(drive(self.inner.clone(), ticket))
    }

    /// Invalidate every cached page of this list and refetch the current one.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.inner.cache.invalidate(&QueryPrefix::<F>::all());
        let ticket = self.inner.update(|c| c.refresh());
        drive(self.inner.clone(), ticket)
    }

    pub fn retry(&self) -> Option<JoinHandle<()>> {
        let ticket = self.inner.update(|c| c.retry())?;
        Some(drive(self.inner.clone(), ticket))
    }

    pub fn remove_record(&self, id: &str) -> bool {
        self.inner.update(|c| c.remove_record(id))
    }

    pub fn replace_record(&self, record: &R) -> bool {
        self.inner.update(|c| c.replace_record(record))
    }

    pub fn phase(&self) -> ListPhase {
        self.inner.controller.lock().phase()
    }

    pub fn query(&self) -> QueryDescriptor<F> {
        self.inner.controller.lock().query().clone()
    }

    pub fn state(&self) -> ViewState<R> {
        self.inner.controller.lock().view_state()
    }

    /// Run `f` against the controller.
    pub fn inspect<T>(&self, f: impl FnOnce(&ListController<F, R>) -> T) -> T {
        f(&self.inner.controller.lock())
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Wait until nothing is loading, then return what to render.
    pub async fn settled(&self) -> ViewState<R> {
        let mut changes = self.subscribe();
        loop {
            if !matches!(self.phase(), ListPhase::Loading | ListPhase::Revalidating) {
                return self.state();
            }
            if changes.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

impl<F: FilterSet, R: Record> Drop for ListView<F, R> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Feed debounced search text into the controller.
async fn pump_search<F: FilterSet, R: Record>(
    inner: Arc<ViewInner<F, R>>,
    mut search: watch::Receiver<String>,
) {
    while search.changed().await.is_ok() {
        let text = search.borrow_and_update().clone();
        if let Some(ticket) = inner.update(|c| c.apply_search(&text)) {
            drive(inner.clone(), ticket);
        }
    }
}

/// Serve `ticket` from the cache and hand the outcome to the controller.
///
/// A request can be detached from its entry while this task waits on it
/// (a mutation invalidated the list). Its result then predates the
/// mutation, so the entry is read again instead. Committed data is taken
/// back out of the cache so patches made after the commit are kept.
fn drive<F: FilterSet, R: Record>(
    inner: Arc<ViewInner<F, R>>,
    ticket: FetchTicket<F>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let pending = match inner.cache.read(&ticket.query) {
                CacheRead::Fresh(data) => {
                    inner.update(|c| c.apply(&ticket, Ok(data)));
                    return;
                }
                CacheRead::Stale { data, refresh } => {
                    inner.update(|c| c.show_stale(&ticket, data));
                    refresh
                }
                CacheRead::Loading(pending) => pending,
            };
            let request = pending.request_id();
            let result = pending.wait().await;

            if !inner.controller.lock().is_current(&ticket) {
                return;
            }
            if !inner.cache.committed(&ticket.query, request) {
                tracing::debug!(
                    query = %ticket.query,
                    request,
                    "list request was detached, reading again"
                );
                continue;
            }
            let result = result.map(|data| inner.cache.peek(&ticket.query).unwrap_or(data));
            inner.update(|c| c.apply(&ticket, result));
            return;
        }
    })
}
