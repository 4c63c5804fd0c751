//! List view controller.
//!
//! [`ListController`] is the synchronous state machine behind one list
//! view: it owns the current [`QueryDescriptor`], the page on screen and
//! the phase of the view. Every user action that changes the query hands
//! back a [`FetchTicket`]; results are applied against their ticket, and a
//! result for anything but the latest ticket is dropped. The async side
//! (cache reads, debounced search) lives in [`view::ListView`].
//!
//! ```text
//! Idle ──start──▶ Loading ──ok──▶ Ready ──query change──▶ Revalidating ──ok──▶ Ready
//!                    │                                         │
//!                   err                                       err
//!                    ▼                                         ▼
//!                  Error ◀─────────────────────────────────────┘
//!                    └──retry──▶ Loading
//! ```

pub mod metrics;
pub mod pagination;
pub mod source;
pub mod view;

use std::fmt;
use std::sync::Arc;

use crate::error::{MailboardError, Result};
use crate::model::Record;
use crate::query::{FilterSet, PageResult, QueryDescriptor};
use crate::remote::ApiError;

pub use pagination::{PageItem, PageWindow};
pub use view::ListView;

/// Lifecycle phase of a list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListPhase {
    /// Nothing requested yet.
    Idle,
    /// First fetch in flight, nothing to show.
    Loading,
    Ready,
    /// Previous data on screen while the new query loads.
    Revalidating,
    Error,
}

impl fmt::Display for ListPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListPhase::Idle => "idle",
            ListPhase::Loading => "loading",
            ListPhase::Ready => "ready",
            ListPhase::Revalidating => "revalidating",
            ListPhase::Error => "error",
        };
        f.write_str(s)
    }
}

/// Why a loaded page has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// No search or filter is active; the collection itself is empty.
    NothingExists,
    /// A search or filter excluded everything.
    NothingMatches,
    /// Records exist, but the requested page lies past the last one.
    PastLastPage,
}

impl EmptyState {
    /// Headline for a list of `noun` (plural, e.g. "contacts").
    pub fn title(&self, noun: &str) -> String {
        match self {
            EmptyState::NothingExists => format!("No {noun} found"),
            EmptyState::NothingMatches => format!("No {noun} match your filters"),
            EmptyState::PastLastPage => format!("No {noun} on this page"),
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            EmptyState::NothingExists => None,
            EmptyState::NothingMatches => Some("Try adjusting your search terms or filters"),
            EmptyState::PastLastPage => Some("This page is past the last page of results"),
        }
    }
}

/// A request the controller wants made.
///
/// Results must be handed back through [`ListController::apply`] together
/// with the ticket they were fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<F> {
    pub seq: u64,
    pub query: QueryDescriptor<F>,
}

/// What a list view should render.
#[derive(Debug, Clone)]
pub enum ViewState<R> {
    Idle,
    /// Skeleton rows.
    Loading,
    Ready(Arc<PageResult<R>>),
    /// Previous data with a stale indicator.
    Revalidating(Arc<PageResult<R>>),
    Empty(EmptyState),
    /// Error panel with a retry affordance, over the last good page if any.
    Error {
        error: ApiError,
        previous: Option<Arc<PageResult<R>>>,
    },
}

/// State machine for one list view.
#[derive(Debug)]
pub struct ListController<F, R> {
    query: QueryDescriptor<F>,
    search_input: String,
    phase: ListPhase,
    page: Option<Arc<PageResult<R>>>,
    error: Option<ApiError>,
    seq: u64,
}

impl<F: FilterSet, R: Record> ListController<F, R> {
    pub fn new(page_size: u32) -> Result<Self> {
        Ok(Self {
            query: QueryDescriptor::new(page_size)?,
            search_input: String::new(),
            phase: ListPhase::Idle,
            page: None,
            error: None,
            seq: 0,
        })
    }

    /// Start from an existing query instead of page 1 with no filters.
    pub fn with_query(query: QueryDescriptor<F>) -> Self {
        Self {
            search_input: query.search().unwrap_or_default().to_string(),
            query,
            phase: ListPhase::Idle,
            page: None,
            error: None,
            seq: 0,
        }
    }

    pub fn query(&self) -> &QueryDescriptor<F> {
        &self.query
    }

    pub fn phase(&self) -> ListPhase {
        self.phase
    }

    /// The page on screen, which may belong to a previous query.
    pub fn page(&self) -> Option<&Arc<PageResult<R>>> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// The text in the search box, which may not be applied yet.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Ticket for the current query, if one is outstanding.
    pub fn current_ticket(&self) -> Option<FetchTicket<F>> {
        matches!(self.phase, ListPhase::Loading | ListPhase::Revalidating).then(|| FetchTicket {
            seq: self.seq,
            query: self.query.clone(),
        })
    }

    /// First fetch. Later calls behave like [`ListController::refresh`].
    pub fn start(&mut self) -> FetchTicket<F> {
        self.issue()
    }

    /// Record a keystroke. The query only changes once the debounced value
    /// is applied with [`ListController::apply_search`].
    pub fn set_search_input(&mut self, text: &str) {
        self.search_input = text.to_string();
    }

    /// Apply settled search text, returning to page 1.
    ///
    /// Returns `None` when the normalized search did not change.
    pub fn apply_search(&mut self, text: &str) -> Option<FetchTicket<F>> {
        let next = self.query.clone().with_search(Some(text));
        if next.search() == self.query.search() {
            return None;
        }
        self.query = first_page(next);
        Some(self.issue())
    }

    /// Change one filter field from its string form, returning to page 1.
    pub fn set_filter(&mut self, field: &str, value: &str) -> Result<Option<FetchTicket<F>>> {
        let mut filters = self.query.filters().clone();
        filters.set_field(field, value)?;
        Ok(self.set_filters(filters))
    }

    /// Replace the whole filter set, returning to page 1.
    pub fn set_filters(&mut self, filters: F) -> Option<FetchTicket<F>> {
        if filters == *self.query.filters() {
            return None;
        }
        self.query = first_page(self.query.clone().with_filters(filters));
        Some(self.issue())
    }

    /// Jump to `page`. Pages past the known end are allowed and come back empty.
    pub fn go_to_page(&mut self, page: u32) -> Result<Option<FetchTicket<F>>> {
        if page == 0 {
            return Err(MailboardError::InvalidPage(page));
        }
        if page == self.query.page() {
            return Ok(None);
        }
        self.query = self.query.clone().with_page(page)?;
        Ok(Some(self.issue()))
    }

    /// Next page, when the Next control is enabled.
    pub fn next_page(&mut self) -> Option<FetchTicket<F>> {
        let window = self.page_window()?;
        if !window.next_enabled {
            return None;
        }
        self.go_to_page(self.query.page() + 1).ok().flatten()
    }

    /// Previous page, when the Previous control is enabled.
    pub fn previous_page(&mut self) -> Option<FetchTicket<F>> {
        if self.query.page() <= 1 {
            return None;
        }
        self.go_to_page(self.query.page() - 1).ok().flatten()
    }

    /// Refetch the current query.
    pub fn refresh(&mut self) -> FetchTicket<F> {
        self.issue()
    }

    /// Refetch after a terminal error. `None` unless the view is in error.
    pub fn retry(&mut self) -> Option<FetchTicket<F>> {
        (self.phase == ListPhase::Error).then(|| self.issue())
    }

    /// Whether `ticket` is the latest one issued.
    pub fn is_current(&self, ticket: &FetchTicket<F>) -> bool {
        ticket.seq == self.seq
    }

    /// Apply the outcome of a fetch.
    ///
    /// Returns `false` when the ticket has been superseded, in which case
    /// nothing changes.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket<F>,
        result: std::result::Result<Arc<PageResult<R>>, ApiError>,
    ) -> bool {
        if ticket.seq != self.seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.seq,
                query = %ticket.query,
                "ignoring superseded list result"
            );
            return false;
        }

        match result {
            Ok(page) => {
                self.page = Some(page);
                self.error = None;
                self.phase = ListPhase::Ready;
            }
            Err(error) => {
                tracing::debug!(query = %ticket.query, "list fetch failed: {error}");
                self.error = Some(error);
                self.phase = ListPhase::Error;
            }
        }
        true
    }

    /// Show cached data for `ticket` while its refetch runs.
    pub fn show_stale(&mut self, ticket: &FetchTicket<F>, page: Arc<PageResult<R>>) -> bool {
        if ticket.seq != self.seq {
            return false;
        }
        self.page = Some(page);
        self.phase = ListPhase::Revalidating;
        true
    }

    /// Drop a deleted record from the page on screen without a reload.
    pub fn remove_record(&mut self, id: &str) -> bool {
        match self.page.as_mut() {
            Some(page) if page.contains(id) => Arc::make_mut(page).remove_record(id),
            _ => false,
        }
    }

    /// Swap an updated record into the page on screen.
    pub fn replace_record(&mut self, record: &R) -> bool {
        match self.page.as_mut() {
            Some(page) if page.contains(record.id()) => Arc::make_mut(page).replace_record(record),
            _ => false,
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.query.search().is_some() || self.query.filters().is_active()
    }

    /// Page buttons for the page on screen, once totals are known.
    pub fn page_window(&self) -> Option<PageWindow> {
        self.page
            .as_ref()
            .map(|p| PageWindow::compute(self.query.page(), p.pagination.total_pages))
    }

    /// Why the list is empty, once a page has loaded with no rows.
    pub fn empty_state(&self) -> Option<EmptyState> {
        let page = self.page.as_ref().filter(|p| p.is_empty())?;
        if self.phase != ListPhase::Ready {
            return None;
        }
        Some(if page.pagination.total > 0 {
            EmptyState::PastLastPage
        } else if self.has_active_filters() {
            EmptyState::NothingMatches
        } else {
            EmptyState::NothingExists
        })
    }

    pub fn view_state(&self) -> ViewState<R> {
        match self.phase {
            ListPhase::Idle => ViewState::Idle,
            ListPhase::Loading => ViewState::Loading,
            ListPhase::Revalidating => match &self.page {
                Some(page) => ViewState::Revalidating(page.clone()),
                None => ViewState::Loading,
            },
            ListPhase::Error => ViewState::Error {
                error: self
                    .error
                    .clone()
                    .unwrap_or_else(|| ApiError::network("unknown error")),
                previous: self.page.clone(),
            },
            ListPhase::Ready => match (self.empty_state(), &self.page) {
                (Some(empty), _) => ViewState::Empty(empty),
                (None, Some(page)) => ViewState::Ready(page.clone()),
                (None, None) => ViewState::Loading,
            },
        }
    }

    fn issue(&mut self) -> FetchTicket<F> {
        self.seq += 1;
        self.error = None;
        self.phase = if self.page.is_some() {
            ListPhase::Revalidating
        } else {
            ListPhase::Loading
        };
        tracing::debug!(seq = self.seq, query = %self.query, phase = %self.phase, "list fetch issued");
        FetchTicket {
            seq: self.seq,
            query: self.query.clone(),
        }
    }
}

fn first_page<F: FilterSet>(query: QueryDescriptor<F>) -> QueryDescriptor<F> {
    query.clone().with_page(1).unwrap_or(query)
}
