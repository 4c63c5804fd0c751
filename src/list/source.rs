//! Where list pages come from.
//!
//! Remote lists are served by [`ApiClient`](crate::remote::ApiClient).
//! Lists without an endpoint (campaigns, the demo inbox) are served by a
//! [`LocalSource`] that searches, filters and slices an in-memory set into
//! the same [`PageResult`] shape, so the same cache and controller drive
//! both.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::cache::{CacheOptions, QueryCache};

use crate::model::{Campaign, Contact, Email, Record};
use crate::query::{
    CampaignFilters, ContactFilters, EmailFilters, EmailFolder, FilterSet, PageResult,
    QueryDescriptor,
};
use crate::remote::{ApiError, ApiErrorKind};

/// Serves pages of `R` for queries filtered by `F`.
#[async_trait]
pub trait PageSource<F: FilterSet, R: Record>: Send + Sync {
    async fn fetch_page(&self, query: &QueryDescriptor<F>) -> Result<PageResult<R>, ApiError>;
}

/// Serves single records by id.
#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    async fn fetch_record(&self, id: &str) -> Result<R, ApiError>;
}

/// Query cache whose misses are served by `source`.
pub fn page_cache<F, R, S>(
    source: Arc<S>,
    options: CacheOptions,
) -> QueryCache<QueryDescriptor<F>, PageResult<R>>
where
    F: FilterSet,
    R: Record,
    S: PageSource<F, R> + ?Sized + 'static,
{
    QueryCache::new(options, move |query: QueryDescriptor<F>| {
        let source = source.clone();
        async move { source.fetch_page(&query).await }
    })
}

/// Record cache keyed by id.
pub fn record_cache<R, S>(source: Arc<S>, options: CacheOptions) -> QueryCache<String, R>
where
    R: Record,
    S: RecordSource<R> + ?Sized + 'static,
{
    QueryCache::new(options, move |id: String| {
        let source = source.clone();
        async move { source.fetch_record(&id).await }
    })
}

/// Client-side search and filter predicate for a record type.
pub trait LocalMatch<F>: Record {
    fn matches(&self, search: Option<&str>, filters: &F) -> bool;
}

/// An in-memory record set served as pages.
#[derive(Debug, Default)]
pub struct LocalSource<R> {
    records: RwLock<Vec<R>>,
}

impl<R: Record> LocalSource<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.records.read().iter().find(|r| r.id() == id).cloned()
    }

    /// Insert `record`, or replace the one with the same id in place.
    pub fn upsert(&self, record: R) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id() != id);
        records.len() != before
    }
}

#[async_trait]
impl<F, R> PageSource<F, R> for LocalSource<R>
where
    F: FilterSet,
    R: LocalMatch<F>,
{
    async fn fetch_page(&self, query: &QueryDescriptor<F>) -> Result<PageResult<R>, ApiError> {
        let search = query.search().map(str::to_lowercase);
        let matching: Vec<R> = self
            .records
            .read()
            .iter()
            .filter(|r| r.matches(search.as_deref(), query.filters()))
            .cloned()
            .collect();
        Ok(PageResult::paginate(matching, query))
    }
}

#[async_trait]
impl<R: Record> RecordSource<R> for LocalSource<R> {
    async fn fetch_record(&self, id: &str) -> Result<R, ApiError> {
        self.get(id).ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::Client,
                Some(404),
                format!("record '{id}' not found"),
            )
        })
    }
}

/// Case-insensitive substring test. `needle` is already lowercase.
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl LocalMatch<CampaignFilters> for Campaign {
    fn matches(&self, search: Option<&str>, filters: &CampaignFilters) -> bool {
        search.is_none_or(|s| contains(&self.name, s))
            && filters.platform.is_none_or(|p| p == self.platform)
            && filters.status.is_none_or(|s| s == self.status)
    }
}

impl LocalMatch<EmailFilters> for Email {
    fn matches(&self, search: Option<&str>, filters: &EmailFilters) -> bool {
        let in_folder = match filters.folder {
            EmailFolder::Inbox => true,
            EmailFolder::Starred => self.is_starred,
            EmailFolder::Important => self.is_important,
            EmailFolder::Sent | EmailFolder::Drafts | EmailFolder::Trash => false,
        };
        in_folder && search.is_none_or(|s| contains(&self.sender, s) || contains(&self.subject, s))
    }
}

impl LocalMatch<ContactFilters> for Contact {
    fn matches(&self, search: Option<&str>, filters: &ContactFilters) -> bool {
        let text_match = search.is_none_or(|s| {
            contains(&self.first_name, s)
                || contains(&self.last_name, s)
                || contains(&self.email, s)
                || self.company.as_deref().is_some_and(|c| contains(c, s))
        });
        text_match
            && filters
                .source
                .is_none_or(|source| self.source_kind() == Some(source))
            && filters
                .subscription
                .is_none_or(|sub| sub.is_subscribed() == self.is_subscribed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{demo_inbox, generate_campaigns};
    use crate::model::Platform;

    fn query<F: FilterSet>(filters: F) -> QueryDescriptor<F> {
        QueryDescriptor::new(10).unwrap().with_filters(filters)
    }

    #[tokio::test]
    async fn test_campaign_filters_and_search() {
        let source = LocalSource::new(generate_campaigns(150, 7));
        let filters = CampaignFilters {
            platform: Some(Platform::TikTok),
            status: None,
        };

        let page = source.fetch_page(&query(filters.clone())).await.unwrap();
        assert!(page.items.iter().all(|c| c.platform == Platform::TikTok));

        let all: usize = source
            .fetch_page(&query(CampaignFilters::default()))
            .await
            .unwrap()
            .pagination
            .total as usize;
        assert_eq!(all, 150);

        let searched = source
            .fetch_page(&query(CampaignFilters::default()).with_search(Some("CAMPAIGN 42 ")))
            .await
            .unwrap();
        assert!(searched.items.iter().any(|c| c.name.starts_with("Campaign 42 ")));
    }

    #[tokio::test]
    async fn test_inbox_folders() {
        let source = LocalSource::new(demo_inbox());
        let total = |folder: EmailFolder| {
            let q = query(EmailFilters { folder });
            let source = &source;
            async move { source.fetch_page(&q).await.unwrap().pagination.total }
        };

        assert_eq!(total(EmailFolder::Inbox).await, demo_inbox().len() as u64);
        let starred = demo_inbox().iter().filter(|e| e.is_starred).count() as u64;
        assert_eq!(total(EmailFolder::Starred).await, starred);
        assert_eq!(total(EmailFolder::Sent).await, 0);
        assert_eq!(total(EmailFolder::Trash).await, 0);
    }

    #[tokio::test]
    async fn test_inbox_search_matches_sender_or_subject() {
        let source = LocalSource::new(demo_inbox());
        let page = source
            .fetch_page(&query(EmailFilters::default()).with_search(Some("nuno")))
            .await
            .unwrap();
        assert!(!page.is_empty());
        assert!(page.items.iter().all(|e| e.sender.to_lowercase().contains("nuno")
            || e.subject.to_lowercase().contains("nuno")));
    }

    #[tokio::test]
    async fn test_record_lookup_and_mutation() {
        let source = LocalSource::new(demo_inbox());
        let mut email = source.fetch_record("1").await.unwrap();
        assert!(source.fetch_record("missing").await.unwrap_err().is_not_found());

        email.is_read = true;
        source.upsert(email);
        assert!(source.get("1").unwrap().is_read);

        let before = source.len();
        assert!(source.remove("1"));
        assert!(!source.remove("1"));
        assert_eq!(source.len(), before - 1);
    }
}
