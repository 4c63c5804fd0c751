//! Per-resource facades over the caches.
//!
//! A [`Repository`] pairs a page cache (one entry per query) with a record
//! cache (one entry per id) and keeps them consistent after mutations.
//! Mutations themselves live on the resource facades and only reconcile
//! the caches once the server has accepted the change.

pub mod campaigns;
pub mod contacts;
pub mod emails;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheOptions, QueryCache, QueryPrefix};
use crate::error::Result;
use crate::list::ListView;
use crate::list::source::{PageSource, RecordSource, page_cache, record_cache};
use crate::model::Record;
use crate::query::{FilterSet, PageResult, QueryDescriptor};

pub use campaigns::CampaignRepository;
pub use contacts::ContactRepository;
pub use emails::EmailRepository;

/// Page and record caches for one resource.
pub struct Repository<F: FilterSet, R: Record> {
    pages: QueryCache<QueryDescriptor<F>, PageResult<R>>,
    records: QueryCache<String, R>,
}

impl<F: FilterSet, R: Record> Clone for Repository<F, R> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
            records: self.records.clone(),
        }
    }
}

impl<F: FilterSet, R: Record> Repository<F, R> {
    pub fn new<S>(source: Arc<S>, options: CacheOptions) -> Self
    where
        S: PageSource<F, R> + RecordSource<R> + 'static,
    {
        Self {
            pages: page_cache(source.clone(), options),
            records: record_cache(source, options),
        }
    }

    pub fn pages(&self) -> &QueryCache<QueryDescriptor<F>, PageResult<R>> {
        &self.pages
    }

    pub fn records(&self) -> &QueryCache<String, R> {
        &self.records
    }

    /// One page, from cache when fresh.
    pub async fn list(&self, query: &QueryDescriptor<F>) -> Result<Arc<PageResult<R>>> {
        Ok(self.pages.fetch(query).await?)
    }

    /// One record, from cache when fresh.
    pub async fn get(&self, id: &str) -> Result<Arc<R>> {
        Ok(self.records.fetch(&id.to_string()).await?)
    }

    /// A list view reading through this repository's page cache.
    pub fn view(&self, page_size: u32, search_delay: Duration) -> Result<ListView<F, R>> {
        ListView::new(self.pages.clone(), page_size, search_delay)
    }

    /// Mark every cached page stale.
    pub fn invalidate_lists(&self) -> usize {
        self.pages.invalidate(&QueryPrefix::<F>::all())
    }

    /// Record an accepted update: refresh the detail entry and patch the
    /// record wherever a cached page holds it.
    pub fn reconcile_updated(&self, record: &R) -> usize {
        self.records.set_entry(record.id().to_string(), record.clone());
        let patched = self
            .pages
            .update_entries(&QueryPrefix::<F>::all(), |page| page.replace_record(record));
        tracing::debug!(id = record.id(), patched, "reconciled updated record");
        patched
    }

    /// Record an accepted delete: evict the detail entry and drop the
    /// record from every cached page.
    pub fn reconcile_deleted(&self, id: &str) -> usize {
        self.records.remove_entry(&id.to_string());
        let removed = self
            .pages
            .update_entries(&QueryPrefix::<F>::all(), |page| page.remove_record(id));
        tracing::debug!(id, removed, "reconciled deleted record");
        removed
    }

    /// Evict unused entries from both caches.
    pub fn gc(&self) -> usize {
        self.pages.gc() + self.records.gc()
    }
}
