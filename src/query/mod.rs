//! Query descriptors and page results.
//!
//! A [`QueryDescriptor`] is the normalized identity of one requested page:
//! page, limit, search text and a typed filter set. It is the cache key,
//! so two descriptors are equal only when every field matches.

pub mod filters;

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{MailboardError, Result};
use crate::model::Record;

pub use filters::{CampaignFilters, ContactFilters, EmailFilters, EmailFolder, Subscription};

/// An explicit set of recognized filter fields with typed values.
///
/// Implementations enumerate every field they accept; anything else is
/// rejected rather than passed through to the server.
pub trait FilterSet:
    Clone + fmt::Debug + Default + PartialEq + Eq + Hash + Send + Sync + 'static
{
    /// Field names accepted by [`FilterSet::set_field`].
    const FIELDS: &'static [&'static str];

    /// Set one field from its string form. `all` (or an empty value) clears it.
    fn set_field(&mut self, field: &str, value: &str) -> Result<()>;

    /// Query-string parameters for the active fields, in a stable order.
    fn to_params(&self) -> Vec<(String, String)>;

    /// Whether any field narrows the result set.
    fn is_active(&self) -> bool {
        *self != Self::default()
    }

    /// Build a filter set from `field=value` pairs.
    fn parse<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = Self::default();
        for (field, value) in pairs {
            filters.set_field(field.as_ref(), value.as_ref())?;
        }
        Ok(filters)
    }
}

/// Error for a field name a filter set does not recognize.
pub(crate) fn unknown_field(field: &str, fields: &[&str]) -> MailboardError {
    MailboardError::UnknownFilterField {
        field: field.to_string(),
        expected: fields.join(", "),
    }
}

/// Parse an optional filter value, where `all` or blank means "no filter".
pub(crate) fn parse_option<T>(value: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = MailboardError>,
{
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

/// Normalized parameters identifying one requested page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor<F> {
    page: u32,
    limit: u32,
    search: Option<String>,
    filters: F,
}

impl<F: FilterSet> QueryDescriptor<F> {
    /// First page, no search, no filters.
    pub fn new(limit: u32) -> Result<Self> {
        if limit == 0 {
            return Err(MailboardError::InvalidPageSize(limit));
        }
        Ok(Self {
            page: 1,
            limit,
            search: None,
            filters: F::default(),
        })
    }

    pub fn with_page(mut self, page: u32) -> Result<Self> {
        if page == 0 {
            return Err(MailboardError::InvalidPage(page));
        }
        self.page = page;
        Ok(self)
    }

    /// Set the search text. Blank input means no search.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_filters(mut self, filters: F) -> Self {
        self.filters = filters;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }

    /// Query string: `page` and `limit` always, `search` when set, then filters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        params.extend(self.filters.to_params());
        params
    }
}

impl<F: FilterSet> fmt::Display for QueryDescriptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .to_params()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        f.write_str(&parts.join("&"))
    }
}

/// Position of a page within the whole result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Pagination with `total_pages = ceil(total / limit)`.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// `ceil(total / limit)`, with zero pages for an empty set.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(limit as u64)).unwrap_or(u32::MAX)
}

/// One page of records plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<R> {
    pub items: Vec<R>,
    pub pagination: Pagination,
}

impl<R: Record> PageResult<R> {
    pub fn new(items: Vec<R>, pagination: Pagination) -> Self {
        Self { items, pagination }
    }

    /// Slice an already-filtered, ordered set into the page `query` asks for.
    ///
    /// A page past the end yields no items but still reports the real totals.
    pub fn paginate<F: FilterSet>(matching: Vec<R>, query: &QueryDescriptor<F>) -> Self {
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset())
            .take(query.limit() as usize)
            .collect();
        Self::new(items, Pagination::new(query.page(), query.limit(), total))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|r| r.id() == id)
    }

    /// Overwrite the record with the same id, if this page holds it.
    pub fn replace_record(&mut self, record: &R) -> bool {
        match self.items.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record.clone();
                true
            }
            None => false,
        }
    }

    /// Drop the record with `id` and shrink the totals to match.
    pub fn remove_record(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.id() != id);
        if self.items.len() == before {
            return false;
        }
        let p = &mut self.pagination;
        *p = Pagination::new(p.page, p.limit, p.total.saturating_sub(1));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Platform;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(String);

    impl Record for Row {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (1..=n).map(|i| Row(format!("r{i}"))).collect()
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(150, 10), 15);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_descriptor_rejects_zero_page_and_limit() {
        assert!(matches!(
            QueryDescriptor::<ContactFilters>::new(0),
            Err(MailboardError::InvalidPageSize(0))
        ));
        let q = QueryDescriptor::<ContactFilters>::new(10).unwrap();
        assert!(matches!(q.with_page(0), Err(MailboardError::InvalidPage(0))));
    }

    #[test]
    fn test_descriptor_equality_covers_every_field() {
        let base = QueryDescriptor::<CampaignFilters>::new(10).unwrap();
        let page2 = base.clone().with_page(2).unwrap();
        let searched = base.clone().with_search(Some("acme"));
        let filtered = base.clone().with_filters(CampaignFilters {
            platform: Some(Platform::X),
            status: None,
        });

        assert_ne!(base, page2);
        assert_ne!(base, searched);
        assert_ne!(base, filtered);
        assert_ne!(base, QueryDescriptor::new(20).unwrap());
        assert_eq!(base, base.clone().with_search(Some("   ")));
    }

    #[test]
    fn test_params_only_include_set_values() {
        let q = QueryDescriptor::<ContactFilters>::new(10).unwrap();
        assert_eq!(q.to_string(), "page=1&limit=10");

        let q = q.with_page(3).unwrap().with_search(Some(" acme ")).with_filters(
            ContactFilters::parse([("subscription", "unsubscribed")]).unwrap(),
        );
        assert_eq!(
            q.to_string(),
            "page=3&limit=10&search=acme&isSubscribed=false"
        );
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn test_paginate_slices_and_counts() {
        let q = QueryDescriptor::<CampaignFilters>::new(10)
            .unwrap()
            .with_page(2)
            .unwrap();
        let page = PageResult::paginate(rows(25), &q);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].id(), "r11");
        assert_eq!(page.pagination, Pagination::new(2, 10, 25));
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_page_past_end_is_empty_not_clamped() {
        let q = QueryDescriptor::<CampaignFilters>::new(10)
            .unwrap()
            .with_page(9)
            .unwrap();
        let page = PageResult::paginate(rows(25), &q);
        assert!(page.is_empty());
        assert_eq!(page.pagination.page, 9);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_remove_record_updates_totals() {
        let q = QueryDescriptor::<CampaignFilters>::new(10).unwrap();
        let mut page = PageResult::paginate(rows(11), &q);
        assert_eq!(page.pagination.total_pages, 2);

        assert!(page.remove_record("r3"));
        assert!(!page.contains("r3"));
        assert_eq!(page.pagination.total, 10);
        assert_eq!(page.pagination.total_pages, 1);

        assert!(!page.remove_record("r3"));
        assert_eq!(page.pagination.total, 10);
    }

    #[test]
    fn test_replace_record() {
        let q = QueryDescriptor::<CampaignFilters>::new(10).unwrap();
        let mut page = PageResult::paginate(rows(3), &q);
        assert!(page.replace_record(&Row("r2".to_string())));
        assert!(!page.replace_record(&Row("r9".to_string())));
    }
}
