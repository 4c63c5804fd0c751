use crate::query::{FilterSet, QueryDescriptor};

/// Selects a group of cache keys, e.g. every list query for a resource.
pub trait KeyPrefix<K> {
    fn matches(&self, key: &K) -> bool;
}

/// Matches every key in the cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllKeys;

impl<K> KeyPrefix<K> for AllKeys {
    fn matches(&self, _key: &K) -> bool {
        true
    }
}

/// Matches keys accepted by a predicate.
pub struct Matching<P>(pub P);

impl<K, P> KeyPrefix<K> for Matching<P>
where
    P: Fn(&K) -> bool,
{
    fn matches(&self, key: &K) -> bool {
        (self.0)(key)
    }
}

/// Matches query descriptors by the fields that are set, ignoring the rest.
///
/// `QueryPrefix::all()` matches every page of every search and filter.
#[derive(Debug, Clone)]
pub struct QueryPrefix<F> {
    search: Option<Option<String>>,
    filters: Option<F>,
    limit: Option<u32>,
}

impl<F: FilterSet> QueryPrefix<F> {
    pub fn all() -> Self {
        Self {
            search: None,
            filters: None,
            limit: None,
        }
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = Some(search.map(str::to_string));
        self
    }

    pub fn with_filters(mut self, filters: F) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl<F: FilterSet> KeyPrefix<QueryDescriptor<F>> for QueryPrefix<F> {
    fn matches(&self, key: &QueryDescriptor<F>) -> bool {
        self.search
            .as_ref()
            .is_none_or(|s| s.as_deref() == key.search())
            && self.filters.as_ref().is_none_or(|f| f == key.filters())
            && self.limit.is_none_or(|l| l == key.limit())
    }
}
