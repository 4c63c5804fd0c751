use std::sync::Arc;

use crate::cache::CacheOptions;
use crate::fixtures;
use crate::list::source::LocalSource;
use crate::model::Campaign;
use crate::query::CampaignFilters;

use super::Repository;

/// Campaigns have no endpoint; they come from the deterministic generator.
#[derive(Clone)]
pub struct CampaignRepository {
    source: Arc<LocalSource<Campaign>>,
    cache: Repository<CampaignFilters, Campaign>,
}

impl CampaignRepository {
    pub fn new(campaigns: Vec<Campaign>, options: CacheOptions) -> Self {
        let source = Arc::new(LocalSource::new(campaigns));
        Self {
            cache: Repository::new(source.clone(), options),
            source,
        }
    }

    /// The standard demo set.
    pub fn demo(options: CacheOptions) -> Self {
        Self::new(
            fixtures::generate_campaigns(fixtures::DEFAULT_CAMPAIGN_COUNT, fixtures::DEFAULT_SEED),
            options,
        )
    }

    pub fn cache(&self) -> &Repository<CampaignFilters, Campaign> {
        &self.cache
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}
