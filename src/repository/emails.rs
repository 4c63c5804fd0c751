use std::sync::Arc;

use crate::cache::CacheOptions;
use crate::error::{MailboardError, Result};
use crate::model::{Email, EmailPatch};
use crate::query::EmailFilters;
use crate::remote::ApiClient;

use super::Repository;

/// The inbox, served by the API.
#[derive(Clone)]
pub struct EmailRepository {
    client: Arc<ApiClient>,
    cache: Repository<EmailFilters, Email>,
}

impl EmailRepository {
    pub fn new(client: ApiClient, options: CacheOptions) -> Self {
        let client = Arc::new(client);
        Self {
            cache: Repository::new(client.clone(), options),
            client,
        }
    }

    pub fn cache(&self) -> &Repository<EmailFilters, Email> {
        &self.cache
    }

    /// Apply a partial update and patch every cached copy of the email.
    ///
    /// Folder pages are patched in place rather than refetched, so a
    /// message unstarred from the starred folder stays visible until the
    /// next refresh.
    pub async fn update(&self, id: &str, patch: &EmailPatch) -> Result<Email> {
        if patch.is_empty() {
            return Err(MailboardError::InvalidInput("nothing to update".to_string()));
        }
        let email = self.client.update_email(id, patch).await?;
        tracing::info!(id = %email.id, "email updated");
        self.cache.reconcile_updated(&email);
        Ok(email)
    }

    pub async fn mark_read(&self, id: &str, read: bool) -> Result<Email> {
        let patch = EmailPatch {
            is_read: Some(read),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    pub async fn set_starred(&self, id: &str, starred: bool) -> Result<Email> {
        let patch = EmailPatch {
            is_starred: Some(starred),
            ..Default::default()
        };
        self.update(id, &patch).await
    }
}
