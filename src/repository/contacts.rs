use std::sync::Arc;

use crate::cache::CacheOptions;
use crate::error::Result;
use crate::model::{Contact, ContactDraft};
use crate::query::ContactFilters;
use crate::remote::ApiClient;

use super::Repository;

/// Contacts served by the API, with create, update and delete.
#[derive(Clone)]
pub struct ContactRepository {
    client: Arc<ApiClient>,
    cache: Repository<ContactFilters, Contact>,
}

impl ContactRepository {
    pub fn new(client: ApiClient, options: CacheOptions) -> Self {
        let client = Arc::new(client);
        Self {
            cache: Repository::new(client.clone(), options),
            client,
        }
    }

    pub fn cache(&self) -> &Repository<ContactFilters, Contact> {
        &self.cache
    }

    /// Create a contact. Every cached list is marked stale on success.
    pub async fn create(&self, draft: &ContactDraft) -> Result<Contact> {
        draft.validate_for_create()?;
        let contact = self.client.create_contact(draft).await?;
        tracing::info!(id = %contact.id, "contact created");
        self.cache.invalidate_lists();
        Ok(contact)
    }

    /// Update a contact and fold the server's copy into every cache.
    pub async fn update(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
        draft.validate_for_update()?;
        let contact = self.client.update_contact(id, draft).await?;
        tracing::info!(id = %contact.id, "contact updated");
        self.cache.reconcile_updated(&contact);
        self.cache.invalidate_lists();
        Ok(contact)
    }

    /// Delete a contact and drop it from every cache.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete_contact(id).await?;
        tracing::info!(id, "contact deleted");
        self.cache.reconcile_deleted(id);
        self.cache.invalidate_lists();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::EntryStatus;
    use crate::error::MailboardError;
    use crate::query::QueryDescriptor;
    use crate::remote::Method;
    use crate::remote::mock::MockTransport;
    use crate::session::SessionStore;

    fn contact_json(id: &str, first: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email": format!("{id}@acme.io"),
            "firstName": first,
            "lastName": "Doe",
            "isSubscribed": true,
            "source": "website"
        })
    }

    fn repo(mock: &Arc<MockTransport>) -> ContactRepository {
        let client = ApiClient::new(mock.clone(), SessionStore::in_memory());
        ContactRepository::new(client, CacheOptions::default())
    }

    fn list_body(ids: &[&str]) -> serde_json::Value {
        json!({
            "data": ids.iter().map(|id| contact_json(id, "Ada")).collect::<Vec<_>>(),
            "pagination": { "page": 1, "limit": 10, "total": ids.len(), "totalPages": 1 }
        })
    }

    #[tokio::test]
    async fn test_delete_removes_from_cached_pages() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/contacts").respond(200, list_body(&["c1", "c2", "c3"]));
        mock.on(Method::Delete, "/contacts/c2").respond(204, json!(null));
        let repo = repo(&mock);
        let query = QueryDescriptor::<ContactFilters>::new(10).unwrap();

        repo.cache().list(&query).await.unwrap();
        repo.delete("c2").await.unwrap();

        let page = repo.cache().pages().peek(&query).unwrap();
        assert!(!page.contains("c2"));
        assert_eq!(page.pagination.total, 2);
        assert_eq!(repo.cache().pages().status(&query), EntryStatus::Stale);
    }

    #[tokio::test]
    async fn test_update_patches_pages_and_detail() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/contacts").respond(200, list_body(&["c1", "c2"]));
        mock.on(Method::Put, "/contacts/c1").respond(200, contact_json("c1", "Grace"));
        let repo = repo(&mock);
        let query = QueryDescriptor::<ContactFilters>::new(10).unwrap();
        repo.cache().list(&query).await.unwrap();

        let draft = ContactDraft {
            first_name: Some("Grace".to_string()),
            ..Default::default()
        };
        repo.update("c1", &draft).await.unwrap();

        let page = repo.cache().pages().peek(&query).unwrap();
        assert_eq!(page.items[0].first_name, "Grace");
        let detail = repo.cache().records().peek(&"c1".to_string()).unwrap();
        assert_eq!(detail.first_name, "Grace");
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_untouched() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/contacts").respond(200, list_body(&["c1", "c2"]));
        mock.on(Method::Delete, "/contacts/c1")
            .respond(409, json!({ "message": "contact is locked" }));
        let repo = repo(&mock);
        let query = QueryDescriptor::<ContactFilters>::new(10).unwrap();
        repo.cache().list(&query).await.unwrap();

        let err = repo.delete("c1").await.unwrap_err();
        assert!(err.to_string().contains("contact is locked"));
        let page = repo.cache().pages().peek(&query).unwrap();
        assert!(page.contains("c1"));
        assert_eq!(repo.cache().pages().status(&query), EntryStatus::Fresh);
    }

    #[tokio::test]
    async fn test_create_validates_before_sending() {
        let mock = Arc::new(MockTransport::new());
        let repo = repo(&mock);
        let draft = ContactDraft {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            repo.create(&draft).await,
            Err(MailboardError::InvalidEmail(_))
        ));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_invalidates_lists() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/contacts").respond(200, list_body(&["c1"]));
        mock.on(Method::Post, "/contacts").respond(201, contact_json("c9", "New"));
        let repo = repo(&mock);
        let query = QueryDescriptor::<ContactFilters>::new(10).unwrap();
        repo.cache().list(&query).await.unwrap();

        let draft = ContactDraft {
            email: Some("c9@acme.io".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.create(&draft).await.unwrap().id, "c9");
        assert_eq!(repo.cache().pages().status(&query), EntryStatus::Stale);
    }
}
