//! Typed endpoints of the contacts/email API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Config;
use crate::error::Result;
use crate::list::source::{PageSource, RecordSource};
use crate::model::{Contact, ContactDraft, Email, EmailPatch, User};
use crate::query::{ContactFilters, EmailFilters, FilterSet, PageResult, Pagination, QueryDescriptor};
use crate::session::SessionStore;

use super::{ApiError, ApiErrorKind, ApiRequest, HttpTransport, Method, RawResponse, Transport};

/// Authenticated client for the remote API.
///
/// Attaches the session's bearer token to every request. A 401 on any
/// request clears the session through [`SessionStore::invalidate`] before
/// the error is returned, whoever issued it.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self { transport, session }
    }

    /// Client over HTTP using the configured base URL and timeout.
    pub fn from_config(config: &Config, session: SessionStore) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url(), config.timeout())?;
        Ok(Self::new(Arc::new(transport), session))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    async fn send(&self, request: ApiRequest) -> std::result::Result<RawResponse, ApiError> {
        let request = request.with_bearer(self.session.bearer());
        let request_id = request.request_id.clone();
        tracing::debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            "api request"
        );

        let response = self.transport.send(request).await.inspect_err(|e| {
            tracing::debug!(request_id = %request_id, "api request failed: {e}");
        })?;
        tracing::debug!(request_id = %request_id, status = response.status, "api response");

        if response.is_success() {
            return Ok(response);
        }

        let error = ApiError::from_response(&response).unwrap_or_else(|| {
            ApiError::new(
                ApiErrorKind::Client,
                Some(response.status),
                format!("unexpected HTTP {}", response.status),
            )
        });
        if error.is_auth() {
            self.session.invalidate();
        }
        Err(error)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> std::result::Result<T, ApiError> {
        let response = self.send(request).await?;
        decode(&response.body)
    }

    // ---- contacts ----

    pub async fn list_contacts(
        &self,
        query: &QueryDescriptor<ContactFilters>,
    ) -> std::result::Result<PageResult<Contact>, ApiError> {
        let request = ApiRequest::new(Method::Get, "/contacts").with_query(query.to_params());
        let body: ContactListBody = self.send_json(request).await?;
        Ok(body.into_page(query))
    }

    pub async fn get_contact(&self, id: &str) -> std::result::Result<Contact, ApiError> {
        let path = format!("/contacts/{}", path_segment(id)?);
        self.send_json(ApiRequest::new(Method::Get, path)).await
    }

    pub async fn create_contact(
        &self,
        draft: &ContactDraft,
    ) -> std::result::Result<Contact, ApiError> {
        let request = ApiRequest::new(Method::Post, "/contacts").with_body(to_body(draft)?);
        self.send_json(request).await
    }

    pub async fn update_contact(
        &self,
        id: &str,
        draft: &ContactDraft,
    ) -> std::result::Result<Contact, ApiError> {
        let path = format!("/contacts/{}", path_segment(id)?);
        let request = ApiRequest::new(Method::Put, path).with_body(to_body(draft)?);
        self.send_json(request).await
    }

    pub async fn delete_contact(&self, id: &str) -> std::result::Result<(), ApiError> {
        let path = format!("/contacts/{}", path_segment(id)?);
        self.send(ApiRequest::new(Method::Delete, path)).await?;
        Ok(())
    }

    // ---- emails ----

    pub async fn list_emails(
        &self,
        query: &QueryDescriptor<EmailFilters>,
    ) -> std::result::Result<PageResult<Email>, ApiError> {
        let request = ApiRequest::new(Method::Get, "/api/emails").with_query(query.to_params());
        let body: EmailListBody = self.send_json(request).await?;
        Ok(body.into_page(query))
    }

    pub async fn get_email(&self, id: &str) -> std::result::Result<Email, ApiError> {
        let path = format!("/api/emails/{}", path_segment(id)?);
        self.send_json(ApiRequest::new(Method::Get, path)).await
    }

    pub async fn update_email(
        &self,
        id: &str,
        patch: &EmailPatch,
    ) -> std::result::Result<Email, ApiError> {
        let path = format!("/api/emails/{}", path_segment(id)?);
        let request = ApiRequest::new(Method::Patch, path).with_body(to_body(patch)?);
        self.send_json(request).await
    }

    // ---- auth ----

    /// Exchange credentials for a token and start a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = ApiRequest::new(Method::Post, "/api/auth")
            .with_body(json!({ "email": email, "password": password }));
        let body: AuthBody = self.send_json(request).await?;
        self.session.sign_in(body.token, body.user.clone())?;
        Ok(body.user)
    }

    pub fn logout(&self) -> Result<()> {
        self.session.sign_out()
    }
}

#[async_trait]
impl PageSource<ContactFilters, Contact> for ApiClient {
    async fn fetch_page(
        &self,
        query: &QueryDescriptor<ContactFilters>,
    ) -> std::result::Result<PageResult<Contact>, ApiError> {
        self.list_contacts(query).await
    }
}

#[async_trait]
impl PageSource<EmailFilters, Email> for ApiClient {
    async fn fetch_page(
        &self,
        query: &QueryDescriptor<EmailFilters>,
    ) -> std::result::Result<PageResult<Email>, ApiError> {
        self.list_emails(query).await
    }
}

#[async_trait]
impl RecordSource<Contact> for ApiClient {
    async fn fetch_record(&self, id: &str) -> std::result::Result<Contact, ApiError> {
        self.get_contact(id).await
    }
}

#[async_trait]
impl RecordSource<Email> for ApiClient {
    async fn fetch_record(&self, id: &str) -> std::result::Result<Email, ApiError> {
        self.get_email(id).await
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::decode(format!("unexpected response body: {e}")))
}

fn to_body<T: serde::Serialize>(value: &T) -> std::result::Result<serde_json::Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::new(ApiErrorKind::Client, None, format!("invalid request body: {e}")))
}

/// Record ids are interpolated into paths, so they must be plain segments.
fn path_segment(id: &str) -> std::result::Result<&str, ApiError> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    if valid {
        Ok(id)
    } else {
        Err(ApiError::new(
            ApiErrorKind::Client,
            None,
            format!("invalid record id '{id}'"),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct AuthBody {
    token: String,
    user: User,
}

/// Pagination block as the server sends it. Any field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePagination {
    page: Option<u32>,
    limit: Option<u32>,
    total: Option<u64>,
    total_pages: Option<u32>,
}

fn normalize_pagination<F: FilterSet>(
    page: Option<u32>,
    limit: Option<u32>,
    total: Option<u64>,
    total_pages: Option<u32>,
    item_count: usize,
    query: &QueryDescriptor<F>,
) -> Pagination {
    let page = page.filter(|p| *p > 0).unwrap_or(query.page());
    let limit = limit.filter(|l| *l > 0).unwrap_or(query.limit());
    let total = total.unwrap_or(item_count as u64);
    let mut pagination = Pagination::new(page, limit, total);
    if let Some(total_pages) = total_pages {
        pagination.total_pages = total_pages;
    }
    pagination
}

#[derive(Debug, Deserialize)]
struct ContactListBody {
    data: Vec<Contact>,
    #[serde(default)]
    pagination: WirePagination,
}

impl ContactListBody {
    fn into_page(self, query: &QueryDescriptor<ContactFilters>) -> PageResult<Contact> {
        let p = self.pagination;
        let pagination =
            normalize_pagination(p.page, p.limit, p.total, p.total_pages, self.data.len(), query);
        PageResult::new(self.data, pagination)
    }
}

/// The email list endpoint has shipped several response shapes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailListBody {
    emails: Option<Vec<Email>>,
    data: Option<Vec<Email>>,
    total: Option<u64>,
    total_count: Option<u64>,
    page: Option<u32>,
    current_page: Option<u32>,
    limit: Option<u32>,
    page_size: Option<u32>,
    total_pages: Option<u32>,
}

impl EmailListBody {
    fn into_page(self, query: &QueryDescriptor<EmailFilters>) -> PageResult<Email> {
        let items = self.emails.or(self.data).unwrap_or_default();
        let pagination = normalize_pagination(
            self.page.or(self.current_page),
            self.limit.or(self.page_size),
            self.total.or(self.total_count),
            self.total_pages,
            items.len(),
            query,
        );
        PageResult::new(items, pagination)
    }
}
