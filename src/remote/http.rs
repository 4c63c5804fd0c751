//! reqwest-backed [`Transport`].
//!
//! # Security Note - Logging
//!
//! The bearer token only ever leaves [`BearerToken`](super::BearerToken) as a
//! header value built at send time, and that value is marked sensitive so
//! reqwest/hyper redact it from their own debug output.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{self, HeaderValue};
use url::Url;

use crate::error::{MailboardError, Result};

use super::{ApiError, ApiErrorKind, ApiRequest, Method, RawResponse, Transport};

/// Transport that talks to the real API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailboardError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path against the base URL, keeping any base path prefix.
    fn endpoint(&self, path: &str) -> std::result::Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| {
            ApiError::new(
                ApiErrorKind::Client,
                None,
                format!("invalid request path '{path}': {e}"),
            )
        })
    }
}

/// Parse and check an API base URL.
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)
        .map_err(|e| MailboardError::Config(format!("invalid API base URL '{base_url}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(MailboardError::Config(format!(
            "invalid API base URL '{base_url}': unsupported scheme '{other}'"
        ))),
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> std::result::Result<RawResponse, ApiError> {
        let url = self.endpoint(&request.path)?;

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .header("X-Request-Id", request.request_id.as_str());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = &request.bearer {
            let mut value = HeaderValue::from_str(&token.header_value()).map_err(|_| {
                ApiError::new(
                    ApiErrorKind::Client,
                    None,
                    "stored token is not a valid header value",
                )
            })?;
            value.set_sensitive(true);
            builder = builder.header(header::AUTHORIZATION, value);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::network(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(format!("failed to read response body: {e}")))?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body: body.to_vec(),
        })
    }
}
