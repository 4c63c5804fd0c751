use thiserror::Error;

use crate::remote::ApiError;

#[derive(Error, Debug)]
pub enum MailboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("unknown filter field '{field}' (expected one of: {expected})")]
    UnknownFilterField { field: String, expected: String },

    #[error("invalid value '{value}' for filter '{field}'")]
    InvalidFilterValue { field: String, value: String },

    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(u32),

    #[error("invalid page size {0}: must be greater than zero")]
    InvalidPageSize(u32),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not signed in. Run: mailboard login <email>")]
    NotSignedIn,

    #[error("session storage error: {0}")]
    SessionStorage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl MailboardError {
    /// True when the failure was a 401 from the API.
    pub fn is_auth(&self) -> bool {
        matches!(self, MailboardError::Api(e) if e.is_auth())
    }
}

pub type Result<T> = std::result::Result<T, MailboardError>;
