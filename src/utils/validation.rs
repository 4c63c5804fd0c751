//! Input validation shared by the CLI and the repositories.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MailboardError, Result};

/// Maximum length for a search query (in characters).
pub const MAX_SEARCH_LENGTH: usize = 200;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("email regex: {e}"))
});

/// Validates an email address: something, `@`, a domain with a dot.
pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(MailboardError::InvalidEmail(email.to_string()))
    }
}

/// Trim a search query, rejecting control characters and overlong input.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_search(input: &str) -> Result<Option<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(MailboardError::InvalidInput(
            "search must not contain control characters".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_SEARCH_LENGTH {
        return Err(MailboardError::InvalidInput(format!(
            "search is {len} characters (max {MAX_SEARCH_LENGTH})"
        )));
    }
    Ok(Some(trimmed.to_string()))
}
