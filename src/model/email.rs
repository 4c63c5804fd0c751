use serde::{Deserialize, Serialize};

use super::Record;

/// A message in the inbox list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    pub sender: String,
    pub subject: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<u32>,
}

impl Record for Email {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update for an email (read/starred/important flags, labels).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_important: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl EmailPatch {
    pub fn is_empty(&self) -> bool {
        *self == EmailPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let email: Email = serde_json::from_str(
            r#"{"id":"1","sender":"Nuno Affiliate","subject":"Your application","isStarred":true}"#,
        )
        .unwrap();
        assert_eq!(email.id(), "1");
        assert!(email.is_starred);
        assert!(!email.is_read);
        assert!(email.labels.is_empty());
        assert_eq!(email.attachments, None);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = EmailPatch {
            is_read: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"isRead": true})
        );
        assert!(!patch.is_empty());
        assert!(EmailPatch::default().is_empty());
    }
}
