use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::validation::validate_email;

use super::Record;

/// An email contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub is_subscribed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_engagement: Option<String>,
    /// Acquisition channel. Kept as the raw wire value; see [`Contact::source_kind`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The source as a known filter value, if it is one.
    pub fn source_kind(&self) -> Option<ContactSource> {
        self.source.as_deref().and_then(|s| s.parse().ok())
    }
}

impl Record for Contact {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Where a contact was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactSource {
    Website,
    Social,
    Email,
    Referral,
    Event,
}

filter_enum!(ContactSource, "source", {
    Website => "website",
    Social => "social",
    Email => "email",
    Referral => "referral",
    Event => "event",
});

impl ContactSource {
    /// Label shown in the source picker.
    pub fn label(&self) -> &'static str {
        match self {
            ContactSource::Website => "Website",
            ContactSource::Social => "Social Media",
            ContactSource::Email => "Email Campaign",
            ContactSource::Referral => "Referral",
            ContactSource::Event => "Event",
        }
    }
}

/// Partial contact body for create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subscribed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ContactSource>,
}

impl ContactDraft {
    pub fn is_empty(&self) -> bool {
        *self == ContactDraft::default()
    }

    /// A new contact needs a valid email address.
    pub fn validate_for_create(&self) -> Result<()> {
        match self.email.as_deref() {
            Some(email) => validate_email(email),
            None => Err(crate::error::MailboardError::InvalidInput(
                "a contact needs an email address".to_string(),
            )),
        }
    }

    /// An update must change something, and any email it sets must be valid.
    pub fn validate_for_update(&self) -> Result<()> {
        if self.is_empty() {
            return Err(crate::error::MailboardError::InvalidInput(
                "nothing to update".to_string(),
            ));
        }
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        Ok(())
    }
}

impl Serialize for ContactSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContactSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTACT_JSON: &str = r#"{
        "id": "c-1",
        "email": "ada@acme.io",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "company": "Acme",
        "createdAt": "2026-01-05T10:00:00Z",
        "updatedAt": "2026-01-06T10:00:00Z",
        "isSubscribed": true,
        "tags": ["vip"],
        "source": "referral"
    }"#;

    #[test]
    fn test_deserialize_wire_shape() {
        let contact: Contact = serde_json::from_str(CONTACT_JSON).unwrap();
        assert_eq!(contact.id(), "c-1");
        assert_eq!(contact.full_name(), "Ada Lovelace");
        assert!(contact.is_subscribed);
        assert_eq!(contact.source_kind(), Some(ContactSource::Referral));
        assert!(contact.title.is_none());
    }

    #[test]
    fn test_unknown_source_is_kept_raw() {
        let contact: Contact =
            serde_json::from_str(r#"{"id":"c-2","email":"x@y.io","source":"podcast"}"#).unwrap();
        assert_eq!(contact.source.as_deref(), Some("podcast"));
        assert_eq!(contact.source_kind(), None);
        assert_eq!(contact.full_name(), "");
    }

    #[test]
    fn test_draft_serializes_only_set_fields() {
        let draft = ContactDraft {
            first_name: Some("Grace".to_string()),
            is_subscribed: Some(false),
            source: Some(ContactSource::Event),
            ..Default::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"firstName": "Grace", "isSubscribed": false, "source": "event"})
        );
    }

    #[test]
    fn test_draft_validation() {
        assert!(ContactDraft::default().validate_for_create().is_err());
        assert!(ContactDraft::default().validate_for_update().is_err());

        let draft = ContactDraft {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(draft.validate_for_create().is_err());

        let draft = ContactDraft {
            email: Some("grace@navy.mil".to_string()),
            ..Default::default()
        };
        assert!(draft.validate_for_create().is_ok());
        assert!(draft.validate_for_update().is_ok());
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(ContactSource::Social.label(), "Social Media");
        assert_eq!(ContactSource::ALL.len(), 5);
    }
}
