//! Filter sets for each list.

use crate::error::Result;
use crate::model::{CampaignStatus, ContactSource, Platform};

use super::{FilterSet, parse_option, unknown_field};

/// Subscription state filter for contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    Subscribed,
    Unsubscribed,
}

filter_enum!(Subscription, "subscription", {
    Subscribed => "subscribed",
    Unsubscribed => "unsubscribed",
});

impl Subscription {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Subscription::Subscribed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContactFilters {
    pub source: Option<ContactSource>,
    pub subscription: Option<Subscription>,
}

impl FilterSet for ContactFilters {
    const FIELDS: &'static [&'static str] = &["source", "subscription"];

    fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "source" => self.source = parse_option(value)?,
            "subscription" => self.subscription = parse_option(value)?,
            _ => return Err(unknown_field(field, Self::FIELDS)),
        }
        Ok(())
    }

    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(source) = self.source {
            params.push(("source".to_string(), source.as_str().to_string()));
        }
        if let Some(subscription) = self.subscription {
            params.push((
                "isSubscribed".to_string(),
                subscription.is_subscribed().to_string(),
            ));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CampaignFilters {
    pub platform: Option<Platform>,
    pub status: Option<CampaignStatus>,
}

impl FilterSet for CampaignFilters {
    const FIELDS: &'static [&'static str] = &["platform", "status"];

    fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "platform" => self.platform = parse_option(value)?,
            "status" => self.status = parse_option(value)?,
            _ => return Err(unknown_field(field, Self::FIELDS)),
        }
        Ok(())
    }

    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(platform) = self.platform {
            params.push(("platform".to_string(), platform.as_str().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status".to_string(), status.as_str().to_string()));
        }
        params
    }
}

/// Mailbox folder. `Inbox` shows everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmailFolder {
    #[default]
    Inbox,
    Starred,
    Important,
    Sent,
    Drafts,
    Trash,
}

filter_enum!(EmailFolder, "folder", {
    Inbox => "inbox",
    Starred => "starred",
    Important => "important",
    Sent => "sent",
    Drafts => "drafts",
    Trash => "trash",
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EmailFilters {
    pub folder: EmailFolder,
}

impl FilterSet for EmailFilters {
    const FIELDS: &'static [&'static str] = &["folder"];

    fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "folder" => self.folder = parse_option(value)?.unwrap_or_default(),
            _ => return Err(unknown_field(field, Self::FIELDS)),
        }
        Ok(())
    }

    fn to_params(&self) -> Vec<(String, String)> {
        match self.folder {
            EmailFolder::Inbox => Vec::new(),
            folder => vec![("filter".to_string(), folder.as_str().to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailboardError;

    #[test]
    fn test_contact_filters_parse_and_params() {
        let filters =
            ContactFilters::parse([("source", "Referral"), ("subscription", "subscribed")])
                .unwrap();
        assert_eq!(filters.source, Some(ContactSource::Referral));
        assert!(filters.is_active());
        assert_eq!(
            filters.to_params(),
            vec![
                ("source".to_string(), "referral".to_string()),
                ("isSubscribed".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_all_clears_a_field() {
        let mut filters = ContactFilters::parse([("source", "event")]).unwrap();
        filters.set_field("source", "all").unwrap();
        assert_eq!(filters, ContactFilters::default());
        assert!(!filters.is_active());
        assert!(filters.to_params().is_empty());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = CampaignFilters::parse([("budget", "100")]).unwrap_err();
        match err {
            MailboardError::UnknownFilterField { field, expected } => {
                assert_eq!(field, "budget");
                assert_eq!(expected, "platform, status");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_domain_value_is_rejected() {
        let err = CampaignFilters::parse([("platform", "MySpace")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'MySpace' for filter 'platform'"
        );
    }

    #[test]
    fn test_campaign_params_use_wire_names() {
        let filters =
            CampaignFilters::parse([("platform", "linkedin"), ("status", "PAUSED")]).unwrap();
        assert_eq!(
            filters.to_params(),
            vec![
                ("platform".to_string(), "LinkedIn".to_string()),
                ("status".to_string(), "paused".to_string()),
            ]
        );
    }

    #[test]
    fn test_inbox_sends_no_filter() {
        assert!(EmailFilters::default().to_params().is_empty());
        assert!(!EmailFilters::default().is_active());

        let starred = EmailFilters::parse([("folder", "starred")]).unwrap();
        assert!(starred.is_active());
        assert_eq!(
            starred.to_params(),
            vec![("filter".to_string(), "starred".to_string())]
        );

        let reset = EmailFilters::parse([("folder", "starred"), ("folder", "all")]).unwrap();
        assert_eq!(reset.folder, EmailFolder::Inbox);
    }
}
