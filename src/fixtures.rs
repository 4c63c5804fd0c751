//! Deterministic demo data.
//!
//! Campaigns have no remote endpoint and are always served from
//! [`generate_campaigns`]. The demo inbox, demo contacts and demo
//! credentials exist for tests and offline use only; production sign-in
//! always goes through the API.

use jiff::{SignedDuration, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Campaign, CampaignStatus, Contact, ContactSource, Email, Platform, User};

/// Number of campaigns the dashboard shows.
pub const DEFAULT_CAMPAIGN_COUNT: usize = 150;

/// Seed used by the CLI so repeated runs show the same campaigns.
pub const DEFAULT_SEED: u64 = 0x6d61_696c;

pub const DEMO_EMAIL: &str = "admin@example.com";
pub const DEMO_PASSWORD: &str = "password";

/// Creation dates are spread over this many days before the anchor.
const CAMPAIGN_AGE_DAYS: i64 = 90;

/// Fixed anchor so generated data is identical across runs.
const FIXTURE_ANCHOR: &str = "2026-10-01T00:00:00Z";

pub fn demo_user() -> User {
    User {
        id: "1".to_string(),
        email: DEMO_EMAIL.to_string(),
        name: "Admin User".to_string(),
    }
}

fn anchor() -> Timestamp {
    FIXTURE_ANCHOR.parse().unwrap_or(Timestamp::UNIX_EPOCH)
}

/// Generate `count` campaigns from `seed`, dated before a fixed anchor.
pub fn generate_campaigns(count: usize, seed: u64) -> Vec<Campaign> {
    generate_campaigns_at(count, seed, anchor())
}

/// Generate `count` campaigns from `seed`, dated in the 90 days before `now`.
///
/// Spend is 20-100% of budget, clicks 1-6% of impressions, and
/// conversions 2-12% of clicks.
pub fn generate_campaigns_at(count: usize, seed: u64, now: Timestamp) -> Vec<Campaign> {
    let mut rng = StdRng::seed_from_u64(seed);

    (1..=count)
        .map(|i| {
            let platform = Platform::ALL[rng.random_range(0..Platform::ALL.len())];
            let status = CampaignStatus::ALL[rng.random_range(0..CampaignStatus::ALL.len())];
            let budget: u64 = rng.random_range(1_000..11_000);
            let spent = (budget as f64 * rng.random_range(0.2..1.0)) as u64;
            let impressions: u64 = rng.random_range(10_000..110_000);
            let clicks = (impressions as f64 * rng.random_range(0.01..0.06)) as u64;
            let conversions = (clicks as f64 * rng.random_range(0.02..0.12)) as u64;
            let age = SignedDuration::from_secs(rng.random_range(0..CAMPAIGN_AGE_DAYS * 86_400));
            let created_at = now
                .checked_sub(age)
                .unwrap_or(now)
                .to_string();

            Campaign {
                id: format!("campaign-{i}"),
                name: format!("Campaign {i} - {platform}"),
                platform,
                status,
                budget,
                spent,
                impressions,
                clicks,
                conversions,
                created_at,
            }
        })
        .collect()
}

fn email(
    id: &str,
    sender: &str,
    subject: &str,
    timestamp: &str,
    (is_starred, is_read, is_important): (bool, bool, bool),
    label: &str,
) -> Email {
    Email {
        id: id.to_string(),
        sender: sender.to_string(),
        subject: subject.to_string(),
        preview: subject.to_string(),
        timestamp: timestamp.to_string(),
        is_read,
        is_starred,
        is_important,
        labels: vec![label.to_string()],
        attachments: None,
    }
}

/// The seven-message demo inbox.
pub fn demo_inbox() -> Vec<Email> {
    let sale = "New sale of Dashmaster - Tailwind Dashboard for $29";
    vec![
        email(
            "1",
            "Nuno Affiliate",
            "Your application to the Nuno Affiliate Network...",
            "8:27 AM",
            (true, false, true),
            "affiliate",
        ),
        email(
            "2",
            "Michael Adams",
            "Invitation to the company anniversary party...",
            "5:17 AM",
            (true, false, false),
            "invitation",
        ),
        email(
            "3",
            "Bunny Cms",
            "Added a new features: Dinamic database...",
            "3:14 AM",
            (true, false, false),
            "feature",
        ),
        email(
            "4",
            "Giant Seo",
            "Ranking 1st in organic and Local Pack SERPs...",
            "2:15 AM",
            (true, false, false),
            "ranking",
        ),
        email("5", "Tailwind Market", sale, "1:27 AM", (false, true, false), "sale"),
        email("6", "Tailwind Market", sale, "Yesterday", (false, true, false), "sale"),
        email(
            "7",
            "Stock Image",
            "How did you use these downloads?",
            "Yesterday",
            (true, true, false),
            "stock",
        ),
    ]
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Margaret", "Ken", "Frances", "Dennis",
];
const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Hamilton", "Thompson",
    "Allen", "Ritchie",
];
const COMPANIES: &[&str] = &["Acme", "Globex", "Initech", "Umbrella", "Hooli", "Stark"];
const TAGS: &[&str] = &["vip", "newsletter", "trial", "partner", "churn-risk"];

/// Generate `count` contacts from `seed`.
pub fn demo_contacts(count: usize, seed: u64) -> Vec<Contact> {
    let mut rng = StdRng::seed_from_u64(seed);
    let now = anchor();

    (1..=count)
        .map(|i| {
            let first = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
            let last = LAST_NAMES[rng.random_range(0..LAST_NAMES.len())];
            let company = COMPANIES[rng.random_range(0..COMPANIES.len())];
            let source = ContactSource::ALL[rng.random_range(0..ContactSource::ALL.len())];
            let created = now
                .checked_sub(SignedDuration::from_hours(rng.random_range(24..24 * 365)))
                .unwrap_or(now);
            let tag_count = rng.random_range(0..=2);
            let tags = (0..tag_count)
                .map(|_| TAGS[rng.random_range(0..TAGS.len())].to_string())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();

            Contact {
                id: format!("contact-{i}"),
                email: format!(
                    "{}.{}{i}@{}.com",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    company.to_lowercase()
                ),
                first_name: first.to_string(),
                last_name: last.to_string(),
                company: Some(company.to_string()),
                title: None,
                created_at: created.to_string(),
                updated_at: created.to_string(),
                is_subscribed: rng.random_bool(0.7),
                tags,
                last_engagement: None,
                source: Some(source.as_str().to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaigns_are_deterministic() {
        assert_eq!(generate_campaigns(20, 1), generate_campaigns(20, 1));
        assert_ne!(generate_campaigns(20, 1), generate_campaigns(20, 2));
    }

    #[test]
    fn test_campaign_ranges() {
        let campaigns = generate_campaigns(DEFAULT_CAMPAIGN_COUNT, DEFAULT_SEED);
        assert_eq!(campaigns.len(), 150);
        assert_eq!(campaigns[0].id, "campaign-1");
        assert_eq!(campaigns[149].id, "campaign-150");

        let anchor = anchor();
        for c in &campaigns {
            assert!((1_000..11_000).contains(&c.budget));
            assert!(c.spent <= c.budget && c.spent * 5 >= c.budget - 5);
            assert!((10_000..110_000).contains(&c.impressions));
            assert!(c.clicks >= c.impressions / 100 - 1 && c.clicks <= c.impressions * 6 / 100);
            assert!(c.conversions <= c.clicks);
            assert!(c.name.ends_with(c.platform.as_str()));
            let created: Timestamp = c.created_at.parse().unwrap();
            assert!(created <= anchor);
        }
    }

    #[test]
    fn test_demo_inbox_matches_folders() {
        let inbox = demo_inbox();
        assert_eq!(inbox.len(), 7);
        assert_eq!(inbox.iter().filter(|e| e.is_starred).count(), 5);
        assert_eq!(inbox.iter().filter(|e| e.is_important).count(), 1);
        assert_eq!(inbox.iter().filter(|e| !e.is_read).count(), 4);
    }

    #[test]
    fn test_demo_contacts_are_valid() {
        let contacts = demo_contacts(25, 3);
        assert_eq!(contacts.len(), 25);
        for c in &contacts {
            assert!(crate::utils::validation::validate_email(&c.email).is_ok());
            assert!(c.source_kind().is_some());
        }
        assert_eq!(contacts, demo_contacts(25, 3));
    }
}
