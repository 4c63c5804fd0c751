use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::model::{Campaign, Contact, Email};

use super::{format_currency, format_date, format_status_colored, group_thousands};

#[derive(Tabled)]
struct ContactRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Subscribed")]
    subscribed: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Contact> for ContactRow {
    fn from(c: &Contact) -> Self {
        Self {
            id: c.id.clone(),
            name: c.full_name(),
            email: c.email.clone(),
            company: c.company.clone().unwrap_or_else(|| "-".to_string()),
            source: c
                .source_kind()
                .map(|s| s.label().to_string())
                .or_else(|| c.source.clone())
                .unwrap_or_else(|| "-".to_string()),
            subscribed: if c.is_subscribed {
                "yes".green().to_string()
            } else {
                "no".dimmed().to_string()
            },
            created: format_date(&c.created_at),
        }
    }
}

#[derive(Tabled)]
struct CampaignRow {
    #[tabled(rename = "Campaign")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Budget")]
    budget: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Impressions")]
    impressions: String,
    #[tabled(rename = "Clicks")]
    clicks: String,
    #[tabled(rename = "CTR %")]
    ctr: String,
    #[tabled(rename = "CPC")]
    cpc: String,
    #[tabled(rename = "Conv.")]
    conversions: String,
}

impl From<&Campaign> for CampaignRow {
    fn from(c: &Campaign) -> Self {
        let spent = format_currency(c.spent);
        Self {
            name: c.name.clone(),
            status: format_status_colored(c.status),
            budget: format_currency(c.budget),
            spent: if c.near_budget() {
                spent.red().to_string()
            } else {
                spent
            },
            impressions: group_thousands(c.impressions),
            clicks: group_thousands(c.clicks),
            ctr: c.ctr().to_string(),
            cpc: match c.cpc().value() {
                Some(v) => format!("${v}"),
                None => c.cpc().to_string(),
            },
            conversions: group_thousands(c.conversions),
        }
    }
}

#[derive(Tabled)]
struct EmailRow {
    #[tabled(rename = "")]
    star: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "From")]
    sender: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl From<&Email> for EmailRow {
    fn from(e: &Email) -> Self {
        let star = if e.is_starred {
            "★".yellow().to_string()
        } else {
            "☆".dimmed().to_string()
        };
        let (sender, subject) = if e.is_read {
            (e.sender.clone(), e.subject.clone())
        } else {
            (e.sender.bold().to_string(), e.subject.bold().to_string())
        };
        Self {
            star,
            id: e.id.clone(),
            sender,
            subject: if e.is_important {
                format!("{} {subject}", "!".red())
            } else {
                subject
            },
            time: format_date(&e.timestamp),
        }
    }
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

pub fn contacts_table(contacts: &[Contact]) -> String {
    render(contacts.iter().map(ContactRow::from).collect())
}

pub fn campaigns_table(campaigns: &[Campaign]) -> String {
    render(campaigns.iter().map(CampaignRow::from).collect())
}

pub fn emails_table(emails: &[Email]) -> String {
    render(emails.iter().map(EmailRow::from).collect())
}
