//! Contact commands.
//!
//! - `contacts ls`: one page of contacts with search and filters
//! - `contacts show`: a single contact
//! - `contacts add` / `update` / `rm`: mutations that keep cached lists in step

use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{AppContext, CommandOutput, Listable, filters_from, initial_controller, run_list};
use crate::cli::{OutputOptions, parse_contact_source, parse_subscription};
use crate::display::{self, contacts_table};
use crate::error::Result;
use crate::list::ListView;
use crate::model::{Contact, ContactDraft};
use crate::query::ContactFilters;
use crate::repository::ContactRepository;

#[derive(Args, Debug, Clone, Default)]
pub struct ContactListArgs {
    /// Page to show (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Match against name, email and company
    #[arg(long, short)]
    pub search: Option<String>,

    /// Only contacts from this source
    #[arg(long, value_parser = parse_contact_source)]
    pub source: Option<String>,

    /// subscribed or unsubscribed
    #[arg(long, value_parser = parse_subscription)]
    pub subscription: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ContactFields {
    /// New email address (update only; `add` takes it as an argument)
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, value_parser = parse_contact_source)]
    pub source: Option<String>,

    /// true or false
    #[arg(long)]
    pub subscribed: Option<bool>,

    /// Comma-separated; replaces the existing tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
}

impl ContactFields {
    pub fn to_draft(&self) -> Result<ContactDraft> {
        Ok(ContactDraft {
            email: self.email.as_deref().map(|e| e.trim().to_string()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            company: self.company.clone(),
            title: self.title.clone(),
            is_subscribed: self.subscribed,
            tags: self.tags.clone(),
            source: self
                .source
                .as_deref()
                .filter(|s| !s.eq_ignore_ascii_case("all"))
                .map(str::parse)
                .transpose()?,
        })
    }
}

impl Listable for Contact {
    const NOUN: &'static str = "contacts";

    fn table(items: &[Self]) -> String {
        contacts_table(items)
    }
}

fn repository(ctx: &AppContext) -> Result<ContactRepository> {
    Ok(ContactRepository::new(
        ctx.authenticated_client()?,
        ctx.config.cache_options(),
    ))
}

pub async fn cmd_contacts_ls(args: ContactListArgs, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;

    let filters: ContactFilters = filters_from(&[
        ("source", args.source.as_deref()),
        ("subscription", args.subscription.as_deref()),
    ])?;
    let controller = initial_controller(
        ctx.config.list.page_size,
        args.page,
        args.search.as_deref(),
        filters,
    )?;
    let view = ListView::with_controller(
        repo.cache().pages().clone(),
        controller,
        ctx.config.search_debounce(),
    );
    run_list(view, output).await
}

pub async fn cmd_contacts_show(id: &str, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;
    let contact = repo.cache().get(id).await?;

    let mut text = format!(
        "{} {}\n",
        contact.full_name().bold(),
        format!("<{}>", contact.email).dimmed()
    );
    let fields = [
        ("id", Some(contact.id.clone())),
        ("company", contact.company.clone()),
        ("title", contact.title.clone()),
        (
            "source",
            contact
                .source_kind()
                .map(|s| s.label().to_string())
                .or_else(|| contact.source.clone()),
        ),
        ("subscribed", Some(contact.is_subscribed.to_string())),
        (
            "tags",
            (!contact.tags.is_empty()).then(|| contact.tags.join(", ")),
        ),
        ("created", Some(display::format_date(&contact.created_at))),
        (
            "last engagement",
            contact.last_engagement.as_deref().map(display::format_date),
        ),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            text.push_str(&format!("  {}: {value}\n", label.cyan()));
        }
    }

    CommandOutput::new(contact.to_json()?)
        .with_text(text.trim_end())
        .print(output)
}

pub async fn cmd_contacts_add(
    address: &str,
    mut fields: ContactFields,
    output: OutputOptions,
) -> Result<()> {
    fields.email = Some(address.to_string());
    let draft = fields.to_draft()?;
    draft.validate_for_create()?;

    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;
    let contact = repo.create(&draft).await?;

    CommandOutput::new(json!({ "action": "contact_created", "contact": contact }))
        .with_text(format!(
            "{} Created contact {} ({})",
            "✓".green(),
            contact.email.bold(),
            contact.id
        ))
        .print(output)
}

pub async fn cmd_contacts_update(
    id: &str,
    fields: ContactFields,
    output: OutputOptions,
) -> Result<()> {
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;
    let contact = repo.update(id, &fields.to_draft()?).await?;

    CommandOutput::new(json!({ "action": "contact_updated", "contact": contact }))
        .with_text(format!("{} Updated contact {}", "✓".green(), contact.id.cyan()))
        .print(output)
}

pub async fn cmd_contacts_rm(id: &str, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;
    repo.delete(id).await?;

    CommandOutput::new(json!({ "action": "contact_deleted", "id": id }))
        .with_text(format!("{} Deleted contact {}", "✓".green(), id.cyan()))
        .print(output)
}
