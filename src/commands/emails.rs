//! Inbox commands.

use clap::Args;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{AppContext, CommandOutput, Listable, filters_from, initial_controller, run_list};
use crate::cli::OutputOptions;
use crate::display::{self, emails_table};
use crate::error::{MailboardError, Result};
use crate::list::ListView;
use crate::model::{Email, EmailPatch};
use crate::query::EmailFilters;
use crate::repository::EmailRepository;

/// Flag changes for `emails mark`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct EmailFlags {
    #[arg(long, conflicts_with = "unread")]
    pub read: bool,

    #[arg(long)]
    pub unread: bool,

    #[arg(long, conflicts_with = "unstar")]
    pub star: bool,

    #[arg(long)]
    pub unstar: bool,

    #[arg(long, conflicts_with = "not_important")]
    pub important: bool,

    #[arg(long)]
    pub not_important: bool,
}

impl EmailFlags {
    pub fn to_patch(self) -> Result<EmailPatch> {
        let pick = |on: bool, off: bool| match (on, off) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        let patch = EmailPatch {
            is_read: pick(self.read, self.unread),
            is_starred: pick(self.star, self.unstar),
            is_important: pick(self.important, self.not_important),
            labels: None,
        };
        if patch.is_empty() {
            return Err(MailboardError::InvalidInput(
                "pass at least one of --read, --unread, --star, --unstar, --important, --not-important"
                    .to_string(),
            ));
        }
        Ok(patch)
    }
}

impl Listable for Email {
    const NOUN: &'static str = "emails";

    fn table(items: &[Self]) -> String {
        emails_table(items)
    }
}

fn repository(ctx: &AppContext) -> Result<EmailRepository> {
    Ok(EmailRepository::new(
        ctx.authenticated_client()?,
        ctx.config.cache_options(),
    ))
}

pub async fn cmd_emails_ls(
    folder: Option<&str>,
    page: u32,
    search: Option<&str>,
    output: OutputOptions,
) -> Result<()> {
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;

    let filters: EmailFilters = filters_from(&[("folder", folder)])?;
    let controller = initial_controller(ctx.config.list.page_size, page, search, filters)?;
    let view = ListView::with_controller(
        repo.cache().pages().clone(),
        controller,
        ctx.config.search_debounce(),
    );
    run_list(view, output).await
}

pub async fn cmd_emails_show(id: &str, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;
    let email = repo.cache().get(id).await?;

    let mut flags = Vec::new();
    if !email.is_read {
        flags.push("unread".bold().to_string());
    }
    if email.is_starred {
        flags.push("★ starred".yellow().to_string());
    }
    if email.is_important {
        flags.push("important".red().to_string());
    }

    let mut text = format!("{}\n", email.subject.bold());
    text.push_str(&format!("  {}: {}\n", "from".cyan(), email.sender));
    text.push_str(&format!(
        "  {}: {}\n",
        "time".cyan(),
        display::format_date(&email.timestamp)
    ));
    if !email.labels.is_empty() {
        text.push_str(&format!("  {}: {}\n", "labels".cyan(), email.labels.join(", ")));
    }
    if let Some(count) = email.attachments.filter(|n| *n > 0) {
        text.push_str(&format!("  {}: {count}\n", "attachments".cyan()));
    }
    if !flags.is_empty() {
        text.push_str(&format!("  {}\n", flags.join(" ")));
    }
    if !email.preview.is_empty() {
        text.push_str(&format!("\n{}", email.preview.dimmed()));
    }

    CommandOutput::new(email.to_json()?)
        .with_text(text.trim_end())
        .print(output)
}

pub async fn cmd_emails_mark(id: &str, flags: EmailFlags, output: OutputOptions) -> Result<()> {
    let patch = flags.to_patch()?;
    let ctx = AppContext::load()?;
    let repo = repository(&ctx)?;
    let email = repo.update(id, &patch).await?;

    CommandOutput::new(json!({ "action": "email_updated", "email": email }))
        .with_text(format!("{} Updated {}", "✓".green(), email.subject.bold()))
        .print(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_to_patch() {
        let flags = EmailFlags {
            read: true,
            unstar: true,
            ..Default::default()
        };
        let patch = flags.to_patch().unwrap();
        assert_eq!(patch.is_read, Some(true));
        assert_eq!(patch.is_starred, Some(false));
        assert_eq!(patch.is_important, None);
    }

    #[test]
    fn test_no_flags_is_an_error() {
        let err = EmailFlags::default().to_patch().unwrap_err();
        assert!(matches!(err, MailboardError::InvalidInput(_)));
    }
}
