//! Campaign commands.
//!
//! Campaigns come from the built-in generator, so neither command needs a
//! session.

use owo_colors::OwoColorize;
use serde_json::Value;

use super::{CommandOutput, Listable, filters_from, initial_controller, run_list};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display::{self, campaigns_table};
use crate::error::{MailboardError, Result};
use crate::list::ListView;
use crate::model::Campaign;
use crate::query::CampaignFilters;
use crate::repository::CampaignRepository;

impl Listable for Campaign {
    const NOUN: &'static str = "campaigns";

    fn table(items: &[Self]) -> String {
        campaigns_table(items)
    }

    fn to_json(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert("ctr".to_string(), serde_json::to_value(self.ctr())?);
            map.insert("cpc".to_string(), serde_json::to_value(self.cpc())?);
            map.insert(
                "conversionRate".to_string(),
                serde_json::to_value(self.conversion_rate())?,
            );
        }
        Ok(value)
    }
}

pub async fn cmd_campaigns_ls(
    page: u32,
    search: Option<&str>,
    platform: Option<&str>,
    status: Option<&str>,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let repo = CampaignRepository::demo(config.cache_options());

    let filters: CampaignFilters = filters_from(&[("platform", platform), ("status", status)])?;
    let controller = initial_controller(config.list.page_size, page, search, filters)?;
    let view = ListView::with_controller(
        repo.cache().pages().clone(),
        controller,
        config.search_debounce(),
    );
    run_list(view, output).await
}

pub async fn cmd_campaigns_show(id: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let repo = CampaignRepository::demo(config.cache_options());
    let campaign = repo.cache().get(id).await.map_err(|e| match e {
        MailboardError::Api(err) if err.is_not_found() => {
            MailboardError::InvalidInput(format!("no campaign with id '{id}'"))
        }
        other => other,
    })?;

    let spent = display::format_currency(campaign.spent);
    let spent = if campaign.near_budget() {
        spent.red().to_string()
    } else {
        spent
    };
    let lines = [
        ("platform", campaign.platform.to_string()),
        ("status", display::format_status_colored(campaign.status)),
        ("budget", display::format_currency(campaign.budget)),
        ("spent", spent),
        ("impressions", display::group_thousands(campaign.impressions)),
        ("clicks", display::group_thousands(campaign.clicks)),
        ("conversions", display::group_thousands(campaign.conversions)),
        ("ctr", format!("{}%", campaign.ctr())),
        (
            "cpc",
            match campaign.cpc().value() {
                Some(v) => format!("${v}"),
                None => campaign.cpc().to_string(),
            },
        ),
        ("conversion rate", format!("{}%", campaign.conversion_rate())),
        ("created", display::format_date(&campaign.created_at)),
    ];

    let mut text = format!("{} {}\n", campaign.name.bold(), campaign.id.dimmed());
    for (label, value) in lines {
        text.push_str(&format!("  {}: {value}\n", label.cyan()));
    }

    CommandOutput::new(campaign.to_json()?)
        .with_text(text.trim_end())
        .print(output)
}
