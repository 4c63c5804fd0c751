use serde::{Deserialize, Serialize};

use crate::list::metrics::{self, Metric};

use super::Record;

/// An ad campaign with raw delivery counts.
///
/// Budget and spend are whole currency units. Rates are derived from the
/// counts on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub status: CampaignStatus,
    pub budget: u64,
    pub spent: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub created_at: String,
}

impl Campaign {
    /// Click-through rate, in percent.
    pub fn ctr(&self) -> Metric {
        metrics::click_through_rate(self.clicks, self.impressions)
    }

    /// Cost per click, in currency units.
    pub fn cpc(&self) -> Metric {
        metrics::cost_per_click(self.spent, self.clicks)
    }

    /// Conversions per click, in percent.
    pub fn conversion_rate(&self) -> Metric {
        metrics::conversion_rate(self.conversions, self.clicks)
    }

    /// Spend has passed 90% of budget.
    pub fn near_budget(&self) -> bool {
        self.spent.saturating_mul(10) > self.budget.saturating_mul(9)
    }
}

impl Record for Campaign {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Google,
    TikTok,
    X,
    LinkedIn,
}

filter_enum!(Platform, "platform", {
    Facebook => "Facebook",
    Google => "Google",
    TikTok => "TikTok",
    X => "X",
    LinkedIn => "LinkedIn",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Completed,
}

filter_enum!(CampaignStatus, "status", {
    Active => "active",
    Paused => "paused",
    Completed => "completed",
});
