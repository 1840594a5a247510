//! Engagement configuration with configurable limits
//!
//! All limits load from a config file rather than being hardcoded, so
//! production tuning needs no recompilation.

use engex_core::{Credits, CreditsError};
use serde::{Deserialize, Serialize};

/// Configuration for the engagement lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Maximum engagements one performer may create per UTC day
    #[serde(default = "default_daily_cap")]
    pub daily_cap: usize,

    /// Minutes a claimed engagement may sit unsettled before the reaper
    /// retires it as expired
    #[serde(default = "default_settlement_timeout_minutes")]
    pub settlement_timeout_minutes: i64,

    /// Days a post stays open before expiring
    #[serde(default = "default_post_ttl_days")]
    pub post_ttl_days: i64,

    /// Failures after which a (performer, post) pair may no longer re-claim
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Credits an owner pays per requested engagement;
    /// post cost = fee x max_engagements
    #[serde(default = "default_fee_per_engagement")]
    pub fee_per_engagement: Credits,

    /// Credits a performer earns per completed engagement
    #[serde(default = "default_reward_per_engagement")]
    pub reward_per_engagement: Credits,
}

// Default value functions for serde
fn default_daily_cap() -> usize {
    50
}

fn default_settlement_timeout_minutes() -> i64 {
    30
}

fn default_post_ttl_days() -> i64 {
    7
}

fn default_max_retries() -> u32 {
    3
}

fn default_fee_per_engagement() -> Credits {
    Credits::new(1)
}

fn default_reward_per_engagement() -> Credits {
    Credits::new(1)
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
            settlement_timeout_minutes: default_settlement_timeout_minutes(),
            post_ttl_days: default_post_ttl_days(),
            max_retries: default_max_retries(),
            fee_per_engagement: default_fee_per_engagement(),
            reward_per_engagement: default_reward_per_engagement(),
        }
    }
}

impl EngagementConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Settlement timeout as chrono Duration
    pub fn settlement_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.settlement_timeout_minutes)
    }

    /// Post time-to-live as chrono Duration
    pub fn post_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.post_ttl_days)
    }

    /// Credits debited for a post requesting `max_engagements` engagements
    pub fn post_cost(&self, max_engagements: u32) -> Result<Credits, CreditsError> {
        self.fee_per_engagement.checked_mul(max_engagements)
    }
}
