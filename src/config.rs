//! Runtime configuration, loaded from the process environment.
//!
//! All fields have typed defaults so a bare environment (no `NEWS_RELAY_*`
//! variables set) still produces a usable configuration for local/embedded
//! runs.

use std::time::Duration;

use serde::Deserialize;

fn default_batch_size() -> u32 {
    20
}

fn default_publish_interval_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_clean_age_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_filter_limit() -> u32 {
    100
}

/// Publisher/enqueue configuration, deserialized from `NEWS_RELAY_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Path to the SQLite database file (or `:memory:`).
    pub database_url: String,

    /// Discord-style webhook URL the publisher dispatches to.
    pub discord_webhook_url: Option<String>,

    /// Max items claimed per publisher iteration.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Idle sleep, in seconds, when a claim batch was empty.
    #[serde(default = "default_publish_interval_secs")]
    pub publish_interval_secs: u64,

    /// Gate on `retry`: items with `retry_count >= max_retries` stay FAILED.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// `clean` threshold, in seconds: COMPLETED rows older than this are deleted.
    #[serde(default = "default_clean_age_secs")]
    pub clean_age_secs: u64,

    /// Sweep-back threshold, in seconds, for stuck PROCESSING rows.
    /// Defaults to 10x `publish_interval_secs` when unset.
    pub stuck_threshold_secs: Option<u64>,

    /// Enqueue Service filters.
    pub filter_platforms: Option<Vec<String>>,
    pub filter_categories: Option<Vec<String>>,
    pub filter_hours: Option<i64>,
    #[serde(default = "default_filter_limit")]
    pub filter_limit: u32,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            database_url: "news_relay.db".to_string(),
            discord_webhook_url: None,
            batch_size: default_batch_size(),
            publish_interval_secs: default_publish_interval_secs(),
            max_retries: default_max_retries(),
            clean_age_secs: default_clean_age_secs(),
            stuck_threshold_secs: None,
            filter_platforms: None,
            filter_categories: None,
            filter_hours: None,
            filter_limit: default_filter_limit(),
        }
    }
}

impl PublisherConfig {
    /// Loads configuration from `NEWS_RELAY_*` environment variables,
    /// falling back to defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable cannot be deserialized into its
    /// target type (e.g. a non-numeric `NEWS_RELAY_BATCH_SIZE`).
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("NEWS_RELAY_").from_env::<Self>()
    }

    #[must_use]
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs)
    }

    #[must_use]
    pub fn clean_age(&self) -> Duration {
        Duration::from_secs(self.clean_age_secs)
    }

    #[must_use]
    pub fn stuck_threshold(&self) -> Duration {
        Duration::from_secs(
            self.stuck_threshold_secs
                .unwrap_or(self.publish_interval_secs.saturating_mul(10)),
        )
    }
}
