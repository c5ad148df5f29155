use serde::Deserialize;
use std::time::Duration;

use crate::streak::PerfectMonthRule;

/// Client settings, read from `PUZZLE_CLIENT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upload after this many correct answers. `0` disables the trigger.
    pub sync_every_correct: u32,
    /// Most entries sent in one sync; must not exceed the server's limit.
    pub sync_max_batch: usize,
    pub request_timeout_secs: u64,
    /// SQLite file for the activity log; in-memory when unset.
    pub store_path: Option<String>,
    pub perfect_month_rule: PerfectMonthRule,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            sync_every_correct: 5,
            sync_max_batch: crate::sync::DEFAULT_MAX_BATCH,
            request_timeout_secs: 10,
            store_path: None,
            perfect_month_rule: PerfectMonthRule::default(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = ClientConfig::default();

        config::Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("sync_every_correct", defaults.sync_every_correct)?
            .set_default("sync_max_batch", defaults.sync_max_batch as u64)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("perfect_month_rule", "full_month")?
            .add_source(config::Environment::with_prefix("PUZZLE_CLIENT").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
