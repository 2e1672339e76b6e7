use std::path::Path;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_PREFIX: &str = "POCKETPLAN_";

/// Whether planned intents are executed right away or handed back for
/// confirmation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Confirm,
    Auto,
}

impl FromStr for ExecutionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirm" => Ok(ExecutionMode::Confirm),
            "auto" | "execute" => Ok(ExecutionMode::Auto),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Minimum command probability for the binary classifier.
    pub command_threshold: f32,
    pub execution_mode: ExecutionMode,
    pub default_currency: String,
    /// Timezone name handed to the schedule store.
    pub timezone: String,
    /// Offset used to compute the user's local "today".
    pub utc_offset_minutes: i32,
    pub recent_items_limit: usize,
    pub default_task_minutes: u32,
    /// Attach the planner trace to responses.
    pub debug_trace: bool,
    /// Base URL of the hosted document store. `None` means in-memory stores.
    pub store_url: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            command_threshold: 0.6,
            execution_mode: ExecutionMode::Confirm,
            default_currency: "USD".to_string(),
            timezone: "UTC".to_string(),
            utc_offset_minutes: 0,
            recent_items_limit: 5,
            default_task_minutes: 30,
            debug_trace: false,
            store_url: None,
        }
    }
}

impl AssistantConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults overlaid with any `POCKETPLAN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Applies overrides from an arbitrary lookup; `from_env` passes the
    /// process environment.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("COMMAND_THRESHOLD") {
            self.command_threshold = parse_value("COMMAND_THRESHOLD", &v)?;
            if !(0.0..=1.0).contains(&self.command_threshold) {
                return Err(ConfigError::InvalidValue { key: "COMMAND_THRESHOLD", value: v });
            }
        }
        if let Some(v) = lookup("EXECUTION_MODE") {
            self.execution_mode = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "EXECUTION_MODE", value: v.clone() })?;
        }
        if let Some(v) = lookup("DEFAULT_CURRENCY") {
            self.default_currency = v.trim().to_ascii_uppercase();
        }
        if let Some(v) = lookup("TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = lookup("UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = parse_value("UTC_OFFSET_MINUTES", &v)?;
        }
        if let Some(v) = lookup("RECENT_ITEMS_LIMIT") {
            self.recent_items_limit = parse_value("RECENT_ITEMS_LIMIT", &v)?;
        }
        if let Some(v) = lookup("DEFAULT_TASK_MINUTES") {
            self.default_task_minutes = parse_value("DEFAULT_TASK_MINUTES", &v)?;
        }
        if let Some(v) = lookup("DEBUG_TRACE") {
            self.debug_trace = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("STORE_URL") {
            self.store_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        Ok(self)
    }

    fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Local wall-clock time for the configured offset.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset()).naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value: value.to_string() })
}
