//! Console configuration.

use std::env;

use anyhow::Context;
use calendar::YearMonth;
use user_store::{MemoryUserTransport, TransportLatency};

/// Console configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Multiplier applied to the mock transport latency. Zero disables it.
    pub latency_scale: f64,
    /// Whether the mock transport starts with the demo users.
    pub seed_users: bool,
    /// Month shown by the calendar demo. Defaults to the current month.
    pub calendar_month: Option<YearMonth>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            latency_scale: 1.0,
            seed_users: true,
            calendar_month: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let calendar_month = lookup("SCAFFOLD_CALENDAR_MONTH")
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                v.parse::<YearMonth>()
                    .with_context(|| format!("SCAFFOLD_CALENDAR_MONTH is invalid: {v}"))
            })
            .transpose()?;

        Ok(Self {
            log_level: lookup("SCAFFOLD_LOG_LEVEL").unwrap_or(defaults.log_level),
            latency_scale: lookup("SCAFFOLD_LATENCY_SCALE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.latency_scale),
            seed_users: lookup("SCAFFOLD_SEED_USERS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.seed_users),
            calendar_month,
        })
    }

    /// Returns the mock transport latency.
    pub fn latency(&self) -> TransportLatency {
        TransportLatency::default().scaled(self.latency_scale)
    }

    /// Builds the mock transport described by this configuration.
    pub fn transport(&self) -> MemoryUserTransport {
        let transport = if self.seed_users {
            MemoryUserTransport::with_mock_users()
        } else {
            MemoryUserTransport::new()
        };
        transport.with_latency(self.latency())
    }
}
