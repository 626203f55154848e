//! All tuning in one place.
//!
//! `ShopConfig::default()` carries the stock values from [`crate::constants`].
//! A JSON file may override any subset; missing sections keep their
//! defaults.

use serde::{Deserialize, Serialize};

use crate::constants::day;
use crate::error::ConfigError;
use crate::generation::{DurationTable, GeneratorConfig};
use crate::ledger::LedgerConfig;
use crate::outcome::FailRateTable;
use crate::urgency::UrgencyConfig;

/// Trading-day pacing, used by the engine loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayConfig {
    /// Seconds until the shop stops admitting clients.
    pub day_length: f32,
    /// Seconds between client arrivals.
    pub spawn_interval: f32,
    /// Seconds a resolved client lingers before its slot frees. `None`
    /// leaves release to the host.
    pub release_delay: Option<f32>,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            day_length: day::DAY_LENGTH,
            spawn_interval: day::SPAWN_INTERVAL,
            release_delay: Some(day::RELEASE_DELAY),
        }
    }
}

impl DayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.day_length.is_finite() || self.day_length <= 0.0 {
            return Err(ConfigError::invalid(
                "day.day_length",
                format!("{} must be positive", self.day_length),
            ));
        }
        if !self.spawn_interval.is_finite() || self.spawn_interval <= 0.0 {
            return Err(ConfigError::invalid(
                "day.spawn_interval",
                format!("{} must be positive", self.spawn_interval),
            ));
        }
        if let Some(delay) = self.release_delay {
            if !delay.is_finite() || delay < 0.0 {
                return Err(ConfigError::invalid(
                    "day.release_delay",
                    format!("{} must be >= 0", delay),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub urgency: UrgencyConfig,
    pub fail_rates: FailRateTable,
    pub ledger: LedgerConfig,
    pub durations: DurationTable,
    pub generator: GeneratorConfig,
    pub day: DayConfig,
}

impl ShopConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ShopConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.urgency.validate()?;
        self.fail_rates.validate()?;
        self.ledger.validate()?;
        self.durations.validate()?;
        self.day.validate()?;
        if !(0.0..=1.0).contains(&self.generator.three_slot_chance) {
            return Err(ConfigError::invalid(
                "generator.three_slot_chance",
                format!("{} outside 0..=1", self.generator.three_slot_chance),
            ));
        }
        Ok(())
    }
}
