//! Client patience: a per-order countdown mapped to a discrete urgency level.
//!
//! `remaining = max(0, 1 - elapsed / max_duration)`.
//!
//! | Level | remaining |
//! |-------|-----------|
//! | `Calm` | >= 0.60 |
//! | `Nervous` | 0.30 ..< 0.60 |
//! | `Impatient` | 0.10 ..< 0.30 |
//! | `Desperate` | 0 ..< 0.10 (exclusive of 0) |
//! | `Abandoned` | <= 0 |
//!
//! The level only ever moves toward `Abandoned`. Each level carries a
//! fail-rate penalty in percent applied when the order is resolved.

use serde::{Deserialize, Serialize};

use crate::constants::urgency as defaults;
use crate::error::{ClockError, ConfigError};

/// Urgency level, ordered from calmest to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    Calm,
    Nervous,
    Impatient,
    Desperate,
    /// Terminal. An incomplete order here is force-resolved.
    Abandoned,
}

impl UrgencyLevel {
    pub const ALL: [UrgencyLevel; 5] = [
        UrgencyLevel::Calm,
        UrgencyLevel::Nervous,
        UrgencyLevel::Impatient,
        UrgencyLevel::Desperate,
        UrgencyLevel::Abandoned,
    ];
}

/// Fail-rate penalty in percent for each urgency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyPenalties {
    pub calm: f32,
    pub nervous: f32,
    pub impatient: f32,
    pub desperate: f32,
    pub abandoned: f32,
}

impl Default for UrgencyPenalties {
    fn default() -> Self {
        Self {
            calm: defaults::CALM_PENALTY,
            nervous: defaults::NERVOUS_PENALTY,
            impatient: defaults::IMPATIENT_PENALTY,
            desperate: defaults::DESPERATE_PENALTY,
            abandoned: defaults::ABANDONED_PENALTY,
        }
    }
}

/// Level thresholds and penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyConfig {
    pub nervous_below: f32,
    pub impatient_below: f32,
    pub desperate_below: f32,
    pub penalties: UrgencyPenalties,
}

impl Default for UrgencyConfig {
    fn default() -> Self {
        Self {
            nervous_below: defaults::NERVOUS_BELOW,
            impatient_below: defaults::IMPATIENT_BELOW,
            desperate_below: defaults::DESPERATE_BELOW,
            penalties: UrgencyPenalties::default(),
        }
    }
}

impl UrgencyConfig {
    /// Level for a remaining-time fraction, ignoring history.
    pub fn level_for(&self, remaining: f32) -> UrgencyLevel {
        if remaining <= 0.0 {
            UrgencyLevel::Abandoned
        } else if remaining < self.desperate_below {
            UrgencyLevel::Desperate
        } else if remaining < self.impatient_below {
            UrgencyLevel::Impatient
        } else if remaining < self.nervous_below {
            UrgencyLevel::Nervous
        } else {
            UrgencyLevel::Calm
        }
    }

    pub fn penalty(&self, level: UrgencyLevel) -> f32 {
        let p = &self.penalties;
        match level {
            UrgencyLevel::Calm => p.calm,
            UrgencyLevel::Nervous => p.nervous,
            UrgencyLevel::Impatient => p.impatient,
            UrgencyLevel::Desperate => p.desperate,
            UrgencyLevel::Abandoned => p.abandoned,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = 0.0 < self.desperate_below
            && self.desperate_below <= self.impatient_below
            && self.impatient_below <= self.nervous_below
            && self.nervous_below <= 1.0;
        if !ordered {
            return Err(ConfigError::invalid(
                "urgency",
                format!(
                    "thresholds must satisfy 0 < desperate <= impatient <= nervous <= 1, got {} / {} / {}",
                    self.desperate_below, self.impatient_below, self.nervous_below
                ),
            ));
        }
        for level in UrgencyLevel::ALL {
            let penalty = self.penalty(level);
            if !(0.0..=100.0).contains(&penalty) {
                return Err(ConfigError::invalid(
                    "urgency.penalties",
                    format!("{:?} penalty {} outside 0..=100", level, penalty),
                ));
            }
        }
        Ok(())
    }
}

/// Countdown for a single order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyClock {
    max_duration: f32,
    elapsed: f32,
    level: UrgencyLevel,
}

impl UrgencyClock {
    pub fn new(max_duration: f32) -> Result<Self, ClockError> {
        if !max_duration.is_finite() || max_duration <= 0.0 {
            return Err(ClockError::InvalidDuration(max_duration));
        }
        Ok(Self {
            max_duration,
            elapsed: 0.0,
            level: UrgencyLevel::Calm,
        })
    }

    /// Add `delta_seconds` and recompute the level. Never moves to a calmer level.
    pub fn advance(&mut self, delta_seconds: f32, config: &UrgencyConfig) -> UrgencyLevel {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.elapsed += delta_seconds;
        }
        let computed = config.level_for(self.remaining_fraction());
        self.level = self.level.max(computed);
        self.level
    }

    /// Jump straight to `Abandoned` (client walked out).
    pub fn force_abandon(&mut self) {
        self.elapsed = self.elapsed.max(self.max_duration);
        self.level = UrgencyLevel::Abandoned;
    }

    pub fn remaining_fraction(&self) -> f32 {
        (1.0 - self.elapsed / self.max_duration).max(0.0)
    }

    pub fn remaining_seconds(&self) -> f32 {
        (self.max_duration - self.elapsed).max(0.0)
    }

    pub fn level(&self) -> UrgencyLevel {
        self.level
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn max_duration(&self) -> f32 {
        self.max_duration
    }

    pub fn is_abandoned(&self) -> bool {
        self.level == UrgencyLevel::Abandoned
    }
}
