//! Random client orders and their patience budget.
//!
//! Every order names one monster and one condition; with probability
//! `three_slot_chance` it also names an environment. Patience depends on the
//! shop's current debt tier.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, RequirementCatalog, RequirementId};
use crate::constants::{day, durations};
use crate::error::ConfigError;
use crate::ledger::DebtLevel;
use crate::order::OrderRequirements;

/// Seconds of patience per debt tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationTable {
    pub no_debt: f32,
    pub low_low: f32,
    pub low: f32,
    pub medium: f32,
    pub high: f32,
}

impl Default for DurationTable {
    fn default() -> Self {
        Self {
            no_debt: durations::NO_DEBT,
            low_low: durations::LOW_LOW_DEBT,
            low: durations::LOW_DEBT,
            medium: durations::MEDIUM_DEBT,
            high: durations::HIGH_DEBT,
        }
    }
}

impl DurationTable {
    pub fn duration_for(&self, level: DebtLevel) -> f32 {
        match level {
            DebtLevel::None => self.no_debt,
            DebtLevel::LowLow => self.low_low,
            DebtLevel::Low => self.low,
            DebtLevel::Medium => self.medium,
            DebtLevel::High => self.high,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let all = [self.no_debt, self.low_low, self.low, self.medium, self.high];
        if all.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(ConfigError::invalid(
                "durations",
                format!("all durations must be positive, got {:?}", all),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Probability that an order also names an environment.
    pub three_slot_chance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            three_slot_chance: day::THREE_SLOT_CHANCE,
        }
    }
}

/// A freshly drawn order, not yet admitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPlan {
    pub requirements: OrderRequirements,
    pub max_duration: f32,
}

#[derive(Debug, Clone, Default)]
pub struct OrderGenerator {
    pub config: GeneratorConfig,
    pub durations: DurationTable,
}

impl OrderGenerator {
    pub fn new(config: GeneratorConfig, durations: DurationTable) -> Self {
        Self { config, durations }
    }

    /// Draw requirements from the catalog. `None` only if the catalog has no
    /// monsters or no conditions.
    pub fn generate(
        &self,
        requirements: &RequirementCatalog,
        debt_level: DebtLevel,
        rng: &mut impl Rng,
    ) -> Option<OrderPlan> {
        let monster = pick(requirements, Category::Monster, rng)?;
        let condition = pick(requirements, Category::Condition, rng)?;
        // gen_bool panics outside 0..=1, NaN included
        let chance = if self.config.three_slot_chance.is_finite() {
            self.config.three_slot_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let environment = if rng.gen_bool(chance) {
            pick(requirements, Category::Environment, rng)
        } else {
            None
        };

        Some(OrderPlan {
            requirements: OrderRequirements::new(monster, condition, environment),
            max_duration: self.durations.duration_for(debt_level),
        })
    }
}

fn pick(
    requirements: &RequirementCatalog,
    category: Category,
    rng: &mut impl Rng,
) -> Option<RequirementId> {
    let ids: Vec<RequirementId> = requirements.in_category(category).map(|r| r.id).collect();
    ids.choose(rng).copied()
}
