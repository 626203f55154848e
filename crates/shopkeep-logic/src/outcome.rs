//! Resolving a finished order into survival or death.
//!
//! The base fail rate comes from a table keyed by `(items_needed, correct)`.
//! The urgency penalty is added, the sum clamped to `0..=100`, and one
//! uniform roll in `[0, 100)` decides: the client survives iff the roll is
//! below `100 - total_fail_rate`.
//!
//! The roll is the only random step in the rules, so it goes through the
//! [`RandomSource`] trait and can be scripted.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::ItemCatalog;
use crate::compatibility::count_correct;
use crate::constants::fail_rates as defaults;
use crate::error::ConfigError;
use crate::order::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Survived,
    Died,
}

// ── Random source ───────────────────────────────────────────────────────

/// Uniform draws in `[0, 100)`.
pub trait RandomSource {
    fn roll_percent(&mut self) -> f32;
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngRoll<R>(pub R);

impl<R: Rng> RandomSource for RngRoll<R> {
    fn roll_percent(&mut self) -> f32 {
        self.0.gen_range(0.0..100.0)
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub f32);

impl RandomSource for FixedRoll {
    fn roll_percent(&mut self) -> f32 {
        self.0
    }
}

/// Returns queued values in order, then `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    rolls: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback,
        }
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for ScriptedRolls {
    fn roll_percent(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

// ── Fail-rate table ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FailRateEntry {
    pub items_needed: u8,
    pub correct: u8,
    /// Percent, `0..=100`.
    pub fail_rate: f32,
}

/// Base fail rate per `(items_needed, correct)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailRateTable {
    pub entries: Vec<FailRateEntry>,
}

impl Default for FailRateTable {
    fn default() -> Self {
        let entry = |items_needed, correct, fail_rate| FailRateEntry {
            items_needed,
            correct,
            fail_rate,
        };
        Self {
            entries: vec![
                entry(3, 3, defaults::THREE_OF_THREE),
                entry(3, 2, defaults::TWO_OF_THREE),
                entry(3, 1, defaults::ONE_OF_THREE),
                entry(3, 0, defaults::NONE_CORRECT),
                entry(2, 2, defaults::TWO_OF_TWO),
                entry(2, 1, defaults::ONE_OF_TWO),
                entry(2, 0, defaults::NONE_CORRECT),
            ],
        }
    }
}

impl FailRateTable {
    /// Base fail rate in percent. Unknown pairs are treated as certain death.
    pub fn base_fail_rate(&self, items_needed: usize, correct: usize) -> f32 {
        let found = self
            .entries
            .iter()
            .find(|e| e.items_needed as usize == items_needed && e.correct as usize == correct);
        match found {
            Some(e) => e.fail_rate,
            None => {
                log::warn!(
                    "no fail rate for {} of {} correct, assuming {}",
                    correct,
                    items_needed,
                    defaults::NONE_CORRECT
                );
                defaults::NONE_CORRECT
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for e in &self.entries {
            if !(0.0..=100.0).contains(&e.fail_rate) {
                return Err(ConfigError::invalid(
                    "fail_rates",
                    format!(
                        "({}, {}) fail rate {} outside 0..=100",
                        e.items_needed, e.correct, e.fail_rate
                    ),
                ));
            }
            if e.correct > e.items_needed {
                return Err(ConfigError::invalid(
                    "fail_rates",
                    format!("{} correct of {} needed", e.correct, e.items_needed),
                ));
            }
        }
        Ok(())
    }
}

// ── Resolution ──────────────────────────────────────────────────────────

/// Clamped odds for one order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub base_fail_rate: f32,
    pub urgency_penalty: f32,
    pub total_fail_rate: f32,
    pub survival_rate: f32,
}

impl Odds {
    pub fn new(base_fail_rate: f32, urgency_penalty: f32) -> Self {
        let total_fail_rate = clamp_percent(base_fail_rate + urgency_penalty);
        Self {
            base_fail_rate,
            urgency_penalty,
            total_fail_rate,
            survival_rate: 100.0 - total_fail_rate,
        }
    }

    /// Survives iff the roll is below the survival rate.
    pub fn decide(&self, roll: f32) -> Outcome {
        if roll < self.survival_rate {
            Outcome::Survived
        } else {
            Outcome::Died
        }
    }
}

/// Full record of how an order was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub outcome: Outcome,
    pub items_needed: usize,
    pub correct: usize,
    pub odds: Odds,
    /// `None` when the outcome was forced without a draw.
    pub roll: Option<f32>,
}

impl Resolution {
    pub fn survived(&self) -> bool {
        self.outcome == Outcome::Survived
    }
}

fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        100.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvaluator {
    pub table: FailRateTable,
}

impl OutcomeEvaluator {
    pub fn new(table: FailRateTable) -> Self {
        Self { table }
    }

    pub fn odds(&self, items_needed: usize, correct: usize, urgency_penalty: f32) -> Odds {
        Odds::new(
            self.table.base_fail_rate(items_needed, correct),
            urgency_penalty,
        )
    }

    /// Score the order's deliveries, draw once, decide.
    pub fn resolve(
        &self,
        order: &Order,
        items: &ItemCatalog,
        urgency_penalty: f32,
        rng: &mut dyn RandomSource,
    ) -> Resolution {
        let items_needed = order.items_needed();
        let correct = count_correct(order, items);
        let odds = self.odds(items_needed, correct, urgency_penalty);
        let roll = clamp_roll(rng.roll_percent());
        let outcome = odds.decide(roll);
        Resolution {
            outcome,
            items_needed,
            correct,
            odds,
            roll: Some(roll),
        }
    }

    /// Client left before being served: certain death, no draw.
    pub fn forced_failure(&self, order: &Order, items: &ItemCatalog) -> Resolution {
        let items_needed = order.items_needed();
        let correct = count_correct(order, items);
        let base = self.table.base_fail_rate(items_needed, correct);
        let odds = Odds {
            base_fail_rate: base,
            urgency_penalty: 100.0 - base,
            total_fail_rate: 100.0,
            survival_rate: 0.0,
        };
        Resolution {
            outcome: Outcome::Died,
            items_needed,
            correct,
            odds,
            roll: None,
        }
    }
}

/// Highest draw a roll is clamped to.
const MAX_ROLL: f32 = 99.999;

/// Keep injected draws inside `[0, 100)`. NaN counts as the worst draw.
fn clamp_roll(roll: f32) -> f32 {
    if roll.is_nan() {
        MAX_ROLL
    } else {
        roll.clamp(0.0, MAX_ROLL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::order::{OrderId, OrderRequirements};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> Catalog {
        Catalog::embedded().unwrap()
    }

    /// werewolf / insomnia / forest: moon_tea is correct, silver_salve is not.
    fn three_item_order(catalog: &Catalog, correct: usize) -> Order {
        let r = |n: &str| catalog.requirements.find(n).unwrap().id;
        let reqs = OrderRequirements::new(r("werewolf"), r("insomnia"), Some(r("forest")));
        let mut order = Order::new(OrderId(1), reqs, 60.0).unwrap();
        let good = catalog.items.find("moon_tea").unwrap().item_type;
        let bad = catalog.items.find("silver_salve").unwrap().item_type;
        for i in 0..3 {
            order.push_item(if i < correct { good } else { bad }).unwrap();
        }
        order
    }

    #[test]
    fn test_default_table_exact() {
        let table = FailRateTable::default();
        assert_eq!(table.base_fail_rate(3, 3), 5.0);
        assert_eq!(table.base_fail_rate(3, 2), 50.0);
        assert_eq!(table.base_fail_rate(3, 1), 83.0);
        assert_eq!(table.base_fail_rate(3, 0), 100.0);
        assert_eq!(table.base_fail_rate(2, 2), 5.0);
        assert_eq!(table.base_fail_rate(2, 1), 50.0);
        assert_eq!(table.base_fail_rate(2, 0), 100.0);
    }

    #[test]
    fn test_unknown_pair_is_fatal() {
        let table = FailRateTable::default();
        assert_eq!(table.base_fail_rate(4, 1), 100.0);
    }

    #[test]
    fn test_odds_clamped() {
        let odds = Odds::new(83.0, 45.0);
        assert_eq!(odds.total_fail_rate, 100.0);
        assert_eq!(odds.survival_rate, 0.0);

        let odds = Odds::new(5.0, -20.0);
        assert_eq!(odds.total_fail_rate, 0.0);
        assert_eq!(odds.survival_rate, 100.0);
    }

    #[test]
    fn test_nervous_two_of_three_scenario() {
        let c = catalog();
        let order = three_item_order(&c, 2);
        let evaluator = OutcomeEvaluator::default();

        let survived = evaluator.resolve(&order, &c.items, 5.0, &mut FixedRoll(40.0));
        assert_eq!(survived.correct, 2);
        assert_eq!(survived.odds.total_fail_rate, 55.0);
        assert_eq!(survived.odds.survival_rate, 45.0);
        assert_eq!(survived.outcome, Outcome::Survived);

        let died = evaluator.resolve(&order, &c.items, 5.0, &mut FixedRoll(50.0));
        assert_eq!(died.outcome, Outcome::Died);
        assert_eq!(died.roll, Some(50.0));
    }

    #[test]
    fn test_roll_equal_to_survival_rate_dies() {
        let odds = Odds::new(50.0, 5.0);
        assert_eq!(odds.decide(44.9), Outcome::Survived);
        assert_eq!(odds.decide(45.0), Outcome::Died);
    }

    #[test]
    fn test_zero_correct_always_dies() {
        let c = catalog();
        let order = three_item_order(&c, 0);
        let evaluator = OutcomeEvaluator::default();
        let r = evaluator.resolve(&order, &c.items, 0.0, &mut FixedRoll(0.0));
        assert_eq!(r.odds.base_fail_rate, 100.0);
        assert_eq!(r.outcome, Outcome::Died);
    }

    #[test]
    fn test_out_of_range_rolls_clamped() {
        let c = catalog();
        let order = three_item_order(&c, 3);
        let evaluator = OutcomeEvaluator::default();
        let r = evaluator.resolve(&order, &c.items, 0.0, &mut FixedRoll(-10.0));
        assert_eq!(r.roll, Some(0.0));
        assert_eq!(r.outcome, Outcome::Survived);
        let r = evaluator.resolve(&order, &c.items, 0.0, &mut FixedRoll(250.0));
        assert_eq!(r.outcome, Outcome::Died);
    }

    #[test]
    fn test_nan_roll_dies() {
        let c = catalog();
        let order = three_item_order(&c, 3);
        let evaluator = OutcomeEvaluator::default();
        let r = evaluator.resolve(&order, &c.items, 0.0, &mut FixedRoll(f32::NAN));
        assert_eq!(r.roll, Some(MAX_ROLL));
        assert_eq!(r.odds.survival_rate, 95.0);
        assert_eq!(r.outcome, Outcome::Died);
    }

    #[test]
    fn test_forced_failure() {
        let c = catalog();
        let order = three_item_order(&c, 3);
        let r = OutcomeEvaluator::default().forced_failure(&order, &c.items);
        assert_eq!(r.outcome, Outcome::Died);
        assert_eq!(r.odds.total_fail_rate, 100.0);
        assert_eq!(r.roll, None);
    }

    #[test]
    fn test_scripted_rolls() {
        let mut rolls = ScriptedRolls::new([1.0, 2.0], 99.0);
        assert_eq!(rolls.roll_percent(), 1.0);
        assert_eq!(rolls.roll_percent(), 2.0);
        assert_eq!(rolls.remaining(), 0);
        assert_eq!(rolls.roll_percent(), 99.0);
    }

    #[test]
    fn test_rng_roll_in_range() {
        let mut rng = RngRoll(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            let v = rng.roll_percent();
            assert!((0.0..100.0).contains(&v));
        }
    }

    #[test]
    fn test_validate_table() {
        assert!(FailRateTable::default().validate().is_ok());
        let bad = FailRateTable {
            entries: vec![FailRateEntry {
                items_needed: 2,
                correct: 1,
                fail_rate: 120.0,
            }],
        };
        assert!(bad.validate().is_err());
    }
}
