//! Money and debt bookkeeping across trading days.
//!
//! Per-day accumulators (`current_money`, item sales, outcome counts) are
//! mutated by deliveries and resolutions, then rolled into the persistent
//! `debt` / `total_money` at day close.
//!
//! Normal mode settles a quarter (by default) of total money against the debt
//! each day. Eternal mode applies the daily balance to the debt directly:
//! profit pays it down, a loss grows it, and the game is never lost.

use serde::{Deserialize, Serialize};

use crate::constants::economy as defaults;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub starting_debt: f32,
    /// Credited when a client survives.
    pub success_reward: f32,
    /// Charged when a client dies.
    pub death_penalty: f32,
    pub inventory_cost_per_item: f32,
    /// Fraction of total money paid toward the debt each day (normal mode).
    pub debt_payment_rate: f32,
    pub eternal_mode: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_debt: defaults::STARTING_DEBT,
            success_reward: defaults::SUCCESS_REWARD,
            death_penalty: defaults::DEATH_PENALTY,
            inventory_cost_per_item: defaults::INVENTORY_COST_PER_ITEM,
            debt_payment_rate: defaults::DEBT_PAYMENT_RATE,
            eternal_mode: false,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.debt_payment_rate) {
            return Err(ConfigError::invalid(
                "ledger.debt_payment_rate",
                format!("{} outside 0..=1", self.debt_payment_rate),
            ));
        }
        let non_negative = [
            ("ledger.starting_debt", self.starting_debt),
            ("ledger.success_reward", self.success_reward),
            ("ledger.death_penalty", self.death_penalty),
            ("ledger.inventory_cost_per_item", self.inventory_cost_per_item),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{} must be >= 0", value)));
            }
        }
        Ok(())
    }
}

/// Debt tier, used to scale client patience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DebtLevel {
    None,
    LowLow,
    Low,
    Medium,
    High,
}

impl DebtLevel {
    /// Step function over the debt thresholds 0 / 60 / 120 / 180.
    pub fn from_debt(debt: f32) -> Self {
        if debt <= 0.0 {
            DebtLevel::None
        } else if debt < defaults::DEBT_LOW_LOW_BELOW {
            DebtLevel::LowLow
        } else if debt < defaults::DEBT_LOW_BELOW {
            DebtLevel::Low
        } else if debt < defaults::DEBT_MEDIUM_BELOW {
            DebtLevel::Medium
        } else {
            DebtLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayResult {
    Continue,
    Win,
    Lose,
}

/// Everything computed at day close, for the end-of-day screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: u32,
    pub current_money: f32,
    pub items_benefits: f32,
    pub total_items_sold: u32,
    pub success_count: u32,
    pub death_count: u32,
    pub restock_cost: f32,
    pub daily_balance: f32,
    pub debt_payment: f32,
    pub debt: f32,
    pub total_money: f32,
    pub result: DayResult,
}

/// The scalars that survive a restart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub debt: f32,
    pub total_money: f32,
    pub current_day: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyLedger {
    config: LedgerConfig,
    // Per day
    current_money: f32,
    items_benefits: f32,
    total_items_sold: u32,
    success_count: u32,
    death_count: u32,
    // Persistent
    debt: f32,
    total_money: f32,
    current_day: u32,
}

impl EconomyLedger {
    pub fn new(config: LedgerConfig) -> Self {
        let debt = config.starting_debt;
        Self {
            config,
            current_money: 0.0,
            items_benefits: 0.0,
            total_items_sold: 0,
            success_count: 0,
            death_count: 0,
            debt,
            total_money: 0.0,
            current_day: 1,
        }
    }

    /// Resume from persisted scalars with fresh day counters.
    pub fn with_state(config: LedgerConfig, state: LedgerState) -> Self {
        let mut ledger = Self::new(config);
        ledger.restore(state);
        ledger
    }

    pub fn record_delivery(&mut self, sale_value: f32) {
        self.items_benefits += sale_value;
        self.current_money += sale_value;
        self.total_items_sold += 1;
    }

    pub fn record_survived(&mut self) {
        self.current_money += self.config.success_reward;
        self.success_count += 1;
    }

    pub fn record_died(&mut self) {
        self.current_money -= self.config.death_penalty;
        self.death_count += 1;
    }

    /// Settle the day against the debt and decide whether play continues.
    pub fn close_day(&mut self) -> DaySummary {
        let restock_cost = self.config.inventory_cost_per_item * self.total_items_sold as f32;
        let daily_balance = self.current_money - restock_cost;

        let mut debt_payment = 0.0;
        if self.config.eternal_mode {
            self.debt -= daily_balance;
            self.total_money = (self.total_money + daily_balance).max(0.0);
        } else {
            self.total_money += daily_balance;
            if self.current_money > 0.0 {
                debt_payment = (self.total_money * self.config.debt_payment_rate).max(0.0);
            }
            self.debt -= debt_payment;
            self.total_money -= debt_payment;
        }

        let result = if self.debt <= 0.0 {
            self.debt = 0.0;
            DayResult::Win
        } else if !self.config.eternal_mode && self.total_money < 0.0 {
            DayResult::Lose
        } else {
            DayResult::Continue
        };

        let summary = DaySummary {
            day: self.current_day,
            current_money: self.current_money,
            items_benefits: self.items_benefits,
            total_items_sold: self.total_items_sold,
            success_count: self.success_count,
            death_count: self.death_count,
            restock_cost,
            daily_balance,
            debt_payment,
            debt: self.debt,
            total_money: self.total_money,
            result,
        };

        if result == DayResult::Continue {
            self.current_day += 1;
        }

        log::info!(
            "day {} closed: balance {:.2}, paid {:.2}, debt {:.2}, total {:.2} -> {:?}",
            summary.day,
            daily_balance,
            debt_payment,
            self.debt,
            self.total_money,
            result
        );
        summary
    }

    /// Zero the per-day accumulators. Debt and total money are kept.
    pub fn reset_day_counters(&mut self) {
        self.current_money = 0.0;
        self.items_benefits = 0.0;
        self.total_items_sold = 0;
        self.success_count = 0;
        self.death_count = 0;
    }

    /// Back to day one with the configured starting debt.
    pub fn reset_game(&mut self) {
        self.reset_day_counters();
        self.debt = self.config.starting_debt;
        self.total_money = 0.0;
        self.current_day = 1;
    }

    pub fn debt_level(&self) -> DebtLevel {
        DebtLevel::from_debt(self.debt)
    }

    pub fn snapshot(&self) -> LedgerState {
        LedgerState {
            debt: self.debt,
            total_money: self.total_money,
            current_day: self.current_day,
        }
    }

    pub fn restore(&mut self, state: LedgerState) {
        self.debt = state.debt.max(0.0);
        self.total_money = state.total_money;
        self.current_day = state.current_day.max(1);
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn current_money(&self) -> f32 {
        self.current_money
    }

    pub fn items_benefits(&self) -> f32 {
        self.items_benefits
    }

    pub fn total_items_sold(&self) -> u32 {
        self.total_items_sold
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn death_count(&self) -> u32 {
        self.death_count
    }

    pub fn debt(&self) -> f32 {
        self.debt
    }

    pub fn total_money(&self) -> f32 {
        self.total_money
    }

    pub fn current_day(&self) -> u32 {
        self.current_day
    }
}

impl Default for EconomyLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(debt: f32, eternal_mode: bool) -> EconomyLedger {
        EconomyLedger::new(LedgerConfig {
            starting_debt: debt,
            success_reward: 15.0,
            death_penalty: 10.0,
            inventory_cost_per_item: 2.0,
            debt_payment_rate: 0.25,
            eternal_mode,
        })
    }

    /// Sell `count` items worth `value` each.
    fn sell(ledger: &mut EconomyLedger, count: u32, value: f32) {
        for _ in 0..count {
            ledger.record_delivery(value);
        }
    }

    #[test]
    fn test_record_delivery() {
        let mut ledger = ledger_with(100.0, false);
        ledger.record_delivery(8.0);
        ledger.record_delivery(4.5);
        assert_eq!(ledger.current_money(), 12.5);
        assert_eq!(ledger.items_benefits(), 12.5);
        assert_eq!(ledger.total_items_sold(), 2);
    }

    #[test]
    fn test_record_outcomes() {
        let mut ledger = ledger_with(100.0, false);
        ledger.record_survived();
        ledger.record_died();
        ledger.record_died();
        assert_eq!(ledger.success_count(), 1);
        assert_eq!(ledger.death_count(), 2);
        assert_eq!(ledger.current_money(), 15.0 - 20.0);
        assert_eq!(ledger.items_benefits(), 0.0);
    }

    #[test]
    fn test_close_day_normal_mode() {
        let mut ledger = ledger_with(250.0, false);
        sell(&mut ledger, 10, 10.0);
        assert_eq!(ledger.current_money(), 100.0);

        let summary = ledger.close_day();
        assert_eq!(summary.restock_cost, 20.0);
        assert_eq!(summary.daily_balance, 80.0);
        assert_eq!(summary.debt_payment, 20.0);
        assert_eq!(summary.total_money, 60.0);
        assert_eq!(summary.debt, 230.0);
        assert_eq!(summary.result, DayResult::Continue);
        assert_eq!(ledger.current_day(), 2);
    }

    #[test]
    fn test_no_payment_on_losing_day() {
        let mut ledger = ledger_with(250.0, false);
        ledger.restore(LedgerState {
            debt: 250.0,
            total_money: 100.0,
            current_day: 3,
        });
        ledger.record_died();
        let summary = ledger.close_day();
        assert_eq!(summary.debt_payment, 0.0);
        assert_eq!(summary.total_money, 90.0);
        assert_eq!(summary.debt, 250.0);
        assert_eq!(summary.result, DayResult::Continue);
    }

    #[test]
    fn test_debt_paid_exactly_wins() {
        let mut ledger = ledger_with(20.0, false);
        sell(&mut ledger, 10, 10.0);
        // total 80, payment 20, debt 0
        let summary = ledger.close_day();
        assert_eq!(summary.debt, 0.0);
        assert_eq!(summary.result, DayResult::Win);
        assert_eq!(ledger.current_day(), 1);
    }

    #[test]
    fn test_overpaid_debt_clamped_to_zero() {
        let mut ledger = ledger_with(5.0, false);
        sell(&mut ledger, 10, 10.0);
        let summary = ledger.close_day();
        assert_eq!(summary.debt, 0.0);
        assert_eq!(summary.result, DayResult::Win);
    }

    #[test]
    fn test_negative_total_with_debt_loses() {
        let mut ledger = ledger_with(250.0, false);
        ledger.record_died();
        ledger.record_died();
        let summary = ledger.close_day();
        assert_eq!(summary.total_money, -20.0);
        assert_eq!(summary.result, DayResult::Lose);
    }

    #[test]
    fn test_eternal_mode_profit_reduces_debt() {
        let mut ledger = ledger_with(250.0, true);
        sell(&mut ledger, 10, 10.0);
        let summary = ledger.close_day();
        assert_eq!(summary.daily_balance, 80.0);
        assert_eq!(summary.debt, 170.0);
        assert_eq!(summary.total_money, 80.0);
        assert_eq!(summary.debt_payment, 0.0);
        assert_eq!(summary.result, DayResult::Continue);
    }

    #[test]
    fn test_eternal_mode_profit_clearing_debt_wins() {
        let mut ledger = ledger_with(60.0, true);
        sell(&mut ledger, 10, 10.0);
        let summary = ledger.close_day();
        // 100 sold - 20 restock = 80 against 60 of debt
        assert_eq!(summary.daily_balance, 80.0);
        assert_eq!(summary.debt, 0.0);
        assert_eq!(ledger.debt(), 0.0);
        assert_eq!(summary.total_money, 80.0);
        assert_eq!(summary.result, DayResult::Win);
        assert_eq!(ledger.current_day(), 1);
    }

    #[test]
    fn test_eternal_mode_loss_grows_debt_and_never_loses() {
        let mut ledger = ledger_with(250.0, true);
        for _ in 0..5 {
            ledger.record_died();
        }
        let summary = ledger.close_day();
        assert_eq!(summary.daily_balance, -50.0);
        assert_eq!(summary.debt, 300.0);
        assert_eq!(summary.total_money, 0.0);
        assert_eq!(summary.result, DayResult::Continue);
    }

    #[test]
    fn test_reset_day_counters_keeps_persistent_state() {
        let mut ledger = ledger_with(250.0, false);
        sell(&mut ledger, 10, 10.0);
        ledger.record_survived();
        ledger.close_day();
        let before = ledger.snapshot();
        ledger.reset_day_counters();
        assert_eq!(ledger.current_money(), 0.0);
        assert_eq!(ledger.items_benefits(), 0.0);
        assert_eq!(ledger.total_items_sold(), 0);
        assert_eq!(ledger.success_count(), 0);
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_reset_game() {
        let mut ledger = ledger_with(250.0, false);
        sell(&mut ledger, 10, 10.0);
        ledger.close_day();
        ledger.reset_game();
        assert_eq!(
            ledger.snapshot(),
            LedgerState {
                debt: 250.0,
                total_money: 0.0,
                current_day: 1
            }
        );
    }

    #[test]
    fn test_debt_levels() {
        assert_eq!(DebtLevel::from_debt(0.0), DebtLevel::None);
        assert_eq!(DebtLevel::from_debt(-3.0), DebtLevel::None);
        assert_eq!(DebtLevel::from_debt(0.5), DebtLevel::LowLow);
        assert_eq!(DebtLevel::from_debt(59.9), DebtLevel::LowLow);
        assert_eq!(DebtLevel::from_debt(60.0), DebtLevel::Low);
        assert_eq!(DebtLevel::from_debt(120.0), DebtLevel::Medium);
        assert_eq!(DebtLevel::from_debt(179.0), DebtLevel::Medium);
        assert_eq!(DebtLevel::from_debt(180.0), DebtLevel::High);
        assert_eq!(DebtLevel::from_debt(1000.0), DebtLevel::High);
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        let config = LedgerConfig {
            debt_payment_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(LedgerConfig::default().validate().is_ok());
    }
}
