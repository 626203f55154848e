//! Game constants: board capacity, default tuning values, debt tiers.
//!
//! Everything here is a plain default. Hosts override the tunable values
//! through [`crate::config::ShopConfig`].

/// Number of client slots on the counter.
pub const BOARD_CAPACITY: usize = 3;

/// Orders always need a monster and a condition item.
pub const MIN_ITEMS_PER_ORDER: usize = 2;

/// Orders with an environment requirement need a third item.
pub const MAX_ITEMS_PER_ORDER: usize = 3;

pub mod urgency {
    /// Remaining-time fraction below which a client becomes nervous.
    pub const NERVOUS_BELOW: f32 = 0.60;
    /// Remaining-time fraction below which a client becomes impatient.
    pub const IMPATIENT_BELOW: f32 = 0.30;
    /// Remaining-time fraction below which a client becomes desperate.
    pub const DESPERATE_BELOW: f32 = 0.10;

    // Fail-rate penalties in percent
    pub const CALM_PENALTY: f32 = 0.0;
    pub const NERVOUS_PENALTY: f32 = 5.0;
    pub const IMPATIENT_PENALTY: f32 = 15.0;
    pub const DESPERATE_PENALTY: f32 = 45.0;
    pub const ABANDONED_PENALTY: f32 = 95.0;
}

pub mod fail_rates {
    //! Base fail rates in percent, keyed by `(items_needed, correct)`.

    pub const THREE_OF_THREE: f32 = 5.0;
    pub const TWO_OF_THREE: f32 = 50.0;
    pub const ONE_OF_THREE: f32 = 83.0;
    pub const TWO_OF_TWO: f32 = 5.0;
    pub const ONE_OF_TWO: f32 = 50.0;
    /// No correct item is always fatal.
    pub const NONE_CORRECT: f32 = 100.0;
}

pub mod economy {
    pub const STARTING_DEBT: f32 = 250.0;
    pub const SUCCESS_REWARD: f32 = 15.0;
    pub const DEATH_PENALTY: f32 = 10.0;
    pub const INVENTORY_COST_PER_ITEM: f32 = 2.0;
    /// Fraction of total money paid toward the debt at each day close.
    pub const DEBT_PAYMENT_RATE: f32 = 0.25;

    // Debt tier thresholds
    pub const DEBT_LOW_LOW_BELOW: f32 = 60.0;
    pub const DEBT_LOW_BELOW: f32 = 120.0;
    pub const DEBT_MEDIUM_BELOW: f32 = 180.0;
}

pub mod durations {
    //! Client patience in seconds per debt tier. More debt, less patience.

    pub const NO_DEBT: f32 = 90.0;
    pub const LOW_LOW_DEBT: f32 = 80.0;
    pub const LOW_DEBT: f32 = 70.0;
    pub const MEDIUM_DEBT: f32 = 60.0;
    pub const HIGH_DEBT: f32 = 50.0;
}

pub mod day {
    /// Length of a trading day in seconds.
    pub const DAY_LENGTH: f32 = 180.0;
    /// Seconds between client arrivals.
    pub const SPAWN_INTERVAL: f32 = 20.0;
    /// Seconds a resolved client lingers before the slot frees.
    pub const RELEASE_DELAY: f32 = 1.5;
    /// Chance that a new order also names an environment.
    pub const THREE_SLOT_CHANCE: f64 = 0.5;
}
