//! Error types for the order and economy rules.

use thiserror::Error;

use crate::catalog::Category;

/// Misuse of the order board. All variants are recoverable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoardError {
    /// Every slot is occupied; the caller should wait for a release.
    #[error("all {capacity} order slots are occupied")]
    CapacityExceeded { capacity: usize },

    #[error("slot {slot} is out of range (capacity {capacity})")]
    InvalidSlot { slot: usize, capacity: usize },

    #[error("no order in slot {slot}")]
    NoOrderInSlot { slot: usize },

    #[error("order {order_id} in slot {slot} is already complete")]
    OrderAlreadyComplete { slot: usize, order_id: u64 },

    /// Release was requested before the order was resolved.
    #[error("order {order_id} in slot {slot} has not been resolved")]
    OrderNotResolved { slot: usize, order_id: u64 },

    #[error("item type {0} is not in the catalog")]
    UnknownItem(u16),

    /// A requirement id that is missing from the catalog or sits in the
    /// wrong category slot.
    #[error("requirement {id} is not a known {expected:?} requirement")]
    InvalidRequirement { id: u16, expected: Category },

    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// An order refused an item because it already holds all it needs.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("order {0} already has every item it needs")]
pub struct OrderFull(pub u64);

/// Urgency clock misconfiguration. Fatal: fail fast at construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    #[error("order duration must be positive and finite, got {0}")]
    InvalidDuration(f32),
}

/// Reference data could not be loaded.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate item name: {0}")]
    DuplicateItem(String),

    #[error("duplicate requirement name: {0}")]
    DuplicateRequirement(String),

    #[error("requirement {requirement} references unknown item {item}")]
    UnknownItem { requirement: String, item: String },

    #[error("item {item} appears in more than one tier of requirement {requirement}")]
    OverlappingTiers { requirement: String, item: String },

    #[error("item {item} has invalid price {price}")]
    InvalidPrice { item: String, price: f32 },

    #[error("catalog has no {0:?} requirements")]
    MissingCategory(Category),

    #[error("catalog has more than {max} {what}")]
    TooManyEntries { what: &'static str, max: usize },
}

/// Tuning values that cannot drive a sensible game.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
