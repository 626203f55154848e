//! Shopkeep Core - trading-day engine and save data
//!
//! Wires the pure rules from `shopkeep_logic` into a frame-driven loop:
//! clients arrive on a timer, their patience runs down, resolved clients
//! leave after a short delay, and the ledger settles when the day closes.
//!
//! # Example
//!
//! ```rust,no_run
//! use shopkeep_core::prelude::*;
//!
//! let catalog = Catalog::embedded().unwrap();
//! let mut engine = ShopEngine::new(ShopConfig::default(), catalog, 42);
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     for event in engine.drain_events() {
//!         if let ShopEvent::DayOver { .. } = event {
//!             engine.close_day().unwrap();
//!             engine.start_day().unwrap();
//!         }
//!     }
//! }
//! ```

pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::{EngineError, ShopEngine, ShopEvent};
    pub use crate::persistence::{JsonPrefs, MemoryPrefs, PersistenceError, PrefsStore};
    pub use shopkeep_logic::catalog::{Catalog, ItemType};
    pub use shopkeep_logic::config::ShopConfig;
    pub use shopkeep_logic::ledger::{DayResult, DaySummary};
}
