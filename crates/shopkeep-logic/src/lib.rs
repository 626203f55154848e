//! Pure order and economy rules for Shopkeep.
//!
//! Clients arrive with orders naming a monster, a condition and sometimes an
//! environment. The player hands over items; a finished order is resolved
//! into survival or death depending on how many items were right and how
//! long the client waited. Outcomes feed a money/debt ledger that carries
//! across trading days.
//!
//! Nothing here touches a clock, a file or a global. Time comes in as
//! `delta_seconds`, randomness through [`outcome::RandomSource`], and every
//! collaborator is passed in explicitly.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`board`] | Three-slot order board: admission, delivery, timeout, release |
//! | [`catalog`] | Requirements and items, loaded from JSON |
//! | [`compatibility`] | Whether a delivered item is correct for an order |
//! | [`config`] | Aggregate tuning with JSON overrides |
//! | [`constants`] | Board capacity and default tuning values |
//! | [`error`] | Error enums |
//! | [`generation`] | Random orders and debt-tier patience |
//! | [`ledger`] | Daily income, debt settlement, win/lose |
//! | [`order`] | Order entity |
//! | [`outcome`] | Fail-rate table, survival odds, injectable roll |
//! | [`urgency`] | Patience clock and urgency levels |

pub mod board;
pub mod catalog;
pub mod compatibility;
pub mod config;
pub mod constants;
pub mod error;
pub mod generation;
pub mod ledger;
pub mod order;
pub mod outcome;
pub mod urgency;
