//! Shop engine - composition root and trading-day loop

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use shopkeep_logic::board::{DeliveryReport, OrderBoard, ResolveContext, ResolvedOrder};
use shopkeep_logic::catalog::{Catalog, ItemType};
use shopkeep_logic::config::ShopConfig;
use shopkeep_logic::constants::BOARD_CAPACITY;
use shopkeep_logic::error::BoardError;
use shopkeep_logic::generation::OrderGenerator;
use shopkeep_logic::ledger::{DayResult, DaySummary, EconomyLedger, LedgerState};
use shopkeep_logic::order::{Order, OrderId};
use shopkeep_logic::outcome::{OutcomeEvaluator, RandomSource, Resolution, RngRoll};

use crate::persistence::{self, PersistenceError, PrefsStore};

/// Seed offset so order generation and outcome rolls use distinct streams.
const OUTCOME_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopEvent {
    OrderAdmitted {
        slot: usize,
        order_id: OrderId,
        max_duration: f32,
    },
    ItemDelivered {
        slot: usize,
        order_id: OrderId,
        item: ItemType,
        correct: bool,
    },
    OrderResolved {
        slot: usize,
        order_id: OrderId,
        resolution: Resolution,
    },
    OrderReleased {
        slot: usize,
        order_id: OrderId,
    },
    /// Day time ran out; no more clients will arrive.
    DayOver { day: u32 },
    DayClosed(DaySummary),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("the game has ended: {0:?}")]
    GameOver(DayResult),

    #[error("day {0} is already closed")]
    DayAlreadyClosed(u32),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Main shop engine
pub struct ShopEngine {
    config: ShopConfig,
    catalog: Catalog,
    board: OrderBoard,
    ledger: EconomyLedger,
    generator: OrderGenerator,
    /// Drives order generation
    spawn_rng: StdRng,
    /// Consumed only by outcome resolution
    roller: Box<dyn RandomSource>,

    /// Seconds since the day opened
    day_time: f32,
    /// Seconds until the next client arrives
    spawn_timer: f32,
    day_open: bool,
    /// The day `close_day` settled, until the next one starts
    closed_day: Option<u32>,
    game_over: Option<DayResult>,
    release_timers: [Option<f32>; BOARD_CAPACITY],
    events: Vec<ShopEvent>,
}

impl ShopEngine {
    /// Build a fresh game. The day opens immediately.
    pub fn new(config: ShopConfig, catalog: Catalog, seed: u64) -> Self {
        let ledger = EconomyLedger::new(config.ledger.clone());
        Self::with_ledger(config, catalog, ledger, seed)
    }

    /// Build around an existing ledger, e.g. one restored from prefs.
    pub fn with_ledger(
        config: ShopConfig,
        catalog: Catalog,
        ledger: EconomyLedger,
        seed: u64,
    ) -> Self {
        let board = OrderBoard::new(
            config.urgency.clone(),
            OutcomeEvaluator::new(config.fail_rates.clone()),
        );
        let generator = OrderGenerator::new(config.generator.clone(), config.durations.clone());
        Self {
            board,
            ledger,
            generator,
            spawn_rng: StdRng::seed_from_u64(seed),
            roller: Box::new(RngRoll(StdRng::seed_from_u64(seed ^ OUTCOME_SEED_SALT))),
            day_time: 0.0,
            spawn_timer: 0.0,
            day_open: true,
            closed_day: None,
            game_over: None,
            release_timers: [None; BOARD_CAPACITY],
            events: Vec::new(),
            config,
            catalog,
        }
    }

    /// Replace the outcome roll, e.g. with a scripted source.
    pub fn set_random_source(&mut self, roller: Box<dyn RandomSource>) {
        self.roller = roller;
    }

    /// Advance the simulation by `delta_seconds`.
    pub fn update(&mut self, delta_seconds: f32) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }

        // Patience clocks
        let mut ctx = ResolveContext {
            items: &self.catalog.items,
            ledger: &mut self.ledger,
            rng: self.roller.as_mut(),
        };
        let resolved = self.board.tick(delta_seconds, &mut ctx);
        for r in resolved {
            self.on_resolved(r.slot, r.order_id, r.resolution);
        }

        // Exit animations
        self.advance_release_timers(delta_seconds);

        // Arrivals
        if self.day_open {
            self.day_time += delta_seconds;
            self.spawn_timer -= delta_seconds;
            if self.spawn_timer <= 0.0 {
                if self.board.free_slots() > 0 {
                    self.spawn_order();
                    self.spawn_timer = self.config.day.spawn_interval;
                } else {
                    // Next client walks in as soon as a slot frees
                    self.spawn_timer = 0.0;
                }
            }
            if self.day_time >= self.config.day.day_length {
                self.day_open = false;
                log::info!("day {} is over", self.ledger.current_day());
                self.events.push(ShopEvent::DayOver {
                    day: self.ledger.current_day(),
                });
            }
        }
    }

    /// Admit one generated order right now, ignoring the spawn timer.
    pub fn spawn_order(&mut self) -> Option<(OrderId, usize)> {
        let plan = self.generator.generate(
            &self.catalog.requirements,
            self.ledger.debt_level(),
            &mut self.spawn_rng,
        )?;
        match self.board.admit(&self.catalog.requirements, plan.requirements, plan.max_duration) {
            Ok((order_id, slot)) => {
                self.events.push(ShopEvent::OrderAdmitted {
                    slot,
                    order_id,
                    max_duration: plan.max_duration,
                });
                Some((order_id, slot))
            }
            Err(e) => {
                log::debug!("order not admitted: {}", e);
                None
            }
        }
    }

    pub fn deliver(&mut self, slot: usize, item: ItemType) -> Result<DeliveryReport, EngineError> {
        let mut ctx = ResolveContext {
            items: &self.catalog.items,
            ledger: &mut self.ledger,
            rng: self.roller.as_mut(),
        };
        let report = self.board.deliver(slot, item, &mut ctx)?;
        self.events.push(ShopEvent::ItemDelivered {
            slot,
            order_id: report.order_id,
            item,
            correct: report.correct,
        });
        if let Some(resolution) = &report.resolution {
            self.on_resolved(slot, report.order_id, resolution.clone());
        }
        Ok(report)
    }

    /// The client in `slot` walks out unserved.
    pub fn dismiss(&mut self, slot: usize) -> Result<ResolvedOrder, EngineError> {
        let mut ctx = ResolveContext {
            items: &self.catalog.items,
            ledger: &mut self.ledger,
            rng: self.roller.as_mut(),
        };
        let resolved = self.board.dismiss(slot, &mut ctx)?;
        self.on_resolved(resolved.slot, resolved.order_id, resolved.resolution.clone());
        Ok(resolved)
    }

    /// Free a resolved slot. Called by the host once its animation is done.
    pub fn release(&mut self, slot: usize) -> Result<Order, EngineError> {
        let order = self.board.release(slot)?;
        self.release_timers[slot] = None;
        self.events.push(ShopEvent::OrderReleased {
            slot,
            order_id: order.id(),
        });
        Ok(order)
    }

    /// End the trading day: waiting clients leave, the ledger settles, and
    /// day counters reset. Each day settles once.
    pub fn close_day(&mut self) -> Result<DaySummary, EngineError> {
        if let Some(result) = self.game_over {
            return Err(EngineError::GameOver(result));
        }
        if let Some(day) = self.closed_day {
            return Err(EngineError::DayAlreadyClosed(day));
        }

        let mut ctx = ResolveContext {
            items: &self.catalog.items,
            ledger: &mut self.ledger,
            rng: self.roller.as_mut(),
        };
        let walked_out = self.board.resolve_all_active(&mut ctx);
        for r in walked_out {
            self.on_resolved(r.slot, r.order_id, r.resolution);
        }
        for slot in self.board.resolved_slots() {
            self.release(slot)?;
        }

        let summary = self.ledger.close_day();
        self.ledger.reset_day_counters();
        self.day_open = false;
        self.closed_day = Some(summary.day);
        if summary.result != DayResult::Continue {
            self.game_over = Some(summary.result);
        }
        self.events.push(ShopEvent::DayClosed(summary.clone()));
        Ok(summary)
    }

    /// Open the next trading day.
    pub fn start_day(&mut self) -> Result<(), EngineError> {
        if let Some(result) = self.game_over {
            return Err(EngineError::GameOver(result));
        }
        self.day_time = 0.0;
        self.spawn_timer = 0.0;
        self.day_open = true;
        self.closed_day = None;
        log::info!(
            "day {} opens: debt {:.2} ({:?})",
            self.ledger.current_day(),
            self.ledger.debt(),
            self.ledger.debt_level()
        );
        Ok(())
    }

    /// Wipe progress and start over from the configured debt.
    pub fn new_game(&mut self) {
        self.board = OrderBoard::new(
            self.config.urgency.clone(),
            OutcomeEvaluator::new(self.config.fail_rates.clone()),
        );
        self.ledger.reset_game();
        self.release_timers = [None; BOARD_CAPACITY];
        self.game_over = None;
        self.events.clear();
        self.day_time = 0.0;
        self.spawn_timer = 0.0;
        self.day_open = true;
        self.closed_day = None;
    }

    pub fn drain_events(&mut self) -> Vec<ShopEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Persistence ────────────────────────────────────────────────────

    pub fn save_prefs(&self, store: &mut dyn PrefsStore) {
        persistence::write_ledger_prefs(store, &self.ledger.snapshot());
    }

    /// Restore debt/money/day from prefs. Returns false on a fresh store.
    pub fn load_prefs(&mut self, store: &dyn PrefsStore) -> bool {
        match persistence::read_ledger_prefs(store) {
            Some(state) => {
                self.restore_state(state);
                true
            }
            None => false,
        }
    }

    /// Save a versioned binary snapshot to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), EngineError> {
        persistence::save_snapshot(writer, &self.ledger.snapshot(), &self.config)?;
        Ok(())
    }

    /// Load a snapshot from a reader. The saved config is ignored; the
    /// engine keeps the one it was built with.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), EngineError> {
        let loaded = persistence::load_snapshot(reader)?;
        self.restore_state(loaded.ledger);
        Ok(())
    }

    fn restore_state(&mut self, state: LedgerState) {
        self.ledger.restore(state);
        self.game_over = None;
        log::info!(
            "restored day {}: debt {:.2}, total money {:.2}",
            state.current_day,
            state.debt,
            state.total_money
        );
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn board(&self) -> &OrderBoard {
        &self.board
    }

    pub fn ledger(&self) -> &EconomyLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn is_day_open(&self) -> bool {
        self.day_open
    }

    pub fn day_time(&self) -> f32 {
        self.day_time
    }

    pub fn game_over(&self) -> Option<DayResult> {
        self.game_over
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn on_resolved(&mut self, slot: usize, order_id: OrderId, resolution: Resolution) {
        self.release_timers[slot] = self.config.day.release_delay;
        self.events.push(ShopEvent::OrderResolved {
            slot,
            order_id,
            resolution,
        });
    }

    fn advance_release_timers(&mut self, delta_seconds: f32) {
        for slot in 0..BOARD_CAPACITY {
            let Some(remaining) = self.release_timers[slot] else {
                continue;
            };
            let remaining = remaining - delta_seconds;
            if remaining > 0.0 {
                self.release_timers[slot] = Some(remaining);
                continue;
            }
            self.release_timers[slot] = None;
            match self.board.release(slot) {
                Ok(order) => self.events.push(ShopEvent::OrderReleased {
                    slot,
                    order_id: order.id(),
                }),
                Err(e) => log::warn!("auto-release of slot {} failed: {}", slot, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopkeep_logic::compatibility::is_compatible;
    use shopkeep_logic::outcome::FixedRoll;

    fn engine() -> ShopEngine {
        ShopEngine::new(ShopConfig::default(), Catalog::embedded().unwrap(), 7)
    }

    /// Two-item orders only, so a fully correct item always exists.
    fn two_item_config() -> ShopConfig {
        let mut config = ShopConfig::default();
        config.generator.three_slot_chance = 0.0;
        config
    }

    fn perfect_item(engine: &ShopEngine, slot: usize) -> ItemType {
        let order = engine.board().get(slot).unwrap();
        engine
            .catalog()
            .items
            .iter()
            .find(|i| is_compatible(i, order.requirements()))
            .map(|i| i.item_type)
            .unwrap()
    }

    fn admitted(events: &[ShopEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ShopEvent::OrderAdmitted { .. }))
            .count()
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert!(engine.is_day_open());
        assert_eq!(engine.board().occupied_count(), 0);
        assert_eq!(engine.ledger().current_day(), 1);
        assert_eq!(engine.ledger().debt(), 250.0);
    }

    #[test]
    fn test_first_client_arrives_immediately() {
        let mut engine = engine();
        engine.update(0.1);
        assert_eq!(engine.board().occupied_count(), 1);
        assert_eq!(admitted(&engine.drain_events()), 1);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_spawn_interval() {
        let mut engine = engine();
        engine.update(0.1);
        engine.update(10.0);
        assert_eq!(engine.board().occupied_count(), 1);
        engine.update(10.0);
        assert_eq!(engine.board().occupied_count(), 2);
    }

    #[test]
    fn test_non_positive_delta_ignored() {
        let mut engine = engine();
        engine.update(0.0);
        engine.update(-1.0);
        engine.update(f32::NAN);
        assert_eq!(engine.board().occupied_count(), 0);
        assert_eq!(engine.day_time(), 0.0);
    }

    #[test]
    fn test_deliver_resolves_and_auto_releases() {
        let mut engine = ShopEngine::new(two_item_config(), Catalog::embedded().unwrap(), 7);
        engine.set_random_source(Box::new(FixedRoll(0.0)));
        engine.update(0.1);
        let item = perfect_item(&engine, 0);

        let first = engine.deliver(0, item).unwrap();
        assert!(first.correct);
        assert!(first.resolution.is_none());
        let second = engine.deliver(0, item).unwrap();
        assert!(second.resolution.unwrap().survived());
        assert_eq!(engine.ledger().success_count(), 1);

        // Slot held until the release delay passes
        assert_eq!(engine.board().occupied_count(), 1);
        engine.update(1.0);
        assert_eq!(engine.board().occupied_count(), 1);
        engine.update(1.0);
        assert!(engine.board().get(0).is_none());
        assert!(engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, ShopEvent::OrderReleased { slot: 0, .. })));
    }

    #[test]
    fn test_manual_release_when_delay_disabled() {
        let mut config = ShopConfig::default();
        config.day.release_delay = None;
        let mut engine = ShopEngine::new(config, Catalog::embedded().unwrap(), 1);
        engine.update(0.1);
        engine.dismiss(0).unwrap();
        engine.update(30.0);
        // Resolved order still parked in slot 0; second client took slot 1
        assert!(!engine.board().get(0).unwrap().is_active());
        assert!(engine.board().get(1).is_some());
        engine.release(0).unwrap();
        assert!(engine.board().get(0).is_none());
    }

    #[test]
    fn test_day_over_stops_arrivals() {
        let mut config = ShopConfig::default();
        config.day.day_length = 30.0;
        let mut engine = ShopEngine::new(config, Catalog::embedded().unwrap(), 3);
        for _ in 0..40 {
            engine.update(1.0);
        }
        assert!(!engine.is_day_open());
        let events = engine.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ShopEvent::DayOver { day: 1 }))
                .count(),
            1
        );
        let before = admitted(&events);
        for _ in 0..100 {
            engine.update(1.0);
        }
        assert_eq!(admitted(&engine.drain_events()), 0);
        assert!(before >= 2);
    }

    #[test]
    fn test_close_day_dismisses_waiting_clients() {
        let mut config = ShopConfig::default();
        // Keep the day from being a loss so the next one can open
        config.ledger.death_penalty = 0.0;
        let mut engine = ShopEngine::new(config, Catalog::embedded().unwrap(), 7);
        engine.update(0.1);
        engine.update(20.0);
        assert_eq!(engine.board().active_count(), 2);

        let summary = engine.close_day().unwrap();
        assert_eq!(summary.death_count, 2);
        assert_eq!(engine.board().occupied_count(), 0);
        assert_eq!(engine.ledger().death_count(), 0, "counters reset after close");
        assert!(!engine.is_day_open());

        engine.start_day().unwrap();
        assert!(engine.is_day_open());
        assert_eq!(engine.ledger().current_day(), 2);
    }

    #[test]
    fn test_day_closes_only_once() {
        // Nobody served or lost, so the day settles as Continue
        let mut engine = engine();
        let summary = engine.close_day().unwrap();
        assert_eq!(summary.day, 1);
        assert_eq!(summary.result, DayResult::Continue);

        for _ in 0..2 {
            assert!(matches!(
                engine.close_day(),
                Err(EngineError::DayAlreadyClosed(1))
            ));
        }
        assert_eq!(engine.ledger().current_day(), 2);
        let closed = engine
            .drain_events()
            .iter()
            .filter(|e| matches!(e, ShopEvent::DayClosed(_)))
            .count();
        assert_eq!(closed, 1);

        engine.start_day().unwrap();
        assert_eq!(engine.close_day().unwrap().day, 2);
    }

    #[test]
    fn test_game_over_blocks_new_day() {
        let mut config = two_item_config();
        config.ledger.starting_debt = 1.0;
        let mut engine = ShopEngine::new(config, Catalog::embedded().unwrap(), 5);
        engine.set_random_source(Box::new(FixedRoll(0.0)));
        engine.update(0.1);
        let item = perfect_item(&engine, 0);
        engine.deliver(0, item).unwrap();
        engine.deliver(0, item).unwrap();

        let summary = engine.close_day().unwrap();
        assert_eq!(summary.result, DayResult::Win);
        assert_eq!(engine.game_over(), Some(DayResult::Win));
        assert!(matches!(
            engine.start_day(),
            Err(EngineError::GameOver(DayResult::Win))
        ));

        engine.new_game();
        assert!(engine.start_day().is_ok());
        assert_eq!(engine.ledger().debt(), 1.0);
    }

    #[test]
    fn test_board_errors_surface() {
        let mut engine = engine();
        assert!(matches!(
            engine.deliver(0, ItemType(0)),
            Err(EngineError::Board(BoardError::NoOrderInSlot { slot: 0 }))
        ));
    }

    #[test]
    fn test_same_seed_same_day() {
        let run = |seed| {
            let mut engine =
                ShopEngine::new(ShopConfig::default(), Catalog::embedded().unwrap(), seed);
            for _ in 0..400 {
                engine.update(0.5);
            }
            engine.close_day().unwrap()
        };
        assert_eq!(run(11), run(11));
    }
}
