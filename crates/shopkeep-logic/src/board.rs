//! The counter: up to three concurrent client orders, one per slot.
//!
//! The board is the single owner of every order. Resolution (outcome draw
//! and ledger update) happens synchronously inside the call that finishes
//! the order, whether that is the last delivery, a clock tick reaching
//! `Abandoned`, or an explicit dismissal. A resolved order keeps its slot
//! until [`OrderBoard::release`] so the host can play its exit animation;
//! releasing never touches the ledger.

use crate::catalog::{ItemCatalog, ItemType, RequirementCatalog};
use crate::compatibility::is_compatible;
use crate::constants::BOARD_CAPACITY;
use crate::error::BoardError;
use crate::ledger::EconomyLedger;
use crate::order::{Order, OrderId, OrderRequirements};
use crate::outcome::{Outcome, OutcomeEvaluator, RandomSource, Resolution};
use crate::urgency::{UrgencyConfig, UrgencyLevel};

/// Collaborators needed to resolve an order.
pub struct ResolveContext<'a> {
    pub items: &'a ItemCatalog,
    pub ledger: &'a mut EconomyLedger,
    pub rng: &'a mut dyn RandomSource,
}

/// What happened on a successful delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub slot: usize,
    pub order_id: OrderId,
    pub item: ItemType,
    /// Whether this item alone is correct for the order.
    pub correct: bool,
    pub sale_value: f32,
    /// Present when this delivery completed the order.
    pub resolution: Option<Resolution>,
}

/// An order that was resolved without a delivery (timeout or dismissal).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrder {
    pub slot: usize,
    pub order_id: OrderId,
    pub resolution: Resolution,
}

#[derive(Debug, Clone)]
pub struct OrderBoard {
    slots: [Option<Order>; BOARD_CAPACITY],
    next_id: u64,
    urgency: UrgencyConfig,
    evaluator: OutcomeEvaluator,
}

impl OrderBoard {
    pub fn new(urgency: UrgencyConfig, evaluator: OutcomeEvaluator) -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            next_id: 1,
            urgency,
            evaluator,
        }
    }

    /// Seat a new client in the lowest free slot. The requirements are
    /// checked against `catalog` first.
    pub fn admit(
        &mut self,
        catalog: &RequirementCatalog,
        requirements: OrderRequirements,
        max_duration: f32,
    ) -> Result<(OrderId, usize), BoardError> {
        requirements.validate(catalog)?;
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(BoardError::CapacityExceeded {
                capacity: BOARD_CAPACITY,
            })?;

        let id = OrderId(self.next_id);
        let order = Order::new(id, requirements, max_duration)?;
        self.next_id += 1;
        self.slots[slot] = Some(order);

        log::debug!(
            "order {} admitted to slot {} ({} items, {:.1}s)",
            id.0,
            slot,
            requirements.items_needed(),
            max_duration
        );
        Ok((id, slot))
    }

    /// Hand an item to the client in `slot`.
    pub fn deliver(
        &mut self,
        slot: usize,
        item: ItemType,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<DeliveryReport, BoardError> {
        let order = order_in_slot(&mut self.slots, slot)?;
        let order_id = order.id();
        if !order.is_active() || order.is_complete() {
            return Err(BoardError::OrderAlreadyComplete {
                slot,
                order_id: order_id.0,
            });
        }
        let item_def = ctx.items.get(item).ok_or(BoardError::UnknownItem(item.0))?;
        let sale_value = item_def.price;
        let correct = is_compatible(item_def, order.requirements());

        let completed = order
            .push_item(item)
            .map_err(|_| BoardError::OrderAlreadyComplete {
                slot,
                order_id: order_id.0,
            })?;
        ctx.ledger.record_delivery(sale_value);

        log::debug!(
            "slot {} order {}: delivered item {} ({})",
            slot,
            order_id.0,
            item.0,
            if correct { "correct" } else { "wrong" }
        );

        let resolution = if completed {
            let penalty = self.urgency.penalty(order.urgency());
            let resolution = self.evaluator.resolve(order, ctx.items, penalty, ctx.rng);
            settle(slot, order, resolution.clone(), ctx.ledger);
            Some(resolution)
        } else {
            None
        };

        Ok(DeliveryReport {
            slot,
            order_id,
            item,
            correct,
            sale_value,
            resolution,
        })
    }

    /// Advance every active order's clock. Incomplete orders that run out of
    /// time are resolved with the `Abandoned` penalty.
    pub fn tick(&mut self, delta_seconds: f32, ctx: &mut ResolveContext<'_>) -> Vec<ResolvedOrder> {
        let mut resolved = Vec::new();
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            let Some(order) = entry.as_mut() else {
                continue;
            };
            if !order.is_active() {
                continue;
            }
            let level = order.advance_clock(delta_seconds, &self.urgency);
            if level == UrgencyLevel::Abandoned {
                let penalty = self.urgency.penalty(UrgencyLevel::Abandoned);
                let resolution = self.evaluator.resolve(order, ctx.items, penalty, ctx.rng);
                settle(slot, order, resolution.clone(), ctx.ledger);
                resolved.push(ResolvedOrder {
                    slot,
                    order_id: order.id(),
                    resolution,
                });
            }
        }
        resolved
    }

    /// The client in `slot` leaves before being served. Counts as a death.
    pub fn dismiss(
        &mut self,
        slot: usize,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<ResolvedOrder, BoardError> {
        let order = order_in_slot(&mut self.slots, slot)?;
        if !order.is_active() {
            return Err(BoardError::OrderAlreadyComplete {
                slot,
                order_id: order.id().0,
            });
        }
        order.abandon();
        let resolution = self.evaluator.forced_failure(order, ctx.items);
        settle(slot, order, resolution.clone(), ctx.ledger);
        Ok(ResolvedOrder {
            slot,
            order_id: order.id(),
            resolution,
        })
    }

    /// Dismiss every order that is still waiting.
    pub fn resolve_all_active(&mut self, ctx: &mut ResolveContext<'_>) -> Vec<ResolvedOrder> {
        let active: Vec<usize> = (0..BOARD_CAPACITY)
            .filter(|&slot| self.slots[slot].as_ref().is_some_and(Order::is_active))
            .collect();
        active
            .into_iter()
            .filter_map(|slot| self.dismiss(slot, ctx).ok())
            .collect()
    }

    /// Free a slot whose order has been resolved.
    pub fn release(&mut self, slot: usize) -> Result<Order, BoardError> {
        let order = order_in_slot(&mut self.slots, slot)?;
        if order.is_active() {
            return Err(BoardError::OrderNotResolved {
                slot,
                order_id: order.id().0,
            });
        }
        let order = self.slots[slot].take().ok_or(BoardError::NoOrderInSlot { slot })?;
        log::debug!("slot {} released (order {})", slot, order.id().0);
        Ok(order)
    }

    pub fn get(&self, slot: usize) -> Option<&Order> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<Order>] {
        &self.slots
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|o| o.is_active())
            .count()
    }

    pub fn free_slots(&self) -> usize {
        BOARD_CAPACITY - self.occupied_count()
    }

    /// Slots holding resolved orders waiting for release.
    pub fn resolved_slots(&self) -> Vec<usize> {
        (0..BOARD_CAPACITY)
            .filter(|&slot| self.slots[slot].as_ref().is_some_and(|o| !o.is_active()))
            .collect()
    }

    pub fn urgency_config(&self) -> &UrgencyConfig {
        &self.urgency
    }

    pub fn evaluator(&self) -> &OutcomeEvaluator {
        &self.evaluator
    }
}

impl Default for OrderBoard {
    fn default() -> Self {
        Self::new(UrgencyConfig::default(), OutcomeEvaluator::default())
    }
}

fn order_in_slot(
    slots: &mut [Option<Order>; BOARD_CAPACITY],
    slot: usize,
) -> Result<&mut Order, BoardError> {
    if slot >= BOARD_CAPACITY {
        return Err(BoardError::InvalidSlot {
            slot,
            capacity: BOARD_CAPACITY,
        });
    }
    slots[slot]
        .as_mut()
        .ok_or(BoardError::NoOrderInSlot { slot })
}

/// Apply a resolution exactly once: ledger first, then the order's state.
fn settle(slot: usize, order: &mut Order, resolution: Resolution, ledger: &mut EconomyLedger) {
    match resolution.outcome {
        Outcome::Survived => ledger.record_survived(),
        Outcome::Died => ledger.record_died(),
    }
    log::info!(
        "slot {} order {}: {:?} ({}/{} correct, survival {:.0}%)",
        slot,
        order.id().0,
        resolution.outcome,
        resolution.correct,
        resolution.items_needed,
        resolution.odds.survival_rate
    );
    order.mark_resolved(resolution);
}
