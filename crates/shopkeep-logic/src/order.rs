//! A client's order: required slots, items handed over, patience clock.

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, ItemType, RequirementCatalog, RequirementId};
use crate::error::{BoardError, ClockError, OrderFull};
use crate::outcome::Resolution;
use crate::urgency::{UrgencyClock, UrgencyConfig, UrgencyLevel};

/// Monotonic order identity, assigned by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// What the client needs treated. Environment is present only on
/// three-item orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRequirements {
    pub monster: RequirementId,
    pub condition: RequirementId,
    pub environment: Option<RequirementId>,
}

impl OrderRequirements {
    pub fn new(
        monster: RequirementId,
        condition: RequirementId,
        environment: Option<RequirementId>,
    ) -> Self {
        Self {
            monster,
            condition,
            environment,
        }
    }

    /// Every id must exist in `catalog` under the category of its slot.
    pub fn validate(&self, catalog: &RequirementCatalog) -> Result<(), BoardError> {
        let slots = [
            Some((self.monster, Category::Monster)),
            Some((self.condition, Category::Condition)),
            self.environment.map(|id| (id, Category::Environment)),
        ];
        for (id, expected) in slots.into_iter().flatten() {
            match catalog.get(id) {
                Some(requirement) if requirement.category == expected => {}
                _ => {
                    return Err(BoardError::InvalidRequirement {
                        id: id.0,
                        expected,
                    })
                }
            }
        }
        Ok(())
    }

    /// 2 without an environment, 3 with one.
    pub fn items_needed(&self) -> usize {
        if self.environment.is_some() {
            3
        } else {
            2
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderState {
    Active,
    Resolved(Resolution),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    requirements: OrderRequirements,
    delivered: Vec<ItemType>,
    clock: UrgencyClock,
    state: OrderState,
}

impl Order {
    pub fn new(
        id: OrderId,
        requirements: OrderRequirements,
        max_duration: f32,
    ) -> Result<Self, ClockError> {
        let clock = UrgencyClock::new(max_duration)?;
        Ok(Self {
            id,
            requirements,
            delivered: Vec::with_capacity(requirements.items_needed()),
            clock,
            state: OrderState::Active,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn requirements(&self) -> &OrderRequirements {
        &self.requirements
    }

    pub fn items_needed(&self) -> usize {
        self.requirements.items_needed()
    }

    pub fn delivered(&self) -> &[ItemType] {
        &self.delivered
    }

    pub fn items_missing(&self) -> usize {
        self.items_needed() - self.delivered.len()
    }

    pub fn is_complete(&self) -> bool {
        self.delivered.len() == self.items_needed()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, OrderState::Active)
    }

    pub fn state(&self) -> &OrderState {
        &self.state
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match &self.state {
            OrderState::Resolved(resolution) => Some(resolution),
            OrderState::Active => None,
        }
    }

    pub fn clock(&self) -> &UrgencyClock {
        &self.clock
    }

    pub fn urgency(&self) -> UrgencyLevel {
        self.clock.level()
    }

    /// Append a delivered item. Returns whether the order is now complete.
    pub fn push_item(&mut self, item: ItemType) -> Result<bool, OrderFull> {
        if self.is_complete() {
            return Err(OrderFull(self.id.0));
        }
        self.delivered.push(item);
        Ok(self.is_complete())
    }

    pub(crate) fn advance_clock(&mut self, delta_seconds: f32, config: &UrgencyConfig) -> UrgencyLevel {
        self.clock.advance(delta_seconds, config)
    }

    pub(crate) fn abandon(&mut self) {
        self.clock.force_abandon();
    }

    pub(crate) fn mark_resolved(&mut self, resolution: Resolution) {
        self.state = OrderState::Resolved(resolution);
    }
}
