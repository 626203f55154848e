//! Item correctness against an order's requirements.
//!
//! Monster and condition are mandatory: failing either makes the item wrong
//! no matter what else matches. The environment is only checked when the
//! order names one, so a two-item order never penalises on it.

use crate::catalog::{Category, Item, ItemCatalog, Requirement, Tier};
use crate::order::{Order, OrderRequirements};

/// Whether `item` is a correct delivery for an order with `requirements`.
pub fn is_compatible(item: &Item, requirements: &OrderRequirements) -> bool {
    if !item.compatible_monsters.contains(&requirements.monster) {
        return false;
    }
    if !item.compatible_conditions.contains(&requirements.condition) {
        return false;
    }
    match requirements.environment {
        Some(env) => item.compatible_environments.contains(&env),
        None => true,
    }
}

/// Number of delivered items that are correct for the order.
///
/// Every delivery is checked on its own; duplicates each count. Item types
/// missing from the catalog count as wrong.
pub fn count_correct(order: &Order, items: &ItemCatalog) -> usize {
    order
        .delivered()
        .iter()
        .filter(|&&item_type| {
            items
                .get(item_type)
                .is_some_and(|item| is_compatible(item, order.requirements()))
        })
        .count()
}

/// Catalog tier of `item` for one requirement, for hint display.
pub fn match_tier(item: &Item, requirement: &Requirement) -> Option<Tier> {
    requirement.tier_of(item.item_type)
}

/// Which of the order's requirements `item` fails, in check order.
pub fn failed_categories(item: &Item, requirements: &OrderRequirements) -> Vec<Category> {
    let mut failed = Vec::new();
    if !item.compatible_monsters.contains(&requirements.monster) {
        failed.push(Category::Monster);
    }
    if !item.compatible_conditions.contains(&requirements.condition) {
        failed.push(Category::Condition);
    }
    if let Some(env) = requirements.environment {
        if !item.compatible_environments.contains(&env) {
            failed.push(Category::Environment);
        }
    }
    failed
}
