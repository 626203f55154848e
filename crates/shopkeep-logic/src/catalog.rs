//! Reference data: requirements (monster, condition, environment) and items.
//!
//! Requirements list the items that treat them in three disjoint tiers.
//! `Good` and `Mid` items satisfy the requirement, `Bad` items are known to
//! be wrong, and anything unlisted does not satisfy it either. Each item's
//! compatible sets are derived from those tiers when the catalog is built,
//! so both views always agree.
//!
//! The default data set lives in `data/catalog.json` and is embedded at
//! compile time.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

/// Identity of an item kind. Dense index into the item catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemType(pub u16);

/// Identity of a requirement. Dense index into the requirement catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequirementId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Monster,
    Condition,
    Environment,
}

/// How well an item treats a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Good,
    Mid,
    Bad,
}

impl Tier {
    /// Whether an item in this tier counts as correct.
    pub fn satisfies(self) -> bool {
        matches!(self, Tier::Good | Tier::Mid)
    }
}

#[derive(Debug, Clone)]
pub struct Requirement {
    pub id: RequirementId,
    pub name: String,
    pub category: Category,
    pub good: BTreeSet<ItemType>,
    pub mid: BTreeSet<ItemType>,
    pub bad: BTreeSet<ItemType>,
}

impl Requirement {
    pub fn tier_of(&self, item: ItemType) -> Option<Tier> {
        if self.good.contains(&item) {
            Some(Tier::Good)
        } else if self.mid.contains(&item) {
            Some(Tier::Mid)
        } else if self.bad.contains(&item) {
            Some(Tier::Bad)
        } else {
            None
        }
    }

    pub fn is_satisfied_by(&self, item: ItemType) -> bool {
        self.tier_of(item).is_some_and(Tier::satisfies)
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub item_type: ItemType,
    pub name: String,
    /// Sale value credited on every delivery.
    pub price: f32,
    pub compatible_monsters: BTreeSet<RequirementId>,
    pub compatible_conditions: BTreeSet<RequirementId>,
    pub compatible_environments: BTreeSet<RequirementId>,
}

impl Item {
    /// Requirements of `category` this item satisfies.
    pub fn compatible(&self, category: Category) -> &BTreeSet<RequirementId> {
        match category {
            Category::Monster => &self.compatible_monsters,
            Category::Condition => &self.compatible_conditions,
            Category::Environment => &self.compatible_environments,
        }
    }

    fn compatible_mut(&mut self, category: Category) -> &mut BTreeSet<RequirementId> {
        match category {
            Category::Monster => &mut self.compatible_monsters,
            Category::Condition => &mut self.compatible_conditions,
            Category::Environment => &mut self.compatible_environments,
        }
    }
}

/// All requirements, indexed by [`RequirementId`].
#[derive(Debug, Clone, Default)]
pub struct RequirementCatalog {
    requirements: Vec<Requirement>,
}

impl RequirementCatalog {
    pub fn get(&self, id: RequirementId) -> Option<&Requirement> {
        self.requirements.get(id.0 as usize)
    }

    pub fn find(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Requirement> + '_ {
        self.requirements
            .iter()
            .filter(move |r| r.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> + '_ {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// All items, indexed by [`ItemType`].
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<Item>,
}

impl ItemCatalog {
    pub fn get(&self, item: ItemType) -> Option<&Item> {
        self.items.get(item.0 as usize)
    }

    pub fn find(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Requirements and items loaded together, cross-referenced.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub requirements: RequirementCatalog,
    pub items: ItemCatalog,
}

// ── JSON layout ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogFile {
    pub items: Vec<ItemSpec>,
    pub requirements: Vec<RequirementSpec>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub price: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub good: Vec<String>,
    #[serde(default)]
    pub mid: Vec<String>,
    #[serde(default)]
    pub bad: Vec<String>,
}

impl Catalog {
    /// The catalog shipped with the game.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(CATALOG_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::build(file)
    }

    /// Validate the raw layout and derive per-item compatibility.
    pub fn build(file: CatalogFile) -> Result<Self, CatalogError> {
        if file.items.len() > u16::MAX as usize {
            return Err(CatalogError::TooManyEntries {
                what: "items",
                max: u16::MAX as usize,
            });
        }
        if file.requirements.len() > u16::MAX as usize {
            return Err(CatalogError::TooManyEntries {
                what: "requirements",
                max: u16::MAX as usize,
            });
        }

        let mut items = Vec::with_capacity(file.items.len());
        let mut item_index: HashMap<String, ItemType> = HashMap::new();
        for (i, raw) in file.items.into_iter().enumerate() {
            if !raw.price.is_finite() || raw.price < 0.0 {
                return Err(CatalogError::InvalidPrice {
                    item: raw.name,
                    price: raw.price,
                });
            }
            let item_type = ItemType(i as u16);
            if item_index.insert(raw.name.clone(), item_type).is_some() {
                return Err(CatalogError::DuplicateItem(raw.name));
            }
            items.push(Item {
                item_type,
                name: raw.name,
                price: raw.price,
                compatible_monsters: BTreeSet::new(),
                compatible_conditions: BTreeSet::new(),
                compatible_environments: BTreeSet::new(),
            });
        }

        let mut requirements = Vec::with_capacity(file.requirements.len());
        let mut seen_names = BTreeSet::new();
        for (i, raw) in file.requirements.into_iter().enumerate() {
            if !seen_names.insert(raw.name.clone()) {
                return Err(CatalogError::DuplicateRequirement(raw.name));
            }
            let id = RequirementId(i as u16);
            let resolve = |names: &[String]| -> Result<BTreeSet<ItemType>, CatalogError> {
                names
                    .iter()
                    .map(|n| {
                        item_index
                            .get(n)
                            .copied()
                            .ok_or_else(|| CatalogError::UnknownItem {
                                requirement: raw.name.clone(),
                                item: n.clone(),
                            })
                    })
                    .collect()
            };
            let good = resolve(&raw.good)?;
            let mid = resolve(&raw.mid)?;
            let bad = resolve(&raw.bad)?;

            let overlap = good
                .intersection(&mid)
                .chain(good.intersection(&bad))
                .chain(mid.intersection(&bad))
                .next()
                .copied();
            if let Some(item) = overlap {
                return Err(CatalogError::OverlappingTiers {
                    requirement: raw.name,
                    item: items[item.0 as usize].name.clone(),
                });
            }

            for item in good.iter().chain(mid.iter()) {
                items[item.0 as usize]
                    .compatible_mut(raw.category)
                    .insert(id);
            }

            requirements.push(Requirement {
                id,
                name: raw.name,
                category: raw.category,
                good,
                mid,
                bad,
            });
        }

        for category in [Category::Monster, Category::Condition] {
            if !requirements.iter().any(|r| r.category == category) {
                return Err(CatalogError::MissingCategory(category));
            }
        }

        log::debug!(
            "catalog loaded: {} items, {} requirements",
            items.len(),
            requirements.len()
        );

        Ok(Self {
            requirements: RequirementCatalog { requirements },
            items: ItemCatalog { items },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_json() -> &'static str {
        r#"{
            "items": [
                { "name": "tea", "price": 4.0 },
                { "name": "salve", "price": 6.0 },
                { "name": "rock", "price": 1.0 }
            ],
            "requirements": [
                { "name": "vampire", "category": "monster", "good": ["tea"], "mid": ["salve"], "bad": ["rock"] },
                { "name": "fever", "category": "condition", "good": ["salve"], "bad": ["tea"] },
                { "name": "crypt", "category": "environment", "mid": ["tea", "salve"] }
            ]
        }"#
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = Catalog::embedded().unwrap();
        assert!(catalog.items.len() >= 5);
        assert!(catalog.requirements.in_category(Category::Monster).count() >= 2);
        assert!(catalog.requirements.in_category(Category::Condition).count() >= 2);
        assert!(catalog.requirements.in_category(Category::Environment).count() >= 1);
    }

    #[test]
    fn test_compatibility_derived_from_tiers() {
        let catalog = Catalog::from_json(tiny_json()).unwrap();
        let vampire = catalog.requirements.find("vampire").unwrap().id;
        let fever = catalog.requirements.find("fever").unwrap().id;
        let crypt = catalog.requirements.find("crypt").unwrap().id;

        let tea = catalog.items.find("tea").unwrap();
        assert!(tea.compatible_monsters.contains(&vampire));
        assert!(!tea.compatible_conditions.contains(&fever));
        assert!(tea.compatible_environments.contains(&crypt));

        let rock = catalog.items.find("rock").unwrap();
        assert!(rock.compatible_monsters.is_empty());
        assert!(rock.compatible_conditions.is_empty());
    }

    #[test]
    fn test_tier_lookup() {
        let catalog = Catalog::from_json(tiny_json()).unwrap();
        let vampire = catalog.requirements.find("vampire").unwrap();
        assert_eq!(vampire.tier_of(ItemType(0)), Some(Tier::Good));
        assert_eq!(vampire.tier_of(ItemType(1)), Some(Tier::Mid));
        assert_eq!(vampire.tier_of(ItemType(2)), Some(Tier::Bad));
        assert!(vampire.is_satisfied_by(ItemType(1)));
        assert!(!vampire.is_satisfied_by(ItemType(2)));

        let fever = catalog.requirements.find("fever").unwrap();
        assert_eq!(fever.tier_of(ItemType(2)), None);
        assert!(!fever.is_satisfied_by(ItemType(2)));
    }

    #[test]
    fn test_overlapping_tiers_rejected() {
        let json = r#"{
            "items": [{ "name": "tea", "price": 1.0 }],
            "requirements": [
                { "name": "vampire", "category": "monster", "good": ["tea"], "bad": ["tea"] },
                { "name": "fever", "category": "condition" }
            ]
        }"#;
        match Catalog::from_json(json) {
            Err(CatalogError::OverlappingTiers { requirement, item }) => {
                assert_eq!(requirement, "vampire");
                assert_eq!(item, "tea");
            }
            other => panic!("expected OverlappingTiers, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_item_rejected() {
        let json = r#"{
            "items": [],
            "requirements": [
                { "name": "vampire", "category": "monster", "good": ["garlic"] }
            ]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::UnknownItem { .. })
        ));
    }

    #[test]
    fn test_missing_condition_category_rejected() {
        let json = r#"{
            "items": [{ "name": "tea", "price": 1.0 }],
            "requirements": [
                { "name": "vampire", "category": "monster", "good": ["tea"] }
            ]
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::MissingCategory(Category::Condition))
        ));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let json = r#"{
            "items": [{ "name": "tea", "price": 1.0 }, { "name": "tea", "price": 2.0 }],
            "requirements": []
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateItem(_))
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let json = r#"{
            "items": [{ "name": "tea", "price": -1.0 }],
            "requirements": []
        }"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::InvalidPrice { .. })
        ));
    }
}
