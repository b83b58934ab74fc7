#![deny(warnings)]

//! Static game data: upgrades, research tree, events, set bonuses and
//! achievements.
//!
//! A [`Catalog`] is parsed and validated once, then only read. Lookups return
//! `Option` so callers decide how to report a miss.

use rust_decimal::Decimal;
use serde::Deserialize;
use sim_core::{Amount, CoreError, CrewRole, Millis, Upgrade, UpgradeId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

const BUILTIN_YAML: &str = include_str!("../assets/builtin.yaml");

/// Catalog loading and validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    Parse(String),
    #[error("duplicate {kind} id: {id}")]
    Duplicate { kind: &'static str, id: String },
    #[error("research node {node} requires unknown node {prerequisite}")]
    UnknownPrerequisite { node: String, prerequisite: String },
    #[error("research tree has a cycle through {0}")]
    Cycle(String),
    #[error("research node {node} has chance {chance} outside [0,1]")]
    InvalidChance { node: String, chance: f64 },
    #[error("negative cost or production on {0}")]
    NegativeCost(String),
    #[error("invalid event {0}")]
    InvalidEvent(String),
    #[error("invalid set bonus {0}")]
    InvalidSetBonus(String),
}

fn yes() -> bool {
    true
}

fn one() -> u32 {
    1
}

/// Purchasable upgrade definition.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: String,
    pub cost: Amount,
    pub coins_per_second: Amount,
    #[serde(default = "yes")]
    pub uses_slot: bool,
    /// Free crew moved to equipment duty on purchase.
    #[serde(default)]
    pub crew_required: u32,
    /// Installation time; 0 installs immediately.
    #[serde(default)]
    pub install_ms: Millis,
    /// Module kind counted by set bonuses.
    #[serde(default)]
    pub module: Option<String>,
}

impl UpgradeDef {
    /// Build an owned instance. `slot_free` drops the slot requirement.
    pub fn instantiate(&self, slot_free: bool) -> Result<Upgrade, CoreError> {
        Upgrade::new(
            self.id.clone(),
            self.name.clone(),
            self.cost,
            self.coins_per_second,
            self.uses_slot && !slot_free,
        )
        .map(|u| u.with_module(self.module.clone()))
    }
}

/// What unlocking a research node grants.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResearchModifiers {
    pub production_pct: Amount,
    pub click_pct: Amount,
    pub unlocks_crew_role: Option<CrewRole>,
    /// Upgrades bought after the unlock no longer use a slot.
    pub slot_free: Vec<UpgradeId>,
    /// Upgrades bought after the unlock no longer need crew.
    pub crew_free: Vec<UpgradeId>,
}

/// Node of the research tree.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResearchNode {
    pub id: String,
    pub name: String,
    pub row: u32,
    pub col: u32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    pub cost_coins: Amount,
    #[serde(default)]
    pub cost_data: Amount,
    pub base_chance: f64,
    #[serde(default)]
    pub modifiers: ResearchModifiers,
}

/// Random timed production event.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub name: String,
    pub multiplier: Amount,
    pub duration_ms: Millis,
    #[serde(default = "one")]
    pub weight: u32,
}

/// Outcome of picking a choice.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChoiceEffect {
    Coins { amount: Amount },
    /// Instant payout of this many seconds of current production.
    ProductionSeconds { seconds: u32 },
    /// Start a catalog event.
    Event { event: String },
    Nothing,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Choice {
    pub label: String,
    pub effect: ChoiceEffect,
}

/// Event that asks the player to pick one option.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChoiceEventDef {
    pub id: String,
    pub name: String,
    pub choices: Vec<Choice>,
}

/// Production bonus for `threshold` modules of the listed kinds on one planet.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SetBonusDef {
    pub id: String,
    pub name: String,
    pub modules: Vec<String>,
    pub threshold: u32,
    pub bonus_pct: Amount,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementCondition {
    TotalCoins { amount: Amount },
    Planets { count: u32 },
    PrestigeLevel { level: u32 },
    ResearchUnlocked { count: u32 },
    CrewHired { count: u32 },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub condition: AchievementCondition,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CatalogFile {
    upgrades: Vec<UpgradeDef>,
    research: Vec<ResearchNode>,
    events: Vec<EventDef>,
    choice_events: Vec<ChoiceEventDef>,
    set_bonuses: Vec<SetBonusDef>,
    achievements: Vec<AchievementDef>,
}

/// Read-only index of every definition.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    upgrades: BTreeMap<UpgradeId, UpgradeDef>,
    research: BTreeMap<String, ResearchNode>,
    events: BTreeMap<String, EventDef>,
    choice_events: BTreeMap<String, ChoiceEventDef>,
    set_bonuses: Vec<SetBonusDef>,
    achievements: Vec<AchievementDef>,
}

impl Catalog {
    /// The data shipped with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_YAML)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(text).map_err(|e| CatalogError::Parse(e.to_string()))?;
        let catalog = Self::index(file)?;
        catalog.validate()?;
        debug!(
            upgrades = catalog.upgrades.len(),
            research = catalog.research.len(),
            events = catalog.events.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn index(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();
        for u in file.upgrades {
            if catalog.upgrades.contains_key(&u.id) {
                return Err(CatalogError::Duplicate {
                    kind: "upgrade",
                    id: u.id.0,
                });
            }
            catalog.upgrades.insert(u.id.clone(), u);
        }
        for mut n in file.research {
            let mut seen = BTreeSet::new();
            n.prerequisites.retain(|p| seen.insert(p.clone()));
            if catalog.research.contains_key(&n.id) {
                return Err(CatalogError::Duplicate {
                    kind: "research",
                    id: n.id,
                });
            }
            catalog.research.insert(n.id.clone(), n);
        }
        for e in file.events {
            if catalog.events.contains_key(&e.id) {
                return Err(CatalogError::Duplicate {
                    kind: "event",
                    id: e.id,
                });
            }
            catalog.events.insert(e.id.clone(), e);
        }
        for c in file.choice_events {
            if catalog.choice_events.contains_key(&c.id) || catalog.events.contains_key(&c.id) {
                return Err(CatalogError::Duplicate {
                    kind: "event",
                    id: c.id,
                });
            }
            catalog.choice_events.insert(c.id.clone(), c);
        }
        catalog.set_bonuses = file.set_bonuses;
        catalog.achievements = file.achievements;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for u in self.upgrades.values() {
            if u.cost < Decimal::ZERO || u.coins_per_second < Decimal::ZERO || u.install_ms < 0 {
                return Err(CatalogError::NegativeCost(u.id.0.clone()));
            }
        }
        for n in self.research.values() {
            if !(0.0..=1.0).contains(&n.base_chance) || !n.base_chance.is_finite() {
                return Err(CatalogError::InvalidChance {
                    node: n.id.clone(),
                    chance: n.base_chance,
                });
            }
            if n.cost_coins < Decimal::ZERO || n.cost_data < Decimal::ZERO {
                return Err(CatalogError::NegativeCost(n.id.clone()));
            }
            for p in &n.prerequisites {
                if !self.research.contains_key(p) {
                    return Err(CatalogError::UnknownPrerequisite {
                        node: n.id.clone(),
                        prerequisite: p.clone(),
                    });
                }
            }
        }
        self.check_acyclic()?;
        for e in self.events.values() {
            if e.multiplier <= Decimal::ZERO || e.duration_ms <= 0 {
                return Err(CatalogError::InvalidEvent(e.id.clone()));
            }
        }
        for c in self.choice_events.values() {
            if c.choices.is_empty() {
                return Err(CatalogError::InvalidEvent(c.id.clone()));
            }
            for choice in &c.choices {
                if let ChoiceEffect::Event { event } = &choice.effect {
                    if !self.events.contains_key(event) {
                        return Err(CatalogError::InvalidEvent(c.id.clone()));
                    }
                }
            }
        }
        for s in &self.set_bonuses {
            if s.modules.is_empty() || s.threshold == 0 || s.bonus_pct < Decimal::ZERO {
                return Err(CatalogError::InvalidSetBonus(s.id.clone()));
            }
        }
        Ok(())
    }

    /// Kahn's algorithm over prerequisite edges; any node left over sits on a cycle.
    fn check_acyclic(&self) -> Result<(), CatalogError> {
        let mut remaining: BTreeMap<&str, usize> = self
            .research
            .values()
            .map(|n| (n.id.as_str(), n.prerequisites.len()))
            .collect();
        let mut ready: Vec<&str> = remaining
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut done: BTreeSet<&str> = BTreeSet::new();
        while let Some(id) = ready.pop() {
            done.insert(id);
            for n in self.research.values() {
                if n.prerequisites.iter().any(|p| p == id) {
                    if let Some(deg) = remaining.get_mut(n.id.as_str()) {
                        *deg -= 1;
                        if *deg == 0 {
                            ready.push(n.id.as_str());
                        }
                    }
                }
            }
        }
        match self.research.keys().find(|id| !done.contains(id.as_str())) {
            Some(id) => Err(CatalogError::Cycle(id.clone())),
            None => Ok(()),
        }
    }

    pub fn upgrade(&self, id: &UpgradeId) -> Option<&UpgradeDef> {
        self.upgrades.get(id)
    }

    pub fn upgrades(&self) -> impl Iterator<Item = &UpgradeDef> {
        self.upgrades.values()
    }

    pub fn research_node(&self, id: &str) -> Option<&ResearchNode> {
        self.research.get(id)
    }

    /// Nodes in tree layout order (row, then column).
    pub fn research_nodes(&self) -> Vec<&ResearchNode> {
        let mut nodes: Vec<&ResearchNode> = self.research.values().collect();
        nodes.sort_by_key(|n| (n.row, n.col));
        nodes
    }

    pub fn event(&self, id: &str) -> Option<&EventDef> {
        self.events.get(id)
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDef> {
        self.events.values()
    }

    pub fn choice_event(&self, id: &str) -> Option<&ChoiceEventDef> {
        self.choice_events.get(id)
    }

    pub fn choice_events(&self) -> impl Iterator<Item = &ChoiceEventDef> {
        self.choice_events.values()
    }

    pub fn set_bonuses(&self) -> &[SetBonusDef] {
        &self.set_bonuses
    }

    pub fn achievements(&self) -> &[AchievementDef] {
        &self.achievements
    }
}
