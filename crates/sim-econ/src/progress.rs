//! Achievements and the upgrade codex. Both only ever grow and are kept
//! across prestige.

use catalog::{AchievementCondition, Catalog};
use serde::{Deserialize, Serialize};
use sim_core::{Amount, Millis, Player, UpgradeId};
use sim_research::ResearchState;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Numbers achievement conditions are checked against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub total_coins: Amount,
    pub planets: u32,
    pub prestige_level: u32,
    pub research_unlocked: u32,
    pub crew_hired: u32,
}

impl ProgressSnapshot {
    pub fn of(player: &Player, research: &ResearchState) -> Self {
        Self {
            total_coins: player.total_coins_ever(),
            planets: player.planets().len() as u32,
            prestige_level: player.prestige_level(),
            research_unlocked: research.unlocked_count(),
            crew_hired: player.crew().total(),
        }
    }
}

fn met(condition: &AchievementCondition, s: &ProgressSnapshot) -> bool {
    match condition {
        AchievementCondition::TotalCoins { amount } => s.total_coins >= *amount,
        AchievementCondition::Planets { count } => s.planets >= *count,
        AchievementCondition::PrestigeLevel { level } => s.prestige_level >= *level,
        AchievementCondition::ResearchUnlocked { count } => s.research_unlocked >= *count,
        AchievementCondition::CrewHired { count } => s.crew_hired >= *count,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressBook {
    /// Achievement id to unlock time.
    achievements: BTreeMap<String, Millis>,
    /// Upgrades the player has seen installed at least once.
    codex: BTreeSet<UpgradeId>,
}

impl ProgressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.contains_key(id)
    }

    pub fn achievements(&self) -> &BTreeMap<String, Millis> {
        &self.achievements
    }

    pub fn codex(&self) -> &BTreeSet<UpgradeId> {
        &self.codex
    }

    /// Unlock every achievement whose condition now holds. Returns the new ids.
    pub fn evaluate(
        &mut self,
        catalog: &Catalog,
        snapshot: &ProgressSnapshot,
        now: Millis,
    ) -> Vec<String> {
        let mut unlocked = Vec::new();
        for def in catalog.achievements() {
            if self.has_achievement(&def.id) || !met(&def.condition, snapshot) {
                continue;
            }
            self.achievements.insert(def.id.clone(), now);
            info!(achievement = %def.id, "achievement unlocked");
            unlocked.push(def.id.clone());
        }
        unlocked
    }

    /// Record an upgrade sighting. Returns true the first time.
    pub fn record_sighting(&mut self, id: &UpgradeId) -> bool {
        self.codex.insert(id.clone())
    }

    /// Record every upgrade installed on any planet. Returns first sightings.
    pub fn observe(&mut self, player: &Player) -> Vec<UpgradeId> {
        let mut seen = Vec::new();
        for planet in player.planets() {
            for upgrade in planet.upgrades() {
                if self.record_sighting(upgrade.id()) {
                    seen.push(upgrade.id().clone());
                }
            }
        }
        seen
    }
}
