//! Balance constants for the whole engine.
//!
//! Every field has a default so a partial YAML/JSON override only needs to
//! name the values it changes.

use crate::number::{Amount, Millis};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All tunable constants, grouped by subsystem.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub economy: EconomyTuning,
    pub crew: CrewTuning,
    pub research: ResearchTuning,
    pub events: EventTuning,
    pub expedition: ExpeditionTuning,
    pub offline: OfflineTuning,
}

/// Production multipliers and prices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    /// Bonus per planet beyond the home planet (0.10 = +10%).
    pub planet_bonus: Amount,
    /// Bonus per prestige level.
    pub prestige_bonus: Amount,
    /// Bonus per banked prestige planet.
    pub prestige_per_planet: Amount,
    /// Bonus per banked prestige research node.
    pub prestige_per_node: Amount,
    /// Coins required before prestige is offered.
    pub prestige_coin_threshold: Amount,
    /// Coins earned per click before research bonuses.
    pub click_base: Amount,
    /// Share of an upgrade's cost refunded when its uninstall completes.
    pub uninstall_refund_pct: Amount,
    /// Price of the second planet; later planets scale with the square of the count.
    pub planet_base_cost: Amount,
    pub housing_cost: Amount,
    /// Price of one extra slot per slot already owned.
    pub slot_expand_cost: Amount,
    /// Slot capacity of a freshly created planet.
    pub default_max_upgrades: u32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            planet_bonus: Decimal::new(10, 2),
            prestige_bonus: Decimal::new(25, 2),
            prestige_per_planet: Decimal::new(2, 2),
            prestige_per_node: Decimal::new(1, 2),
            prestige_coin_threshold: Decimal::new(1_000_000, 0),
            click_base: Decimal::ONE,
            uninstall_refund_pct: Decimal::new(50, 0),
            planet_base_cost: Decimal::new(5_000, 0),
            housing_cost: Decimal::new(250, 0),
            slot_expand_cost: Decimal::new(100, 0),
            default_max_upgrades: 5,
        }
    }
}

/// Crew bonuses, morale and hiring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewTuning {
    pub miner_bonus: Amount,
    pub other_bonus: Amount,
    pub veteran_bonus: Amount,
    pub morale_bonus: Amount,
    pub morale_malus: Amount,
    /// Lowest morale factor the calculator will ever return.
    pub morale_floor: Amount,
    /// Crew the player can hold without any housing.
    pub base_capacity: u32,
    /// Crew capacity added by one housing module.
    pub per_housing: u32,
    pub hire_base_cost: Amount,
    /// Added to the hire price for every crew member already on the roster.
    pub hire_cost_step: Amount,
}

impl Default for CrewTuning {
    fn default() -> Self {
        Self {
            miner_bonus: Decimal::new(5, 2),
            other_bonus: Decimal::new(2, 2),
            veteran_bonus: Decimal::new(3, 2),
            morale_bonus: Decimal::new(5, 2),
            morale_malus: Decimal::new(20, 2),
            morale_floor: Decimal::ZERO,
            base_capacity: 2,
            per_housing: 4,
            hire_base_cost: Decimal::new(50, 0),
            hire_cost_step: Decimal::new(25, 0),
        }
    }
}

/// Research success chances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchTuning {
    /// Added chance per scientist on the roster.
    pub scientist_bonus_per: f64,
    /// Upper bound of the scientist contribution.
    pub scientist_cap: f64,
    /// Consecutive failures after which the next attempt always succeeds.
    pub pity_threshold: u32,
    /// Research data produced per scientist per second.
    pub data_per_scientist: Amount,
}

impl Default for ResearchTuning {
    fn default() -> Self {
        Self {
            scientist_bonus_per: 0.05,
            scientist_cap: 0.25,
            pity_threshold: 3,
            data_per_scientist: Decimal::new(1, 2),
        }
    }
}

/// Random timed events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTuning {
    pub roll_interval_ms: Millis,
    /// Chance that a roll spawns an event.
    pub chance: f64,
    /// Maximum simultaneously active events.
    pub max_active: usize,
}

impl Default for EventTuning {
    fn default() -> Self {
        Self {
            roll_interval_ms: 60_000,
            chance: 0.25,
            max_active: 2,
        }
    }
}

/// Crewed expeditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpeditionTuning {
    pub duration_ms: Millis,
    /// Chance that each crew member is lost.
    pub loss_chance: f64,
    pub reward_per_survivor: Amount,
    pub artifact_chance: f64,
}

impl Default for ExpeditionTuning {
    fn default() -> Self {
        Self {
            duration_ms: 300_000,
            loss_chance: 0.2,
            reward_per_survivor: Decimal::new(100, 0),
            artifact_chance: 0.3,
        }
    }
}

/// Production credited while the game was closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineTuning {
    pub cap_ms: Millis,
    pub efficiency: Amount,
}

impl Default for OfflineTuning {
    fn default() -> Self {
        Self {
            cap_ms: 8 * 60 * 60 * 1000,
            efficiency: Decimal::new(5, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let json = r#"{ "crew": { "base_capacity": 3 }, "research": { "pity_threshold": 5 } }"#;
        let t: Tuning = serde_json::from_str(json).unwrap();
        assert_eq!(t.crew.base_capacity, 3);
        assert_eq!(t.crew.per_housing, CrewTuning::default().per_housing);
        assert_eq!(t.research.pity_threshold, 5);
        assert_eq!(t.economy, EconomyTuning::default());
    }
}
