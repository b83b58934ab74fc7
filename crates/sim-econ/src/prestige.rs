//! Prestige: trade a run for a permanent production bonus.

use sim_core::{Player, Tuning};
use tracing::info;

/// Whether the player has enough coins to reset.
pub fn can_prestige(player: &Player, tuning: &Tuning) -> bool {
    player.coins() >= tuning.economy.prestige_coin_threshold
}

/// The player after a reset. Does not check [`can_prestige`].
///
/// The new run starts with one empty home planet, no coins and no crew.
/// Lifetime coins and artifacts carry over; the level goes up by one and
/// every planet beyond the home planet is banked as a permanent bonus.
pub fn create_after_prestige(old: &Player, tuning: &Tuning) -> Player {
    create_after_prestige_banking(old, tuning, old.prestige_research_bonus())
}

/// Like [`create_after_prestige`], also banking `research_unlocked` nodes.
/// The banked count never goes down.
pub fn create_after_prestige_banking(
    old: &Player,
    tuning: &Tuning,
    research_unlocked: u32,
) -> Player {
    let mut legacy = old.legacy();
    let colonies = old.planets().len().saturating_sub(1) as u32;
    legacy.prestige_level = legacy.prestige_level.saturating_add(1);
    legacy.prestige_planet_bonus = legacy.prestige_planet_bonus.saturating_add(colonies);
    legacy.prestige_research_bonus = legacy.prestige_research_bonus.max(research_unlocked);
    info!(
        player = old.id(),
        level = legacy.prestige_level,
        banked_planets = legacy.prestige_planet_bonus,
        "prestige reset"
    );
    Player::fresh_with(old.id(), tuning, legacy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use sim_core::{naming, Artifact, CrewRole, Planet, Rarity, Upgrade};

    fn rich_player(planets: usize) -> Player {
        let t = Tuning::default();
        let mut p = Player::fresh("p", &t);
        p.earn(Decimal::new(2_000_000, 0)).unwrap();
        let drill =
            Upgrade::new("drill", "Drill", Decimal::new(45, 0), Decimal::new(8, 1), true).unwrap();
        p.install_now(0, drill).unwrap();
        for i in 1..planets {
            let id = naming::planet_id(i);
            p.add_planet(Planet::new(id.clone(), naming::planet_name(&id), 5)).unwrap();
        }
        p.hire(CrewRole::Astronaut, 2);
        p.add_artifact(Artifact {
            id: "star-map".into(),
            name: "Star Map".into(),
            rarity: Rarity::Rare,
            found_at: 10,
        });
        p
    }

    #[test]
    fn threshold_gates_prestige() {
        let t = Tuning::default();
        assert!(can_prestige(&rich_player(1), &t));
        assert!(!can_prestige(&Player::fresh("p", &t), &t));
    }

    #[test]
    fn reset_keeps_legacy_only() {
        let t = Tuning::default();
        let old = rich_player(3);
        let new = create_after_prestige(&old, &t);
        assert_eq!(new.coins(), Decimal::ZERO);
        assert_eq!(new.production_rate(), Decimal::ZERO);
        assert_eq!(new.prestige_level(), 1);
        assert_eq!(new.prestige_planet_bonus(), 2);
        assert_eq!(new.total_coins_ever(), old.total_coins_ever());
        assert_eq!(new.artifacts(), old.artifacts());
        assert_eq!(new.crew().total(), 0);
        assert_eq!(new.veteran_count(), 0);
        assert_eq!(new.planets()[0].max_upgrades(), t.economy.default_max_upgrades);
    }

    #[test]
    fn banked_research_never_drops() {
        let t = Tuning::default();
        let once = create_after_prestige_banking(&rich_player(1), &t, 4);
        assert_eq!(once.prestige_research_bonus(), 4);
        let twice = create_after_prestige_banking(&once, &t, 2);
        assert_eq!(twice.prestige_research_bonus(), 4);
        assert_eq!(twice.prestige_level(), 2);
    }

    proptest! {
        #[test]
        fn reset_always_yields_one_empty_planet(planets in 1usize..6) {
            let new = create_after_prestige(&rich_player(planets), &Tuning::default());
            prop_assert_eq!(new.planets().len(), 1);
            prop_assert!(new.planets()[0].upgrades().is_empty());
            prop_assert_eq!(new.planets()[0].housing(), 0);
            prop_assert_eq!(new.prestige_planet_bonus() as usize, planets - 1);
        }
    }
}
