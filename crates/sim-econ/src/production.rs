//! Effective production rate.
//!
//! The base rate is the sum of installed upgrades. Bonuses stack
//! multiplicatively in a fixed order:
//!
//! ```text
//! base × planets × prestige × crew × morale × events × research × sets
//! ```

use catalog::{Catalog, SetBonusDef};
use rust_decimal::Decimal;
use sim_core::config::{CrewTuning, EconomyTuning};
use sim_core::number::{from_count, percent, saturating_add, saturating_mul};
use sim_core::{Amount, GameEvent, GameSession, Millis, Player, Tuning};
use sim_research::ResearchState;

/// Every factor of the rate, for display and debugging.
#[derive(Clone, Debug, PartialEq)]
pub struct RateBreakdown {
    pub base: Amount,
    pub planets: Amount,
    pub prestige: Amount,
    pub crew: Amount,
    pub morale: Amount,
    pub events: Amount,
    pub research: Amount,
    pub sets: Amount,
    pub effective: Amount,
}

/// `1 + (planets - 1) × planet_bonus`. Exactly 1 with only the home planet.
pub fn planet_factor(player: &Player, tuning: &EconomyTuning) -> Amount {
    let extra = player.planets().len().saturating_sub(1) as u32;
    Decimal::ONE + saturating_mul(from_count(extra), tuning.planet_bonus)
}

/// `1 + level × prestige_bonus + banked planets × per_planet + banked nodes × per_node`.
pub fn prestige_factor(player: &Player, tuning: &EconomyTuning) -> Amount {
    let level = saturating_mul(from_count(player.prestige_level()), tuning.prestige_bonus);
    let planets = saturating_mul(
        from_count(player.prestige_planet_bonus()),
        tuning.prestige_per_planet,
    );
    let nodes = saturating_mul(
        from_count(player.prestige_research_bonus()),
        tuning.prestige_per_node,
    );
    saturating_add(Decimal::ONE, saturating_add(level, saturating_add(planets, nodes)))
}

/// `1 + miners × miner_bonus + others × other_bonus + veterans × veteran_bonus`.
pub fn crew_factor(player: &Player, tuning: &CrewTuning) -> Amount {
    let crew = player.crew();
    let miners = saturating_mul(from_count(crew.miners()), tuning.miner_bonus);
    let others = saturating_mul(from_count(crew.others()), tuning.other_bonus);
    let veterans = saturating_mul(from_count(player.veteran_count()), tuning.veteran_bonus);
    saturating_add(Decimal::ONE, saturating_add(miners, saturating_add(others, veterans)))
}

/// Neutral without crew, a bonus while everyone is housed, a malus when
/// overcrowded. Never below `morale_floor` or zero.
pub fn morale_factor(player: &Player, tuning: &CrewTuning) -> Amount {
    let total = player.crew().total();
    if total == 0 {
        return Decimal::ONE;
    }
    if total <= player.crew_capacity(tuning) {
        Decimal::ONE + tuning.morale_bonus
    } else {
        (Decimal::ONE - tuning.morale_malus)
            .max(tuning.morale_floor)
            .max(Decimal::ZERO)
    }
}

/// Product of the multipliers of events still running at `now`.
pub fn event_multiplier(events: &[GameEvent], now: Millis) -> Amount {
    events
        .iter()
        .filter(|e| e.is_active(now))
        .fold(Decimal::ONE, |acc, e| saturating_mul(acc, e.effect.multiplier))
}

/// Set bonuses completed on at least one planet. Each set counts once.
pub fn completed_sets<'c>(player: &Player, catalog: &'c Catalog) -> Vec<&'c SetBonusDef> {
    catalog
        .set_bonuses()
        .iter()
        .filter(|set| {
            player.planets().iter().any(|planet| {
                let matching = planet
                    .upgrades()
                    .iter()
                    .filter(|u| u.module().is_some_and(|m| set.modules.iter().any(|s| s == m)))
                    .count() as u32;
                matching >= set.threshold
            })
        })
        .collect()
}

/// `1 + Σ bonus_pct / 100` over completed sets.
pub fn set_bonus_multiplier(player: &Player, catalog: &Catalog) -> Amount {
    let pct = completed_sets(player, catalog)
        .iter()
        .fold(Decimal::ZERO, |acc, s| saturating_add(acc, s.bonus_pct));
    Decimal::ONE + percent(pct)
}

/// All factors and their product.
pub fn breakdown(
    player: &Player,
    event_mult: Amount,
    research_mult: Amount,
    set_mult: Amount,
    tuning: &Tuning,
) -> RateBreakdown {
    let base = player.production_rate();
    let planets = planet_factor(player, &tuning.economy);
    let prestige = prestige_factor(player, &tuning.economy);
    let crew = crew_factor(player, &tuning.crew);
    let morale = morale_factor(player, &tuning.crew);
    let effective = [planets, prestige, crew, morale, event_mult, research_mult, set_mult]
        .into_iter()
        .fold(base, saturating_mul);
    RateBreakdown {
        base,
        planets,
        prestige,
        crew,
        morale,
        events: event_mult,
        research: research_mult,
        sets: set_mult,
        effective,
    }
}

/// Coins per second after every bonus.
pub fn effective_rate(
    player: &Player,
    event_mult: Amount,
    research_mult: Amount,
    set_mult: Amount,
    tuning: &Tuning,
) -> Amount {
    breakdown(player, event_mult, research_mult, set_mult, tuning).effective
}

/// Breakdown of a live session at `now`.
pub fn session_breakdown(
    session: &GameSession,
    research: &ResearchState,
    catalog: &Catalog,
    tuning: &Tuning,
    now: Millis,
) -> RateBreakdown {
    breakdown(
        &session.player,
        event_multiplier(&session.active_events, now),
        research.production_multiplier(),
        set_bonus_multiplier(&session.player, catalog),
        tuning,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::{CrewRole, EventEffect, Upgrade};

    fn upgrade(id: &str, cps: i64, module: Option<&str>) -> Upgrade {
        Upgrade::new(id, id, Decimal::ONE, Decimal::new(cps, 0), true)
            .unwrap()
            .with_module(module.map(str::to_string))
    }

    fn player_with_base(cps: i64) -> Player {
        let mut p = Player::fresh("p", &Tuning::default());
        p.install_now(0, upgrade("x", cps, None)).unwrap();
        p
    }

    #[test]
    fn single_planet_no_crew_is_base_rate() {
        let t = Tuning::default();
        let p = player_with_base(10);
        let b = breakdown(&p, Decimal::ONE, Decimal::ONE, Decimal::ONE, &t);
        assert_eq!(b.planets, Decimal::ONE);
        assert_eq!(b.morale, Decimal::ONE);
        assert_eq!(b.effective, Decimal::new(10, 0));
    }

    #[test]
    fn factors_multiply() {
        let t = Tuning::default();
        let p = player_with_base(100);
        let rate = effective_rate(&p, Decimal::TWO, Decimal::new(11, 1), Decimal::new(115, 2), &t);
        assert_eq!(
            rate,
            Decimal::new(100, 0) * Decimal::TWO * Decimal::new(11, 1) * Decimal::new(115, 2)
        );
    }

    #[test]
    fn morale_tracks_capacity() {
        let t = Tuning::default();
        let mut p = Player::fresh("p", &t);
        assert_eq!(morale_factor(&p, &t.crew), Decimal::ONE);
        p.hire(CrewRole::Miner, 2);
        assert_eq!(morale_factor(&p, &t.crew), Decimal::new(105, 2));
        p.hire(CrewRole::Miner, 1);
        assert_eq!(morale_factor(&p, &t.crew), Decimal::new(80, 2));

        let mut harsh = t.crew.clone();
        harsh.morale_malus = Decimal::new(15, 1);
        assert_eq!(morale_factor(&p, &harsh), Decimal::ZERO);
        harsh.morale_floor = Decimal::new(1, 1);
        assert_eq!(morale_factor(&p, &harsh), Decimal::new(1, 1));
    }

    #[test]
    fn crew_and_prestige_factors() {
        let t = Tuning::default();
        let mut p = Player::fresh("p", &t);
        p.hire(CrewRole::Miner, 2);
        p.hire(CrewRole::Astronaut, 1);
        assert_eq!(crew_factor(&p, &t.crew), Decimal::new(112, 2));
        assert_eq!(prestige_factor(&p, &t.economy), Decimal::ONE);
    }

    #[test]
    fn only_running_events_count() {
        let effect = |m: i64| EventEffect {
            multiplier: Decimal::new(m, 0),
            duration_ms: 1_000,
        };
        let events = vec![
            GameEvent::starting("a", "A", effect(2), 0),
            GameEvent::starting("b", "B", effect(3), 500),
        ];
        assert_eq!(event_multiplier(&events, 999), Decimal::new(6, 0));
        assert_eq!(event_multiplier(&events, 1_000), Decimal::new(3, 0));
        assert_eq!(event_multiplier(&events, 2_000), Decimal::ONE);
    }

    #[test]
    fn set_bonus_counts_each_set_once() {
        let c = Catalog::builtin().unwrap();
        let t = Tuning::default();
        let mut p = Player::fresh("p", &t);
        assert_eq!(set_bonus_multiplier(&p, &c), Decimal::ONE);
        p.install_now(0, upgrade("solar-panel", 1, Some("power"))).unwrap();
        p.install_now(0, upgrade("solar-panel", 1, Some("power"))).unwrap();
        assert_eq!(set_bonus_multiplier(&p, &c), Decimal::new(110, 2));
        p.install_now(0, upgrade("solar-panel", 1, Some("power"))).unwrap();
        // power-grid still counts once; self-sufficient now also completes
        assert_eq!(set_bonus_multiplier(&p, &c), Decimal::new(130, 2));
    }

    proptest! {
        #[test]
        fn one_planet_has_no_planet_bonus(
            base in 0i64..1_000_000,
            miners in 0u32..5,
            level in 0u32..10,
        ) {
            let t = Tuning::default();
            let mut parts = player_with_base(base).to_parts();
            parts.prestige_level = level;
            parts.crew.add(CrewRole::Miner, miners);
            let p = Player::from_parts(parts, t.crew.per_housing).unwrap();
            let b = breakdown(&p, Decimal::ONE, Decimal::ONE, Decimal::ONE, &t);
            prop_assert_eq!(b.planets, Decimal::ONE);
            prop_assert_eq!(b.effective, p.production_rate() * b.prestige * b.crew * b.morale);
        }
    }
}
