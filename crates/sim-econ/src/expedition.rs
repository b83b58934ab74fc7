//! Crewed expeditions: astronauts leave for a while, some may not return,
//! survivors come back as veterans with coins and sometimes an artifact.

use crate::error::ActionError;
use rust_decimal::Decimal;
use sim_core::config::ExpeditionTuning;
use sim_core::number::{from_count, saturating_mul};
use sim_core::{Amount, Artifact, Millis, Player, Rarity};
use sim_research::RollSource;
use tracing::info;

/// Artifacts an expedition can bring home, rarest last.
const ARTIFACTS: &[(&str, &str, Rarity)] = &[
    ("meteor-fragment", "Meteor Fragment", Rarity::Common),
    ("fossil-spore", "Fossil Spore", Rarity::Common),
    ("ancient-star-map", "Ancient Star Map", Rarity::Rare),
    ("singing-crystal", "Singing Crystal", Rarity::Rare),
    ("void-compass", "Void Compass", Rarity::Legendary),
];

fn rarity_weight(rarity: Rarity) -> u32 {
    match rarity {
        Rarity::Common => 10,
        Rarity::Rare => 4,
        Rarity::Legendary => 1,
    }
}

/// Outcome of a returned expedition.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpeditionReport {
    pub sent: u32,
    pub lost: u32,
    pub survivors: u32,
    pub reward: Amount,
    pub artifact: Option<Artifact>,
}

/// Send `crew` free astronauts away. Returns when they come back.
pub fn launch_expedition(
    player: &mut Player,
    crew: u32,
    tuning: &ExpeditionTuning,
    now: Millis,
) -> Result<Millis, ActionError> {
    let ends_at = now.saturating_add(tuning.duration_ms);
    player.start_expedition(crew, now, ends_at)?;
    info!(crew, ends_at, "expedition launched");
    Ok(ends_at)
}

fn pick_artifact<R: RollSource + ?Sized>(roll: &mut R, now: Millis) -> Artifact {
    let total: u32 = ARTIFACTS.iter().map(|(_, _, r)| rarity_weight(*r)).sum();
    let mut target = ((roll.roll() * f64::from(total)) as u32).min(total - 1);
    let mut chosen = ARTIFACTS[0];
    for entry in ARTIFACTS {
        let weight = rarity_weight(entry.2);
        if target < weight {
            chosen = *entry;
            break;
        }
        target -= weight;
    }
    Artifact {
        id: chosen.0.to_string(),
        name: chosen.1.to_string(),
        rarity: chosen.2,
        found_at: now,
    }
}

/// Bring the expedition home once it is due.
///
/// Returns `Ok(None)` when nothing is underway or it is still travelling.
/// One roll per crew member decides losses, then one roll decides whether
/// survivors found an artifact.
pub fn resolve_expedition<R>(
    player: &mut Player,
    tuning: &ExpeditionTuning,
    now: Millis,
    roll: &mut R,
) -> Result<Option<ExpeditionReport>, ActionError>
where
    R: RollSource + ?Sized,
{
    let sent = match player.expedition() {
        Some(e) if e.ends_at <= now => e.crew,
        _ => return Ok(None),
    };
    let lost = (0..sent).filter(|_| roll.roll() < tuning.loss_chance).count() as u32;
    let survivors = sent - lost;
    let artifact = (survivors > 0 && roll.roll() < tuning.artifact_chance)
        .then(|| pick_artifact(roll, now));

    player.finish_expedition(lost)?;
    let reward = saturating_mul(from_count(survivors), tuning.reward_per_survivor);
    if reward > Decimal::ZERO {
        player.earn(reward)?;
    }
    if let Some(found) = &artifact {
        player.add_artifact(found.clone());
    }
    info!(sent, lost, %reward, artifact = ?artifact.as_ref().map(|a| &a.id), "expedition returned");
    Ok(Some(ExpeditionReport {
        sent,
        lost,
        survivors,
        reward,
        artifact,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{CrewRole, Tuning};
    use sim_research::FixedRoll;

    fn crewed(astronauts: u32) -> Player {
        let mut p = Player::fresh("p", &Tuning::default());
        p.hire(CrewRole::Astronaut, astronauts);
        p
    }

    #[test]
    fn safe_trip_returns_veterans_and_coins() {
        let t = ExpeditionTuning::default();
        let mut p = crewed(2);
        let ends = launch_expedition(&mut p, 2, &t, 1_000).unwrap();
        assert_eq!(ends, 301_000);
        assert_eq!(p.free_crew(), 0);
        assert_eq!(resolve_expedition(&mut p, &t, 300_999, &mut FixedRoll(0.99)).unwrap(), None);

        let report = resolve_expedition(&mut p, &t, ends, &mut FixedRoll(0.99)).unwrap().unwrap();
        assert_eq!(report.lost, 0);
        assert_eq!(report.survivors, 2);
        assert_eq!(report.reward, Decimal::new(200, 0));
        assert_eq!(report.artifact, None);
        assert_eq!(p.veteran_count(), 2);
        assert_eq!(p.free_crew(), 2);
        assert_eq!(p.coins(), Decimal::new(200, 0));
        // resolved exactly once
        assert_eq!(resolve_expedition(&mut p, &t, ends, &mut FixedRoll(0.99)).unwrap(), None);
    }

    #[test]
    fn disaster_loses_everyone() {
        let t = ExpeditionTuning::default();
        let mut p = crewed(3);
        launch_expedition(&mut p, 2, &t, 0).unwrap();
        let report = resolve_expedition(&mut p, &t, t.duration_ms, &mut FixedRoll(0.0))
            .unwrap()
            .unwrap();
        assert_eq!(report.lost, 2);
        assert_eq!(report.reward, Decimal::ZERO);
        assert_eq!(report.artifact, None);
        assert_eq!(p.crew().get(CrewRole::Astronaut), 1);
        assert_eq!(p.veteran_count(), 0);
    }

    #[test]
    fn lucky_trip_finds_an_artifact() {
        let mut t = ExpeditionTuning::default();
        t.loss_chance = 0.0;
        let mut p = crewed(1);
        launch_expedition(&mut p, 1, &t, 0).unwrap();
        let report = resolve_expedition(&mut p, &t, t.duration_ms, &mut FixedRoll(0.0))
            .unwrap()
            .unwrap();
        let artifact = report.artifact.unwrap();
        assert_eq!(artifact.id, "meteor-fragment");
        assert_eq!(artifact.found_at, t.duration_ms);
        assert_eq!(p.artifacts().len(), 1);
    }

    #[test]
    fn launch_needs_free_astronauts() {
        let t = ExpeditionTuning::default();
        let mut p = crewed(1);
        assert!(matches!(
            launch_expedition(&mut p, 2, &t, 0),
            Err(ActionError::NoCrew { .. })
        ));
        launch_expedition(&mut p, 1, &t, 0).unwrap();
        p.hire(CrewRole::Astronaut, 1);
        assert!(matches!(launch_expedition(&mut p, 1, &t, 0), Err(ActionError::Busy(_))));
    }
}
