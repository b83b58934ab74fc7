use persistence::{deserialize, serialize, to_json, CURRENT_VERSION};
use proptest::prelude::*;
use rust_decimal::Decimal;
use sim_core::{
    Artifact, CrewRole, EventEffect, GameEvent, GameSession, Legacy, Player, Rarity, Tuning,
    Upgrade, UpgradeId,
};

/// Knobs for building a session with every persisted structure in use.
#[derive(Clone, Debug, Default)]
struct Shape {
    coins_cents: i64,
    installed: usize,
    uninstalling: usize,
    housing: u32,
    miners: u32,
    astronauts: u32,
    assigned: u32,
    equipment: u32,
    expedition: u32,
    artifacts: usize,
    prestige_level: u32,
    planet_bonus: u32,
    research_bonus: u32,
    events: usize,
}

const EVENT_IDS: [&str; 3] = ["solar-flare", "meteor-shower", "gold-rush"];

fn build(shape: &Shape) -> GameSession {
    let tuning = Tuning::default();
    let rarities = [Rarity::Common, Rarity::Rare, Rarity::Legendary];
    let legacy = Legacy {
        prestige_level: shape.prestige_level,
        artifacts: (0..shape.artifacts)
            .map(|i| Artifact {
                id: format!("artifact-{i}"),
                name: format!("Relic {i}"),
                rarity: rarities[i % 3],
                found_at: 500 + i as i64,
            })
            .collect(),
        prestige_planet_bonus: shape.planet_bonus,
        prestige_research_bonus: shape.research_bonus,
        ..Legacy::default()
    };
    let player = Player::fresh_with("slot-player", &tuning, legacy);
    let mut session = GameSession::new("slot", player, 1_000);
    let player = &mut session.player;
    player.earn(Decimal::new(shape.coins_cents, 2)).unwrap();

    player.hire(CrewRole::Miner, shape.miners);
    player.hire(CrewRole::Astronaut, shape.astronauts);
    let equipment = shape.equipment.min(player.free_crew());
    player.assign_equipment_crew(equipment).unwrap();
    for i in 0..shape.installed {
        let crew = if i == 0 { equipment } else { 0 };
        let upgrade = Upgrade::new(
            format!("u{i}"),
            format!("Upgrade {i}"),
            Decimal::new(10, 0),
            Decimal::new(i as i64 + 1, 1),
            true,
        )
        .unwrap()
        .with_crew(crew);
        player.install_now(0, upgrade).unwrap();
    }
    for i in 0..shape.uninstalling.min(shape.installed) {
        let id = UpgradeId::from(format!("u{i}"));
        player.begin_uninstall(0, &id, 2_000, 32_000).unwrap();
    }
    for _ in 0..shape.housing {
        player.add_housing(0).unwrap();
    }
    let room = (shape.housing * tuning.crew.per_housing).min(player.free_crew());
    let assigned = shape.assigned.min(room);
    player.assign_crew(0, assigned).unwrap();
    let away = shape.expedition.min(player.free_astronauts());
    if away > 0 {
        player.start_expedition(away, 1_000, 121_000).unwrap();
    }

    for (n, id) in EVENT_IDS.iter().take(shape.events).enumerate() {
        let effect = EventEffect {
            multiplier: Decimal::TWO,
            duration_ms: 60_000,
        };
        session
            .active_events
            .push(GameEvent::starting(*id, format!("Event {n}"), effect, 1_000));
    }
    session.saved_at = Some(5_000);
    session
}

#[test]
fn documents_carry_the_current_version() {
    let session = build(&Shape::default());
    assert_eq!(serialize(&session).version, CURRENT_VERSION);
    let json: serde_json::Value = serde_json::from_str(&to_json(&session).unwrap()).unwrap();
    assert_eq!(json["version"], CURRENT_VERSION);
    assert!(json["player"]["planets"].is_array());
}

#[test]
fn pending_work_survives_a_reload() {
    let tuning = Tuning::default();
    let mut session = GameSession::fresh("slot", &tuning, 0);
    let upgrade =
        Upgrade::new("drill", "Drill", Decimal::new(10, 0), Decimal::new(8, 1), true).unwrap();
    session.player.begin_install(0, upgrade, 0, 30_000).unwrap();
    let restored = deserialize(&to_json(&session).unwrap()).unwrap();
    assert_eq!(restored, session);
    assert_eq!(restored.player.planets()[0].installing().len(), 1);
    assert_eq!(restored.player.planets()[0].installing()[0].ends_at, 30_000);
}

#[test]
fn crew_on_equipment_is_kept_per_upgrade() {
    let shape = Shape {
        installed: 2,
        miners: 2,
        equipment: 1,
        ..Shape::default()
    };
    let session = build(&shape);
    let restored = deserialize(&to_json(&session).unwrap()).unwrap();
    let upgrades = restored.player.planets()[0].upgrades();
    assert_eq!(upgrades[0].crew_used(), 1);
    assert_eq!(upgrades[1].crew_used(), 0);
    assert_eq!(restored.player.crew_assigned_to_equipment(), 1);
}

fn shapes() -> impl Strategy<Value = Shape> {
    (
        (0i64..100_000_000, 0usize..=3, 0usize..=3, 0u32..=2),
        (0u32..4, 0u32..4, 0u32..10, 0u32..3, 0u32..4),
        (0usize..4, 0u32..5, 0u32..5, 0u32..5, 0usize..=3),
    )
        .prop_map(|(slots, crew, legacy)| Shape {
            coins_cents: slots.0,
            installed: slots.1,
            uninstalling: slots.2,
            housing: slots.3,
            miners: crew.0,
            astronauts: crew.1,
            assigned: crew.2,
            equipment: crew.3,
            expedition: crew.4,
            artifacts: legacy.0,
            prestige_level: legacy.1,
            planet_bonus: legacy.2,
            research_bonus: legacy.3,
            events: legacy.4,
        })
}

proptest! {
    #[test]
    fn sessions_survive_a_reload(shape in shapes()) {
        let session = build(&shape);
        let restored = deserialize(&to_json(&session).unwrap()).unwrap();
        let (before, after) = (&session.player, &restored.player);
        prop_assert_eq!(after.coins(), before.coins());
        prop_assert_eq!(after.production_rate(), before.production_rate());
        prop_assert_eq!(after.planets()[0].used_slots(), before.planets()[0].used_slots());
        prop_assert_eq!(after.planets()[0].housing(), before.planets()[0].housing());
        prop_assert_eq!(after.planets()[0].assigned_crew(), before.planets()[0].assigned_crew());
        prop_assert_eq!(after.planets()[0].uninstalling(), before.planets()[0].uninstalling());
        prop_assert_eq!(after.expedition(), before.expedition());
        prop_assert_eq!(after.artifacts(), before.artifacts());
        prop_assert_eq!(after.prestige_planet_bonus(), before.prestige_planet_bonus());
        prop_assert_eq!(after.prestige_research_bonus(), before.prestige_research_bonus());
        prop_assert_eq!(after.free_crew(), before.free_crew());
        prop_assert_eq!(restored.active_event_ids(), session.active_event_ids());
        prop_assert_eq!(&restored, &session);
    }
}
