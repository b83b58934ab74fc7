use catalog::Catalog;
use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use sim_core::{naming, CrewRole, EventEffect, GameEvent, Planet, Player, Tuning};
use sim_econ::production;

fn late_game_player(catalog: &Catalog, tuning: &Tuning) -> Player {
    let mut player = Player::fresh("bench", tuning);
    player.expand_slots(0, 7).unwrap();
    for i in 1..8 {
        let id = naming::planet_id(i);
        player
            .add_planet(Planet::new(id.clone(), naming::planet_name(&id), 12))
            .unwrap();
    }
    for planet in 0..8 {
        for id in ["drill", "solar-panel", "hydroponics", "ore-scanner", "drill", "solar-panel"] {
            let def = catalog.upgrade(&id.into()).unwrap();
            player.install_now(planet, def.instantiate(false).unwrap()).unwrap();
        }
    }
    player.hire(CrewRole::Miner, 6);
    player.hire(CrewRole::Astronaut, 4);
    player
}

fn bench_production(c: &mut Criterion) {
    let catalog = Catalog::builtin().unwrap();
    let tuning = Tuning::default();
    let player = late_game_player(&catalog, &tuning);
    let events: Vec<GameEvent> = (0..4)
        .map(|i| {
            GameEvent::starting(
                format!("e{i}"),
                "bench",
                EventEffect {
                    multiplier: Decimal::new(15, 1),
                    duration_ms: 60_000,
                },
                0,
            )
        })
        .collect();
    c.bench_function("effective_rate", |b| {
        b.iter(|| {
            let events = production::event_multiplier(&events, 1_000);
            let sets = production::set_bonus_multiplier(&player, &catalog);
            production::effective_rate(&player, events, Decimal::new(125, 2), sets, &tuning)
        })
    });
}

criterion_group!(benches, bench_production);
criterion_main!(benches);
