use catalog::Catalog;
use persistence::{KeyValueStore, LoadedGame, MemoryStore, SaveManager};
use rust_decimal::Decimal;
use sim_core::{CrewRole, Tuning, Upgrade, UpgradeId};
use sim_runtime::{GameRuntime, Notice, RuntimeConfig, RuntimeError};

/// No random events unless a test asks for them.
fn quiet_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.tuning.events.chance = 0.0;
    config
}

fn with_coins(config: &RuntimeConfig, coins: i64) -> GameRuntime {
    let mut loaded = LoadedGame::fresh(&config.save_slot, &config.tuning, 0);
    loaded.session.player.earn(Decimal::new(coins, 0)).unwrap();
    GameRuntime::new(
        Catalog::builtin().unwrap(),
        config.clone(),
        loaded,
        Box::new(MemoryStore::new()),
        0,
    )
}

#[test]
fn clicks_buy_a_drill_that_then_produces() {
    let mut rt = GameRuntime::headless(Catalog::builtin().unwrap(), quiet_config(), 0);
    for _ in 0..45 {
        rt.click().unwrap();
    }
    assert_eq!(rt.session().player.coins(), Decimal::new(45, 0));
    assert_eq!(rt.session().run_stats.clicks, 45);

    let purchase = rt.buy_upgrade(0, &UpgradeId::from("drill")).unwrap();
    assert_eq!(purchase.ready_at, None);
    assert_eq!(rt.session().player.coins(), Decimal::ZERO);
    assert_eq!(rt.session().player.production_rate(), Decimal::new(8, 1));

    rt.tick(10_000);
    assert_eq!(rt.session().player.coins(), Decimal::new(8, 0));
    rt.tick(10_000);
    assert_eq!(rt.session().player.coins(), Decimal::new(8, 0));
    rt.tick(5_000);
    assert_eq!(rt.now(), 10_000);
    assert_eq!(rt.session().player.coins(), Decimal::new(8, 0));
}

#[test]
fn refused_commands_change_nothing() {
    let mut rt = with_coins(&quiet_config(), 10);
    let before = rt.session().clone();
    assert!(matches!(
        rt.buy_upgrade(0, &UpgradeId::from("drill")),
        Err(RuntimeError::Action(_))
    ));
    assert!(matches!(rt.attempt_research("no-such-node"), Err(RuntimeError::Research(_))));
    assert!(matches!(rt.choose(0), Err(RuntimeError::NoPendingChoice)));
    assert!(matches!(rt.prestige(), Err(RuntimeError::PrestigeLocked { .. })));
    assert_eq!(rt.session(), &before);
}

fn installs(notices: &[Notice]) -> usize {
    notices
        .iter()
        .filter(|n| matches!(n, Notice::UpgradeInstalled { .. }))
        .count()
}

#[test]
fn timed_installs_complete_exactly_once() {
    let mut rt = with_coins(&quiet_config(), 2_000);
    let purchase = rt.buy_upgrade(0, &UpgradeId::from("ore-scanner")).unwrap();
    assert_eq!(purchase.ready_at, Some(60_000));
    assert_eq!(rt.session().player.production_rate(), Decimal::ZERO);

    rt.tick(59_999);
    assert_eq!(installs(&rt.drain_notices()), 0);
    rt.tick(60_000);
    let notices = rt.drain_notices();
    assert!(notices.contains(&Notice::UpgradeInstalled {
        planet: 0,
        upgrade: UpgradeId::from("ore-scanner"),
    }));
    assert_eq!(installs(&notices), 1);
    assert_eq!(rt.session().player.production_rate(), Decimal::new(15, 0));
    rt.tick(60_000);
    assert_eq!(installs(&rt.drain_notices()), 0);
    assert_eq!(rt.session().player.planets()[0].upgrades().len(), 1);
}

#[test]
fn uninstall_refunds_half_when_done() {
    let mut rt = with_coins(&quiet_config(), 45);
    let drill = UpgradeId::from("drill");
    rt.buy_upgrade(0, &drill).unwrap();
    let ends_at = rt.uninstall(0, &drill).unwrap();
    assert_eq!(ends_at, 0);
    rt.tick(0);
    assert!(rt.session().player.planets()[0].upgrades().is_empty());
    assert_eq!(rt.session().player.coins(), Decimal::new(225, 1));
    assert_eq!(rt.session().player.production_rate(), Decimal::ZERO);
}

#[test]
fn prestige_resets_the_run_and_keeps_research() {
    let mut rt = with_coins(&quiet_config(), 1_010_000);
    rt.buy_planet().unwrap();
    assert_eq!(rt.session().player.planets().len(), 2);
    let level = rt.prestige().unwrap();
    assert_eq!(level, 1);
    let player = &rt.session().player;
    assert_eq!(player.planets().len(), 1);
    assert_eq!(player.coins(), Decimal::ZERO);
    assert_eq!(player.prestige_planet_bonus(), 1);
    assert!(player.planets()[0].upgrades().is_empty());
    assert!(rt.drain_notices().contains(&Notice::Prestiged { level: 1 }));

    rt.tick(1_000);
    assert!(rt.progress().has_achievement("reborn"));
}

#[test]
fn hiring_stops_at_capacity() {
    let mut rt = with_coins(&quiet_config(), 1_000);
    rt.hire(CrewRole::Miner).unwrap();
    rt.hire(CrewRole::Miner).unwrap();
    let coins = rt.session().player.coins();
    assert!(matches!(rt.hire(CrewRole::Miner), Err(RuntimeError::Action(_))));
    assert_eq!(rt.session().player.crew().total(), 2);
    assert_eq!(rt.session().player.coins(), coins);
    assert!(matches!(rt.hire(CrewRole::Scientist), Err(RuntimeError::Action(_))));
}

#[test]
fn research_attempts_are_paid_and_counted() {
    let mut rt = with_coins(&quiet_config(), 100);
    let outcome = rt.attempt_research("click-optimizers").unwrap();
    assert_eq!(rt.session().player.coins(), Decimal::new(20, 0));
    assert_eq!(rt.session().run_stats.research_attempts, 1);
    assert_eq!(rt.research().is_unlocked("click-optimizers"), outcome.success);
}

#[test]
fn expeditions_return_on_a_later_tick() {
    let mut rt = with_coins(&quiet_config(), 100);
    rt.hire(CrewRole::Astronaut).unwrap();
    let ends_at = rt.launch_expedition(1).unwrap();
    assert!(rt.session().player.expedition().is_some());
    rt.drain_notices();

    rt.tick(ends_at - 1);
    assert!(rt.session().player.expedition().is_some());
    rt.tick(ends_at);
    assert!(rt.session().player.expedition().is_none());
    let returned: Vec<_> = rt
        .drain_notices()
        .into_iter()
        .filter_map(|n| match n {
            Notice::ExpeditionReturned(report) => Some(report),
            _ => None,
        })
        .collect();
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].survivors + returned[0].lost, 1);
}

#[test]
fn certain_event_rolls_start_something() {
    let mut config = RuntimeConfig::default();
    config.tuning.events.chance = 1.0;
    config.tuning.events.roll_interval_ms = 1_000;
    let mut rt = GameRuntime::headless(Catalog::builtin().unwrap(), config, 0);
    rt.tick(999);
    assert!(rt.drain_notices().is_empty());
    rt.tick(1_000);
    let notices = rt.drain_notices();
    let started = notices.iter().filter(|n| matches!(n, Notice::EventStarted(_))).count();
    let offered = notices.iter().filter(|n| matches!(n, Notice::ChoiceOffered { .. })).count();
    assert_eq!(started + offered, 1);
    if offered == 1 {
        assert!(rt.pending_choice().is_some());
        rt.choose(0).unwrap();
        assert!(rt.pending_choice().is_none());
    } else {
        assert_eq!(rt.session().active_events.len(), 1);
    }
}

#[test]
fn same_seed_same_run() {
    let run = || {
        let mut config = RuntimeConfig::default();
        config.tuning.events.roll_interval_ms = 1_000;
        config.tuning.events.chance = 0.5;
        let mut rt = GameRuntime::headless(Catalog::builtin().unwrap(), config, 0);
        for t in 1..=30 {
            rt.tick(t * 1_000);
            if rt.pending_choice().is_some() {
                rt.choose(1).unwrap();
            }
        }
        rt.session().clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn autosave_writes_the_slot() {
    let mut config = quiet_config();
    config.autosave_interval_ms = 5_000;
    let mut rt = with_coins(&config, 45);
    rt.buy_upgrade(0, &UpgradeId::from("drill")).unwrap();
    assert!(!rt.is_dirty());

    rt.tick(1_000);
    assert!(rt.is_dirty());
    rt.tick(5_000);
    assert!(!rt.is_dirty());

    let catalog = Catalog::builtin().unwrap();
    let loaded = rt.saves().load(&catalog, &config.tuning).unwrap().unwrap();
    assert_eq!(loaded.session.saved_at, Some(5_000));
    assert_eq!(loaded.session.player.coins(), Decimal::new(4, 0));
    assert!(loaded.progress.codex().contains(&UpgradeId::from("drill")));
}

#[test]
fn loading_credits_offline_time() {
    let tuning = Tuning::default();
    let mut loaded = LoadedGame::fresh("main", &tuning, 0);
    let generator =
        Upgrade::new("generator", "Generator", Decimal::ONE, Decimal::TEN, true).unwrap();
    loaded.session.player.install_now(0, generator).unwrap();
    loaded.session.saved_at = Some(0);
    let mut saves = SaveManager::new(MemoryStore::new(), "main");
    saves
        .try_save_all(&loaded.session, &loaded.research, &loaded.progress)
        .unwrap();
    let store = saves.into_store();
    assert_eq!(store.len(), 3);

    let catalog = Catalog::builtin().unwrap();
    let mut rt = GameRuntime::load(catalog, quiet_config(), Box::new(store), 60_000);
    assert_eq!(rt.session().player.coins(), Decimal::new(300, 0));
    assert!(rt
        .drain_notices()
        .iter()
        .any(|n| matches!(n, Notice::OfflineProgress(r) if r.earned == Decimal::new(300, 0))));
    assert!(rt.saves().store().get("main:session").unwrap().is_some());
}

#[test]
fn empty_store_starts_fresh() {
    let rt = GameRuntime::load(
        Catalog::builtin().unwrap(),
        quiet_config(),
        Box::new(MemoryStore::new()),
        1_234,
    );
    assert_eq!(rt.session().player.coins(), Decimal::ZERO);
    assert_eq!(rt.session().run_stats.started_at, 1_234);
    assert_eq!(rt.session().player.planets().len(), 1);
}
