#![deny(warnings)]

//! Headless driver: loads a save slot, plays a simple scripted strategy for a
//! number of one-second ticks, saves and prints a summary.

use anyhow::{Context, Result};
use catalog::Catalog;
use persistence::FileStore;
use sim_core::{Amount, CrewRole, UpgradeId};
use sim_econ::actions;
use sim_runtime::{GameRuntime, Notice, RuntimeConfig};
use std::path::PathBuf;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

const TICK_MS: i64 = 1_000;

struct Args {
    ticks: u32,
    seed: Option<u64>,
    save_dir: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        ticks: 600,
        seed: None,
        save_dir: PathBuf::from("saves"),
        config: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--ticks" => {
                args.ticks = it
                    .next()
                    .context("--ticks needs a value")?
                    .parse()
                    .context("--ticks must be a number")?
            }
            "--seed" => {
                args.seed = Some(
                    it.next()
                        .context("--seed needs a value")?
                        .parse()
                        .context("--seed must be a number")?,
                )
            }
            "--save-dir" => args.save_dir = it.next().context("--save-dir needs a value")?.into(),
            "--config" => args.config = Some(it.next().context("--config needs a value")?.into()),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// Click, then spend: answer choices, buy the priciest affordable upgrade,
/// hire miners, and colonize when every slot is taken.
fn play_turn(rt: &mut GameRuntime, shop: &[(UpgradeId, Amount)]) {
    let _ = rt.click();
    if rt.pending_choice().is_some() {
        let _ = rt.choose(0);
    }

    let coins = rt.session().player.coins();
    let planets = rt.session().player.planets().len();
    for (id, cost) in shop.iter().filter(|(_, cost)| *cost <= coins) {
        let bought = (0..planets).any(|planet| rt.buy_upgrade(planet, id).is_ok());
        if bought {
            debug!(upgrade = %id, %cost, "autoplay bought");
            return;
        }
    }

    let player = &rt.session().player;
    let slots_left: u32 = player.planets().iter().map(|p| p.free_slots()).sum();
    if slots_left == 0 && player.coins() >= actions::planet_cost(player, rt.tuning()) {
        let _ = rt.buy_planet();
    } else if player.coins() >= actions::hire_cost(player, rt.tuning()) {
        let _ = rt.hire(CrewRole::Miner);
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args()?;
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    info!(
        ticks = args.ticks,
        seed = config.rng_seed,
        save_dir = %args.save_dir.display(),
        git_sha = env!("GIT_SHA"),
        "starting star-idle"
    );

    let catalog = Catalog::builtin()?;
    let mut shop: Vec<(UpgradeId, Amount)> =
        catalog.upgrades().map(|u| (u.id.clone(), u.cost)).collect();
    shop.sort_by(|a, b| b.1.cmp(&a.1));

    let store = FileStore::open(&args.save_dir)?;
    let start = chrono::Utc::now().timestamp_millis();
    let mut rt = GameRuntime::load(catalog, config, Box::new(store), start);

    let mut achievements = 0;
    for n in 1..=i64::from(args.ticks) {
        play_turn(&mut rt, &shop);
        rt.tick(start + n * TICK_MS);
        for notice in rt.drain_notices() {
            match notice {
                Notice::AchievementUnlocked { id } => {
                    achievements += 1;
                    info!(%id, "achievement unlocked");
                }
                Notice::OfflineProgress(report) => info!(earned = %report.earned, "welcome back"),
                Notice::SaveFailed { at } => warn!(at, "save failed"),
                other => debug!(?other, "notice"),
            }
        }
    }
    let saved = rt.save();

    let session = rt.session();
    let player = &session.player;
    let installed: usize = player.planets().iter().map(|p| p.upgrades().len()).sum();
    println!(
        "star-idle {} ({}) | slot: {} | saved: {}",
        env!("GIT_SHA"),
        env!("BUILD_DATE"),
        session.id,
        saved
    );
    println!(
        "KPI | ticks: {} | coins: {} | lifetime: {} | rate: {}/s | planets: {} | upgrades: {} \
         | crew: {} | research: {} | new achievements: {} | prestige: {}",
        args.ticks,
        player.coins().round_dp(2),
        player.total_coins_ever().round_dp(2),
        rt.rate().effective.round_dp(2),
        player.planets().len(),
        installed,
        player.crew().total(),
        rt.research().unlocked_count(),
        achievements,
        player.prestige_level()
    );
    Ok(())
}
