//! The session host: owns the world, runs ticks and executes commands.

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::notice::{Notice, Notices};
use crate::resources::{Autosave, Clock, Dice, DynStore, Game, Rules, Saves};
use crate::systems::tick_schedule;
use bevy_ecs::prelude::*;
use catalog::Catalog;
use persistence::{LoadedGame, MemoryStore, SaveManager};
use rust_decimal::Decimal;
use sim_core::{Amount, CrewRole, GameSession, Millis, Tuning, UpgradeId};
use sim_econ::{actions, events, expedition, offline, prestige, production};
use sim_econ::{ChoiceOutcome, ProgressBook, Purchase, RateBreakdown};
use sim_research::{AttemptOutcome, ResearchState, SeededRoll};
use tracing::{debug, info, warn};

/// One running save slot.
///
/// Every command takes `&mut self`, so a session has a single writer. A
/// command that returns an error leaves the state untouched; a successful
/// one is saved right away.
pub struct GameRuntime {
    world: World,
    schedule: Schedule,
}

impl GameRuntime {
    /// Host an already loaded slot, writing saves to `store`.
    pub fn new(
        catalog: Catalog,
        config: RuntimeConfig,
        loaded: LoadedGame,
        store: DynStore,
        now: Millis,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(Clock::starting_at(now, config.tuning.events.roll_interval_ms));
        world.insert_resource(Dice(SeededRoll::new(config.rng_seed)));
        world.insert_resource(Autosave {
            interval_ms: config.autosave_interval_ms,
            last_saved_at: now,
            dirty: false,
        });
        world.insert_resource(Saves(SaveManager::new(store, config.save_slot)));
        world.insert_resource(Game::from(loaded));
        world.insert_resource(Rules {
            catalog,
            tuning: config.tuning,
        });
        world.insert_resource(Notices::default());
        Self {
            world,
            schedule: tick_schedule(),
        }
    }

    /// Load the configured slot from `store`, or start fresh when there is
    /// nothing usable, then credit the time spent offline.
    pub fn load(catalog: Catalog, config: RuntimeConfig, store: DynStore, now: Millis) -> Self {
        let saves = SaveManager::new(store, config.save_slot.clone());
        let loaded = saves.load_or_fresh(&catalog, &config.tuning, now);
        let saved_at = loaded.session.saved_at;
        let mut runtime = Self::new(catalog, config, loaded, saves.into_store(), now);
        runtime.tick(now);
        if let Some(saved_at) = saved_at {
            runtime.credit_offline(saved_at);
        }
        runtime
    }

    /// A fresh session kept in memory only.
    pub fn headless(catalog: Catalog, config: RuntimeConfig, now: Millis) -> Self {
        let loaded = LoadedGame::fresh(&config.save_slot, &config.tuning, now);
        Self::new(catalog, config, loaded, Box::new(MemoryStore::new()), now)
    }

    fn credit_offline(&mut self, saved_at: Millis) {
        let now = self.now();
        let report = self.world.resource_scope(|world, mut game: Mut<Game>| {
            let rules = world.resource::<Rules>();
            let game = &mut *game;
            let rate = production::session_breakdown(
                &game.session,
                &game.research,
                &rules.catalog,
                &rules.tuning,
                now,
            )
            .effective;
            offline::apply_offline(
                &mut game.session.player,
                rate,
                saved_at,
                now,
                &rules.tuning.offline,
            )
        });
        match report {
            Ok(report) if report.earned > Decimal::ZERO => {
                self.notify(Notice::OfflineProgress(report));
                self.save();
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "offline progress not credited"),
        }
    }

    /// Advance the simulation to `now`. Time never runs backwards: an older
    /// `now` is treated as no time passing.
    pub fn tick(&mut self, now: Millis) {
        let mut clock = self.world.resource_mut::<Clock>();
        clock.now = now.max(clock.last_tick);
        self.schedule.run(&mut self.world);
    }

    pub fn now(&self) -> Millis {
        self.world.resource::<Clock>().now
    }

    fn game(&self) -> &Game {
        self.world.resource::<Game>()
    }

    pub fn session(&self) -> &GameSession {
        &self.game().session
    }

    pub fn research(&self) -> &ResearchState {
        &self.game().research
    }

    pub fn progress(&self) -> &ProgressBook {
        &self.game().progress
    }

    /// Choice event waiting for [`GameRuntime::choose`].
    pub fn pending_choice(&self) -> Option<&str> {
        self.game().pending_choice.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.world.resource::<Rules>().catalog
    }

    pub fn tuning(&self) -> &Tuning {
        &self.world.resource::<Rules>().tuning
    }

    pub fn saves(&self) -> &SaveManager<DynStore> {
        &self.world.resource::<Saves>().0
    }

    /// Unsaved changes exist.
    pub fn is_dirty(&self) -> bool {
        self.world.resource::<Autosave>().dirty
    }

    /// Current production with every factor.
    pub fn rate(&self) -> RateBreakdown {
        let rules = self.world.resource::<Rules>();
        let game = self.game();
        production::session_breakdown(
            &game.session,
            &game.research,
            &rules.catalog,
            &rules.tuning,
            self.now(),
        )
    }

    /// Take every queued notice.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.world.resource_mut::<Notices>().drain()
    }

    fn notify(&mut self, notice: Notice) {
        self.world.resource_mut::<Notices>().push(notice);
    }

    /// Write the slot now. Failures are logged and queued as a notice.
    pub fn save(&mut self) -> bool {
        let now = self.now();
        let ok = self.world.resource_scope(|world, mut saves: Mut<Saves>| {
            let mut game = world.resource_mut::<Game>();
            saves.write(&mut *game, now)
        });
        let mut autosave = self.world.resource_mut::<Autosave>();
        if ok {
            autosave.last_saved_at = now;
            autosave.dirty = false;
        } else {
            autosave.dirty = true;
            self.notify(Notice::SaveFailed { at: now });
        }
        ok
    }

    /// Run a command against the game state; save when it succeeds.
    fn command<T>(
        &mut self,
        f: impl FnOnce(&mut Game, &Rules, &mut Dice, Millis) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let now = self.now();
        let result = self.world.resource_scope(|world, mut dice: Mut<Dice>| {
            world.resource_scope(|world, mut game: Mut<Game>| {
                let rules = world.resource::<Rules>();
                f(&mut *game, rules, &mut *dice, now)
            })
        });
        if result.is_ok() {
            self.world.resource_mut::<Autosave>().dirty = true;
            self.save();
        }
        result
    }

    pub fn click(&mut self) -> Result<Amount, RuntimeError> {
        self.command(|game, rules, _, _| {
            let earned = actions::click(&mut game.session.player, &game.research, &rules.tuning)?;
            game.session.run_stats.clicks += 1;
            Ok(earned)
        })
    }

    pub fn buy_upgrade(
        &mut self,
        planet: usize,
        upgrade: &UpgradeId,
    ) -> Result<Purchase, RuntimeError> {
        let (purchase, first_sighting) = self.command(|game, rules, _, now| {
            let purchase = actions::buy_upgrade(
                &mut game.session.player,
                &rules.catalog,
                &game.research,
                planet,
                upgrade,
                now,
            )?;
            game.session.run_stats.upgrades_bought += 1;
            let first = game.progress.record_sighting(upgrade);
            Ok((purchase, first))
        })?;
        if first_sighting {
            self.notify(Notice::CodexEntry {
                upgrade: upgrade.clone(),
            });
        }
        Ok(purchase)
    }

    /// Start removing one copy. Returns when the removal completes.
    pub fn uninstall(
        &mut self,
        planet: usize,
        upgrade: &UpgradeId,
    ) -> Result<Millis, RuntimeError> {
        self.command(|game, rules, _, now| {
            Ok(actions::start_uninstall(
                &mut game.session.player,
                &rules.catalog,
                planet,
                upgrade,
                now,
            )?)
        })
    }

    pub fn build_housing(&mut self, planet: usize) -> Result<Amount, RuntimeError> {
        self.command(|game, rules, _, _| {
            Ok(actions::build_housing(&mut game.session.player, &rules.tuning, planet)?)
        })
    }

    pub fn expand_slots(&mut self, planet: usize) -> Result<Amount, RuntimeError> {
        self.command(|game, rules, _, _| {
            Ok(actions::expand_slots(&mut game.session.player, &rules.tuning, planet)?)
        })
    }

    pub fn hire(&mut self, role: CrewRole) -> Result<Amount, RuntimeError> {
        self.command(|game, rules, _, _| {
            Ok(actions::hire_crew(&mut game.session.player, &game.research, &rules.tuning, role)?)
        })
    }

    pub fn assign_crew(&mut self, planet: usize, n: u32) -> Result<(), RuntimeError> {
        self.command(|game, _, _, _| Ok(actions::assign_crew(&mut game.session.player, planet, n)?))
    }

    pub fn unassign_crew(&mut self, planet: usize, n: u32) -> Result<(), RuntimeError> {
        self.command(|game, _, _, _| {
            Ok(actions::unassign_crew(&mut game.session.player, planet, n)?)
        })
    }

    /// Colonize the next planet. Returns its index.
    pub fn buy_planet(&mut self) -> Result<usize, RuntimeError> {
        self.command(|game, rules, _, _| {
            Ok(actions::buy_planet(&mut game.session.player, &rules.tuning)?)
        })
    }

    pub fn attempt_research(&mut self, node: &str) -> Result<AttemptOutcome, RuntimeError> {
        let outcome = self.command(|game, rules, dice, _| {
            let scientists = game.session.player.crew().get(CrewRole::Scientist);
            let outcome = game.research.attempt(
                &rules.catalog,
                node,
                &mut game.session.player,
                scientists,
                &rules.tuning.research,
                &mut dice.0,
            )?;
            game.session.run_stats.research_attempts += 1;
            if outcome.success {
                game.session.run_stats.research_successes += 1;
            }
            Ok(outcome)
        })?;
        if outcome.success {
            self.notify(Notice::ResearchUnlocked {
                node: outcome.node.clone(),
            });
        }
        Ok(outcome)
    }

    /// Reset the run for a permanent bonus. Returns the new prestige level.
    ///
    /// Research and the progress book carry over; events, run counters and
    /// any unanswered choice do not.
    pub fn prestige(&mut self) -> Result<u32, RuntimeError> {
        let level = self.command(|game, rules, _, now| {
            let player = &game.session.player;
            if !prestige::can_prestige(player, &rules.tuning) {
                return Err(RuntimeError::PrestigeLocked {
                    needed: rules.tuning.economy.prestige_coin_threshold,
                    available: player.coins(),
                });
            }
            let next = prestige::create_after_prestige_banking(
                player,
                &rules.tuning,
                game.research.unlocked_count(),
            );
            let level = next.prestige_level();
            game.session = GameSession::new(game.session.id.clone(), next, now);
            game.pending_choice = None;
            Ok(level)
        })?;
        info!(level, "new run started");
        self.notify(Notice::Prestiged { level });
        Ok(level)
    }

    /// Send `crew` free astronauts away. Returns when they come back.
    pub fn launch_expedition(&mut self, crew: u32) -> Result<Millis, RuntimeError> {
        self.command(|game, rules, _, now| {
            let ends_at = expedition::launch_expedition(
                &mut game.session.player,
                crew,
                &rules.tuning.expedition,
                now,
            )?;
            game.session.run_stats.expeditions += 1;
            Ok(ends_at)
        })
    }

    /// Answer the pending choice event.
    pub fn choose(&mut self, index: usize) -> Result<ChoiceOutcome, RuntimeError> {
        let outcome = self.command(|game, rules, _, now| {
            let id = game.pending_choice.clone().ok_or(RuntimeError::NoPendingChoice)?;
            let rate = production::session_breakdown(
                &game.session,
                &game.research,
                &rules.catalog,
                &rules.tuning,
                now,
            )
            .effective;
            let outcome =
                events::resolve_choice(&mut game.session, &rules.catalog, &id, index, rate, now)?;
            game.pending_choice = None;
            debug!(event = %id, index, "choice answered");
            Ok(outcome)
        })?;
        if let ChoiceOutcome::Event(event) = &outcome {
            self.notify(Notice::EventStarted(event.clone()));
        }
        Ok(outcome)
    }
}
