//! World resources shared by the tick systems and the command API.

use bevy_ecs::prelude::*;
use catalog::Catalog;
use persistence::{KeyValueStore, LoadedGame, SaveManager};
use sim_core::{GameSession, Millis, Tuning};
use sim_econ::ProgressBook;
use sim_research::{ResearchState, SeededRoll};
use tracing::warn;

/// The mutable game state of one save slot.
#[derive(Resource, Debug)]
pub struct Game {
    pub session: GameSession,
    pub research: ResearchState,
    pub progress: ProgressBook,
    /// Choice event waiting for the player. Not saved; an unanswered choice
    /// is gone after a restart.
    pub pending_choice: Option<String>,
}

impl From<LoadedGame> for Game {
    fn from(loaded: LoadedGame) -> Self {
        Self {
            session: loaded.session,
            research: loaded.research,
            progress: loaded.progress,
            pending_choice: None,
        }
    }
}

/// Static game data and balance.
#[derive(Resource, Debug)]
pub struct Rules {
    pub catalog: Catalog,
    pub tuning: Tuning,
}

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    /// Time of the tick being run, or of the last one.
    pub now: Millis,
    /// Production has been credited up to here.
    pub last_tick: Millis,
    pub next_event_roll: Millis,
}

impl Clock {
    pub fn starting_at(now: Millis, roll_interval_ms: Millis) -> Self {
        Self {
            now,
            last_tick: now,
            next_event_roll: now.saturating_add(roll_interval_ms.max(0)),
        }
    }
}

/// Random rolls for research, events and expeditions.
#[derive(Resource, Debug)]
pub struct Dice(pub SeededRoll);

/// Autosave policy and bookkeeping.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Autosave {
    pub interval_ms: Millis,
    pub last_saved_at: Millis,
    /// Something changed since the last successful save.
    pub dirty: bool,
}

impl Autosave {
    pub fn is_due(&self, now: Millis) -> bool {
        self.dirty
            && self.interval_ms > 0
            && now.saturating_sub(self.last_saved_at) >= self.interval_ms
    }
}

/// Boxed so any backend fits in the world.
pub type DynStore = Box<dyn KeyValueStore + Send + Sync>;

/// Where the slot is written.
#[derive(Resource)]
pub struct Saves(pub SaveManager<DynStore>);

impl Saves {
    /// Stamp the session and write every store. Failures are logged by the
    /// save manager and reported as `false`.
    pub fn write(&mut self, game: &mut Game, now: Millis) -> bool {
        let previous = game.session.saved_at.replace(now);
        let ok = self.0.save_all(&game.session, &game.research, &game.progress);
        if !ok {
            game.session.saved_at = previous;
            warn!(slot = self.0.slot(), "keeping previous save timestamp");
        }
        ok
    }
}
