//! Save slots: the session plus its auxiliary research and progress stores.

use crate::document::{deserialize_with, to_json};
use crate::error::PersistError;
use crate::store::KeyValueStore;
use catalog::Catalog;
use serde::de::DeserializeOwned;
use sim_core::{GameSession, Millis, Tuning};
use sim_econ::ProgressBook;
use sim_research::ResearchState;
use tracing::{info, warn};

/// Everything a save slot holds.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedGame {
    pub session: GameSession,
    pub research: ResearchState,
    pub progress: ProgressBook,
}

impl LoadedGame {
    /// A first launch.
    pub fn fresh(slot: &str, tuning: &Tuning, now: Millis) -> Self {
        Self {
            session: GameSession::fresh(slot, tuning, now),
            research: ResearchState::new(),
            progress: ProgressBook::new(),
        }
    }
}

/// Reads and writes one save slot through a [`KeyValueStore`].
pub struct SaveManager<S> {
    store: S,
    slot: String,
}

impl<S: KeyValueStore> SaveManager<S> {
    pub fn new(store: S, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn session_key(&self) -> String {
        format!("{}:session", self.slot)
    }

    pub fn research_key(&self) -> String {
        format!("{}:research", self.slot)
    }

    pub fn progress_key(&self) -> String {
        format!("{}:progress", self.slot)
    }

    /// Write all three documents. The session goes last, so a failure part
    /// way leaves the previous session in place. The research and progress
    /// documents only ever grow, and may then run ahead of it.
    pub fn try_save_all(
        &mut self,
        session: &GameSession,
        research: &ResearchState,
        progress: &ProgressBook,
    ) -> Result<(), PersistError> {
        let session_json = to_json(session)?;
        let research_json = serde_json::to_string(research)?;
        let progress_json = serde_json::to_string(progress)?;
        self.store.set(&self.research_key(), &research_json)?;
        self.store.set(&self.progress_key(), &progress_json)?;
        self.store.set(&self.session_key(), &session_json)?;
        Ok(())
    }

    /// Write all three documents. Failures are logged, never returned.
    pub fn save_all(
        &mut self,
        session: &GameSession,
        research: &ResearchState,
        progress: &ProgressBook,
    ) -> bool {
        match self.try_save_all(session, research, progress) {
            Ok(()) => true,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "save failed");
                false
            }
        }
    }

    fn load_aux<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.store.get(key) {
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(key, error = %e, "corrupt auxiliary save, starting it over");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key, error = %e, "auxiliary save unreadable, starting it over");
                T::default()
            }
        }
    }

    /// Load the slot. `Ok(None)` when nothing was saved yet.
    pub fn load(
        &self,
        catalog: &Catalog,
        tuning: &Tuning,
    ) -> Result<Option<LoadedGame>, PersistError> {
        let Some(text) = self.store.get(&self.session_key())? else {
            return Ok(None);
        };
        let session = deserialize_with(&text, tuning)?;
        let mut research: ResearchState = self.load_aux(&self.research_key());
        research.rebuild(catalog);
        let progress: ProgressBook = self.load_aux(&self.progress_key());
        Ok(Some(LoadedGame {
            session,
            research,
            progress,
        }))
    }

    /// Load the slot, or start fresh when it is empty or unreadable.
    pub fn load_or_fresh(&self, catalog: &Catalog, tuning: &Tuning, now: Millis) -> LoadedGame {
        match self.load(catalog, tuning) {
            Ok(Some(game)) => {
                info!(slot = %self.slot, "save loaded");
                game
            }
            Ok(None) => {
                info!(slot = %self.slot, "no save found, starting fresh");
                LoadedGame::fresh(&self.slot, tuning, now)
            }
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "cannot load save, starting fresh");
                LoadedGame::fresh(&self.slot, tuning, now)
            }
        }
    }

    /// Delete the slot. Failures are logged.
    pub fn clear(&mut self) -> bool {
        let keys = [self.session_key(), self.research_key(), self.progress_key()];
        let mut ok = true;
        for key in keys {
            if let Err(e) = self.store.remove(&key) {
                warn!(key = %key, error = %e, "failed to delete save entry");
                ok = false;
            }
        }
        ok
    }
}
