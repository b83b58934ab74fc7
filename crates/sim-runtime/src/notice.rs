//! Messages for the presentation layer.

use bevy_ecs::prelude::*;
use sim_core::{Amount, GameEvent, Millis, UpgradeId};
use sim_econ::{ExpeditionReport, OfflineReport};

/// Something the player should hear about. Queued by the engine, drained by
/// the host, never read back.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    UpgradeInstalled { planet: usize, upgrade: UpgradeId },
    UpgradeRemoved { planet: usize, upgrade: UpgradeId },
    Refunded(Amount),
    EventStarted(GameEvent),
    EventEnded { id: String },
    ChoiceOffered { id: String },
    ExpeditionReturned(ExpeditionReport),
    ResearchUnlocked { node: String },
    AchievementUnlocked { id: String },
    CodexEntry { upgrade: UpgradeId },
    OfflineProgress(OfflineReport),
    Prestiged { level: u32 },
    SaveFailed { at: Millis },
}

/// Pending notices, oldest first.
#[derive(Resource, Debug, Default)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        self.0.push(notice);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.0)
    }
}
