use crate::config::Tuning;
use crate::number::{Amount, Millis};
use crate::player::Player;
use serde::{Deserialize, Serialize};

/// Rarity tier of an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

/// Collectible found on expeditions. Kept across prestige.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub found_at: Millis,
}

/// What an active event does while it lasts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEffect {
    pub multiplier: Amount,
    pub duration_ms: Millis,
}

/// A timed production event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub id: String,
    pub name: String,
    pub effect: EventEffect,
    pub ends_at: Millis,
}

impl GameEvent {
    /// Start an event now.
    pub fn starting(
        id: impl Into<String>,
        name: impl Into<String>,
        effect: EventEffect,
        now: Millis,
    ) -> Self {
        let ends_at = now.saturating_add(effect.duration_ms);
        Self {
            id: id.into(),
            name: name.into(),
            effect,
            ends_at,
        }
    }

    pub fn is_active(&self, now: Millis) -> bool {
        self.ends_at > now
    }
}

/// Counters for the current run. Reset with the session on prestige.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunStats {
    pub clicks: u64,
    pub upgrades_bought: u64,
    pub research_attempts: u64,
    pub research_successes: u64,
    pub expeditions: u64,
    pub started_at: Millis,
}

/// The session graph that gets saved and restored as a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    pub id: String,
    pub player: Player,
    pub active_events: Vec<GameEvent>,
    pub run_stats: RunStats,
    /// Last successful save, used for offline progress.
    pub saved_at: Option<Millis>,
}

impl GameSession {
    pub fn new(id: impl Into<String>, player: Player, now: Millis) -> Self {
        Self {
            id: id.into(),
            player,
            active_events: Vec::new(),
            run_stats: RunStats {
                started_at: now,
                ..RunStats::default()
            },
            saved_at: None,
        }
    }

    /// Session for a first launch.
    pub fn fresh(id: impl Into<String>, tuning: &Tuning, now: Millis) -> Self {
        let id = id.into();
        let player = Player::fresh(format!("{id}-player"), tuning);
        Self::new(id, player, now)
    }

    /// Drop events whose time is up and return them.
    pub fn expire_events(&mut self, now: Millis) -> Vec<GameEvent> {
        let (active, ended): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active_events)
            .into_iter()
            .partition(|e| e.is_active(now));
        self.active_events = active;
        ended
    }

    pub fn active_event_ids(&self) -> Vec<&str> {
        self.active_events.iter().map(|e| e.id.as_str()).collect()
    }
}
