//! The versioned save document and its conversion to and from the session.

use crate::error::PersistError;
use crate::migration::{migrate, validate_effects, CURRENT_VERSION};
use serde::{Deserialize, Serialize};
use sim_core::{
    naming, Amount, Artifact, CrewRole, CrewRoster, EventEffect, Expedition, GameEvent,
    GameSession, Millis, PendingInstall, PendingUninstall, Planet, PlanetParts, Player,
    PlayerParts, RunStats, Tuning, Upgrade, UpgradeId,
};
use std::collections::BTreeMap;
use tracing::warn;

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDoc {
    pub coins_per_second: Amount,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeDoc {
    pub id: UpgradeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cost: Amount,
    pub effect: EffectDoc,
    #[serde(default = "yes")]
    pub uses_slot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Crew on equipment duty for this copy; absent in saves that predate it.
    #[serde(default)]
    pub crew_used: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallDoc {
    pub upgrade: UpgradeDoc,
    #[serde(default)]
    pub start_at: Millis,
    #[serde(default)]
    pub ends_at: Millis,
    /// Older saves omit it; the upgrade's own production is used then.
    #[serde(default)]
    pub rate_to_add: Option<Amount>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstallDoc {
    pub upgrade_id: UpgradeId,
    #[serde(default)]
    pub start_at: Millis,
    #[serde(default)]
    pub ends_at: Millis,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetDoc {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub max_upgrades: Option<u32>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeDoc>,
    #[serde(default)]
    pub housing: u32,
    #[serde(default)]
    pub assigned_crew: u32,
    #[serde(default)]
    pub visual_seed: Option<u64>,
    #[serde(default)]
    pub installing_upgrades: Vec<InstallDoc>,
    #[serde(default)]
    pub uninstalling_upgrades: Vec<UninstallDoc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerDoc {
    pub id: String,
    pub coins: Amount,
    pub total_coins_ever: Amount,
    pub production_rate: Amount,
    pub planets: Vec<PlanetDoc>,
    pub artifacts: Vec<Artifact>,
    pub prestige_level: u32,
    pub crew_by_role: BTreeMap<String, u32>,
    pub veteran_count: u32,
    pub crew_assigned_to_equipment: u32,
    pub prestige_planet_bonus: u32,
    pub prestige_research_bonus: u32,
    pub expedition: Option<Expedition>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDoc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub effect: EventEffect,
    /// Events saved without an end time are treated as already over.
    #[serde(default)]
    pub ends_at: Millis,
}

/// Everything needed to restore a [`GameSession`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub version: u32,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub player: PlayerDoc,
    #[serde(default)]
    pub active_events: Vec<EventDoc>,
    #[serde(default)]
    pub run_stats: RunStats,
    #[serde(default)]
    pub saved_at: Option<Millis>,
}

fn upgrade_doc(u: &Upgrade) -> UpgradeDoc {
    UpgradeDoc {
        id: u.id().clone(),
        name: u.name().to_string(),
        cost: u.cost(),
        effect: EffectDoc {
            coins_per_second: u.coins_per_second(),
        },
        uses_slot: u.uses_slot(),
        module: u.module().map(str::to_string),
        crew_used: u.crew_used(),
    }
}

fn planet_doc(p: &Planet) -> PlanetDoc {
    let parts = p.to_parts();
    PlanetDoc {
        id: parts.id,
        name: parts.name,
        max_upgrades: Some(parts.max_upgrades),
        upgrades: parts.upgrades.iter().map(upgrade_doc).collect(),
        housing: parts.housing,
        assigned_crew: parts.assigned_crew,
        visual_seed: parts.visual_seed,
        installing_upgrades: parts
            .installing
            .iter()
            .map(|i| InstallDoc {
                upgrade: upgrade_doc(&i.upgrade),
                start_at: i.start_at,
                ends_at: i.ends_at,
                rate_to_add: Some(i.rate_to_add),
            })
            .collect(),
        uninstalling_upgrades: parts
            .uninstalling
            .iter()
            .map(|u| UninstallDoc {
                upgrade_id: u.upgrade_id.clone(),
                start_at: u.start_at,
                ends_at: u.ends_at,
            })
            .collect(),
    }
}

/// Snapshot a session into the current document version.
pub fn serialize(session: &GameSession) -> SaveDocument {
    let parts = session.player.to_parts();
    let player = PlayerDoc {
        id: parts.id,
        coins: parts.coins,
        total_coins_ever: parts.total_coins_ever,
        production_rate: parts.production_rate,
        planets: session.player.planets().iter().map(planet_doc).collect(),
        artifacts: parts.artifacts,
        prestige_level: parts.prestige_level,
        crew_by_role: parts
            .crew
            .iter()
            .map(|(role, n)| (role.as_str().to_string(), n))
            .collect(),
        veteran_count: parts.veteran_count,
        crew_assigned_to_equipment: parts.crew_assigned_to_equipment,
        prestige_planet_bonus: parts.prestige_planet_bonus,
        prestige_research_bonus: parts.prestige_research_bonus,
        expedition: parts.expedition,
    };
    SaveDocument {
        version: CURRENT_VERSION,
        id: session.id.clone(),
        player,
        active_events: session
            .active_events
            .iter()
            .map(|e| EventDoc {
                id: e.id.clone(),
                name: e.name.clone(),
                effect: e.effect.clone(),
                ends_at: e.ends_at,
            })
            .collect(),
        run_stats: session.run_stats.clone(),
        saved_at: session.saved_at,
    }
}

/// Serialize straight to JSON text.
pub fn to_json(session: &GameSession) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&serialize(session))?)
}

fn restore_upgrade(doc: UpgradeDoc) -> Result<Upgrade, PersistError> {
    let name = if doc.name.is_empty() { doc.id.0.clone() } else { doc.name };
    let upgrade = Upgrade::new(doc.id, name, doc.cost, doc.effect.coins_per_second, doc.uses_slot)?;
    Ok(upgrade.with_module(doc.module).with_crew(doc.crew_used))
}

fn restore_planet(index: usize, doc: PlanetDoc, tuning: &Tuning) -> Result<Planet, PersistError> {
    let id = if doc.id.is_empty() { naming::planet_id(index) } else { doc.id };
    let name = if doc.name.is_empty() || doc.name.contains("undefined") {
        naming::planet_name(&id)
    } else {
        doc.name
    };
    let upgrades = doc
        .upgrades
        .into_iter()
        .map(restore_upgrade)
        .collect::<Result<Vec<_>, _>>()?;
    let mut installing = Vec::with_capacity(doc.installing_upgrades.len());
    for pending in doc.installing_upgrades {
        let upgrade = restore_upgrade(pending.upgrade)?;
        let rate_to_add = pending.rate_to_add.unwrap_or_else(|| upgrade.coins_per_second());
        installing.push(PendingInstall {
            upgrade,
            start_at: pending.start_at,
            ends_at: pending.ends_at,
            rate_to_add,
        });
    }
    let parts = PlanetParts {
        id,
        name,
        max_upgrades: doc.max_upgrades.unwrap_or(tuning.economy.default_max_upgrades),
        upgrades,
        housing: doc.housing,
        assigned_crew: doc.assigned_crew,
        visual_seed: doc.visual_seed,
        installing,
        uninstalling: doc
            .uninstalling_upgrades
            .into_iter()
            .map(|u| PendingUninstall {
                upgrade_id: u.upgrade_id,
                start_at: u.start_at,
                ends_at: u.ends_at,
            })
            .collect(),
    };
    Ok(Planet::from_parts(parts, tuning.crew.per_housing)?)
}

fn restore_crew(counts: BTreeMap<String, u32>) -> CrewRoster {
    let mut roster = CrewRoster::default();
    for (name, n) in counts {
        match name.parse::<CrewRole>() {
            Ok(role) => roster.add(role, n),
            Err(_) => warn!(role = %name, count = n, "dropping crew with unknown role"),
        }
    }
    roster
}

/// Rebuild the session from a current-version document.
pub fn restore(doc: SaveDocument, tuning: &Tuning) -> Result<GameSession, PersistError> {
    let session_id = if doc.id.is_empty() { "default".to_string() } else { doc.id };
    let p = doc.player;
    let mut planets = p
        .planets
        .into_iter()
        .enumerate()
        .map(|(i, planet)| restore_planet(i, planet, tuning))
        .collect::<Result<Vec<_>, _>>()?;
    if planets.is_empty() {
        let id = naming::planet_id(0);
        planets.push(
            Planet::new(id.clone(), naming::planet_name(&id), tuning.economy.default_max_upgrades)
                .with_visual_seed(naming::visual_seed(&id)),
        );
    }
    let parts = PlayerParts {
        id: if p.id.is_empty() { format!("{session_id}-player") } else { p.id },
        coins: p.coins,
        total_coins_ever: p.total_coins_ever.max(p.coins),
        production_rate: p.production_rate,
        planets,
        artifacts: p.artifacts,
        prestige_level: p.prestige_level,
        crew: restore_crew(p.crew_by_role),
        veteran_count: p.veteran_count,
        crew_assigned_to_equipment: p.crew_assigned_to_equipment,
        prestige_planet_bonus: p.prestige_planet_bonus,
        prestige_research_bonus: p.prestige_research_bonus,
        expedition: p.expedition,
    };
    let player = Player::from_parts(parts, tuning.crew.per_housing)?;
    Ok(GameSession {
        id: session_id,
        player,
        active_events: doc
            .active_events
            .into_iter()
            .map(|e| GameEvent {
                id: e.id,
                name: e.name,
                effect: e.effect,
                ends_at: e.ends_at,
            })
            .collect(),
        run_stats: doc.run_stats,
        saved_at: doc.saved_at,
    })
}

/// Parse, migrate, validate and restore a save with default tuning.
pub fn deserialize(json: &str) -> Result<GameSession, PersistError> {
    deserialize_with(json, &Tuning::default())
}

/// Parse, migrate, validate and restore a save.
pub fn deserialize_with(json: &str, tuning: &Tuning) -> Result<GameSession, PersistError> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    let current = migrate(raw)?;
    validate_effects(&current)?;
    let doc: SaveDocument = serde_json::from_value(current)?;
    restore(doc, tuning)
}
