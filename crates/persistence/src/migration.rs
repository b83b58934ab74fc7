//! Upgrades old save documents to the current schema.
//!
//! Each step is a pure function from version `n` to `n + 1` over raw JSON,
//! applied in order until the document reaches [`CURRENT_VERSION`]. Saves
//! without a `version` field are version 1.

use crate::error::PersistError;
use serde_json::{Map, Value};
use tracing::debug;

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = 3;

/// Slot capacity given to the planet synthesized for pre-planet saves.
const LEGACY_MAX_UPGRADES: u64 = 5;

type Step = fn(Value) -> Result<Value, PersistError>;

/// `STEPS[i]` upgrades version `i + 1` to `i + 2`.
const STEPS: &[Step] = &[v1_to_v2, v2_to_v3];

/// Version of a raw document.
pub fn version_of(doc: &Value) -> u32 {
    doc.get("version")
        .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
        .map(|v| v.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}

/// Bring `doc` up to [`CURRENT_VERSION`].
pub fn migrate(mut doc: Value) -> Result<Value, PersistError> {
    let mut version = version_of(&doc).max(1);
    if version > CURRENT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }
    if !doc.is_object() {
        return Err(PersistError::Json("save document is not an object".to_string()));
    }
    while version < CURRENT_VERSION {
        let step = STEPS[(version - 1) as usize];
        doc = step(doc)?;
        version += 1;
        debug!(version, "save document migrated");
    }
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("version".into(), Value::from(CURRENT_VERSION));
    }
    Ok(doc)
}

fn player_mut(doc: &mut Value) -> Option<&mut Map<String, Value>> {
    doc.get_mut("player").and_then(Value::as_object_mut)
}

/// Move a flat `coinsPerSecond` into `effect`.
fn nest_effect(upgrade: &mut Value) {
    let Some(obj) = upgrade.as_object_mut() else {
        return;
    };
    if obj.contains_key("effect") {
        return;
    }
    if let Some(cps) = obj.remove("coinsPerSecond") {
        let mut effect = Map::new();
        effect.insert("coinsPerSecond".into(), cps);
        obj.insert("effect".into(), Value::Object(effect));
    }
}

fn each_upgrade(planet: &mut Value, f: fn(&mut Value)) {
    if let Some(list) = planet.get_mut("upgrades").and_then(Value::as_array_mut) {
        list.iter_mut().for_each(f);
    }
    if let Some(list) = planet.get_mut("installingUpgrades").and_then(Value::as_array_mut) {
        for pending in list {
            if let Some(u) = pending.get_mut("upgrade") {
                f(u);
            }
        }
    }
}

/// v1 kept upgrades in one flat list on the player and stored production
/// directly on each upgrade.
fn v1_to_v2(mut doc: Value) -> Result<Value, PersistError> {
    let Some(player) = player_mut(&mut doc) else {
        return Ok(doc);
    };
    if !player.contains_key("planets") {
        let upgrades = player.remove("upgrades").unwrap_or_else(|| Value::Array(Vec::new()));
        let count = upgrades.as_array().map(|a| a.len() as u64).unwrap_or(0);
        let mut planet = Map::new();
        planet.insert("id".into(), Value::from("planet-0"));
        planet.insert("maxUpgrades".into(), Value::from(count.max(LEGACY_MAX_UPGRADES)));
        planet.insert("upgrades".into(), upgrades);
        player.insert("planets".into(), Value::Array(vec![Value::Object(planet)]));
    }
    if let Some(planets) = player.get_mut("planets").and_then(Value::as_array_mut) {
        for planet in planets {
            each_upgrade(planet, nest_effect);
        }
    }
    Ok(doc)
}

/// Turn `"12"` into `12` for integer fields; leave anything else alone.
fn coerce_int(obj: &mut Map<String, Value>, key: &str) {
    let parsed = obj
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse::<u64>().ok());
    if let Some(n) = parsed {
        obj.insert(key.into(), Value::from(n));
    }
}

/// v2 counted only generic astronauts and sometimes wrote counters as strings.
fn v2_to_v3(mut doc: Value) -> Result<Value, PersistError> {
    let Some(player) = player_mut(&mut doc) else {
        return Ok(doc);
    };
    for key in [
        "prestigeLevel",
        "veteranCount",
        "crewAssignedToEquipment",
        "prestigePlanetBonus",
        "prestigeResearchBonus",
        "astronautCount",
    ] {
        coerce_int(player, key);
    }
    if let Some(count) = player.remove("astronautCount") {
        let crew = player
            .entry("crewByRole")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(crew) = crew.as_object_mut() {
            crew.entry("astronaut").or_insert(count);
        }
    }
    if let Some(planets) = player.get_mut("planets").and_then(Value::as_array_mut) {
        for planet in planets.iter_mut().filter_map(Value::as_object_mut) {
            for key in ["maxUpgrades", "housing", "assignedCrew"] {
                coerce_int(planet, key);
            }
        }
    }
    Ok(doc)
}

fn effect_error(upgrade: &Value, reason: &str) -> PersistError {
    let id = upgrade
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();
    PersistError::InvalidUpgradeEffect {
        upgrade: id,
        reason: reason.to_string(),
    }
}

fn check_effect(upgrade: &Value) -> Result<(), PersistError> {
    let effect = upgrade
        .get("effect")
        .ok_or_else(|| effect_error(upgrade, "missing effect"))?;
    let effect = effect
        .as_object()
        .ok_or_else(|| effect_error(upgrade, "effect is not an object"))?;
    let cps = effect
        .get("coinsPerSecond")
        .ok_or_else(|| effect_error(upgrade, "missing coinsPerSecond"))?;
    let value = match cps {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(()),
        Some(_) => Err(effect_error(upgrade, "coinsPerSecond must be a non-negative number")),
        None => Err(effect_error(upgrade, "coinsPerSecond is not a number")),
    }
}

/// Reject corrupt upgrade effects anywhere in a current-version document.
pub fn validate_effects(doc: &Value) -> Result<(), PersistError> {
    let planets = doc
        .get("player")
        .and_then(|p| p.get("planets"))
        .and_then(Value::as_array);
    for planet in planets.into_iter().flatten() {
        if let Some(list) = planet.get("upgrades").and_then(Value::as_array) {
            for upgrade in list {
                check_effect(upgrade)?;
            }
        }
        if let Some(list) = planet.get("installingUpgrades").and_then(Value::as_array) {
            for upgrade in list.iter().filter_map(|p| p.get("upgrade")) {
                check_effect(upgrade)?;
            }
        }
    }
    Ok(())
}
