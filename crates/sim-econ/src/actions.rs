//! Player actions. Each one validates first and only then mutates, so an
//! `Err` leaves the player exactly as it was.

use crate::error::ActionError;
use catalog::Catalog;
use rust_decimal::Decimal;
use sim_core::number::{from_count, per_elapsed, percent, saturating_add, saturating_mul};
use sim_core::{naming, Amount, CrewRole, Millis, Planet, Player, Tuning, UpgradeId, Wallet};
use sim_research::ResearchState;
use tracing::{debug, info};

/// A successful upgrade purchase.
#[derive(Clone, Debug, PartialEq)]
pub struct Purchase {
    pub upgrade: UpgradeId,
    pub planet: usize,
    pub cost: Amount,
    /// When the installation finishes, `None` when it produces right away.
    pub ready_at: Option<Millis>,
    /// Crew moved onto equipment duty.
    pub crew_used: u32,
}

/// Timers that finished during one call to [`complete_timers`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimerReport {
    pub installed: Vec<(usize, UpgradeId)>,
    pub removed: Vec<(usize, UpgradeId)>,
    pub refunded: Amount,
}

impl TimerReport {
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty() && self.removed.is_empty()
    }
}

fn planet(player: &Player, index: usize) -> Result<&Planet, ActionError> {
    player.planet(index).ok_or(ActionError::UnknownPlanet(index))
}

fn ensure_free_slot(planet: &Planet) -> Result<(), ActionError> {
    if planet.free_slots() == 0 {
        return Err(ActionError::NoFreeSlot {
            planet: planet.id().to_string(),
            used: planet.used_slots(),
            max: planet.max_upgrades(),
        });
    }
    Ok(())
}

/// Buy one copy of `upgrade_id` for planet `planet_idx`.
///
/// Research can waive the slot or the crew requirement. Upgrades with an
/// install time hold their slot immediately but produce only once the timer
/// completes.
pub fn buy_upgrade(
    player: &mut Player,
    catalog: &Catalog,
    research: &ResearchState,
    planet_idx: usize,
    upgrade_id: &UpgradeId,
    now: Millis,
) -> Result<Purchase, ActionError> {
    let def = catalog
        .upgrade(upgrade_id)
        .ok_or_else(|| ActionError::UnknownUpgrade(upgrade_id.to_string()))?;
    let upgrade = def.instantiate(research.is_slot_free(upgrade_id))?;
    let target = planet(player, planet_idx)?;
    if upgrade.uses_slot() {
        ensure_free_slot(target)?;
    }
    let crew_used = if research.is_crew_free(upgrade_id) {
        0
    } else {
        def.crew_required
    };
    if crew_used > player.free_crew() {
        return Err(ActionError::NoCrew {
            needed: crew_used,
            free: player.free_crew(),
        });
    }

    let receipt = player.reserve(def.cost)?;
    if crew_used > 0 {
        if let Err(e) = player.assign_equipment_crew(crew_used) {
            player.cancel(receipt);
            return Err(e.into());
        }
    }
    let upgrade = upgrade.with_crew(crew_used);
    let ready_at = (def.install_ms > 0).then(|| now.saturating_add(def.install_ms));
    let placed = match ready_at {
        Some(ends_at) => player.begin_install(planet_idx, upgrade, now, ends_at),
        None => player.install_now(planet_idx, upgrade),
    };
    if let Err(e) = placed {
        if crew_used > 0 {
            // just assigned above, cannot fail
            let _ = player.release_equipment_crew(crew_used);
        }
        player.cancel(receipt);
        return Err(e.into());
    }
    player.commit(receipt);
    debug!(
        upgrade = %upgrade_id,
        planet = planet_idx,
        cost = %def.cost,
        ?ready_at,
        "upgrade bought"
    );
    Ok(Purchase {
        upgrade: upgrade_id.clone(),
        planet: planet_idx,
        cost: def.cost,
        ready_at,
        crew_used,
    })
}

/// Schedule removal of one owned copy. Dismantling takes as long as the
/// install did; the refund is paid when it completes.
pub fn start_uninstall(
    player: &mut Player,
    catalog: &Catalog,
    planet_idx: usize,
    upgrade_id: &UpgradeId,
    now: Millis,
) -> Result<Millis, ActionError> {
    let duration = catalog.upgrade(upgrade_id).map(|d| d.install_ms).unwrap_or(0);
    let ends_at = now.saturating_add(duration);
    player.begin_uninstall(planet_idx, upgrade_id, now, ends_at)?;
    debug!(upgrade = %upgrade_id, planet = planet_idx, ends_at, "uninstall started");
    Ok(ends_at)
}

/// Apply every install and uninstall due at `now`. Each timer completes once.
///
/// Removed upgrades refund `uninstall_refund_pct` of their cost and release
/// the crew recorded on them at purchase.
pub fn complete_timers(
    player: &mut Player,
    tuning: &Tuning,
    now: Millis,
) -> Result<TimerReport, ActionError> {
    let mut report = TimerReport::default();
    for (idx, done) in player.complete_timers(now) {
        report
            .installed
            .extend(done.installed.iter().map(|u| (idx, u.id().clone())));
        for upgrade in done.removed {
            let refund_pct = percent(tuning.economy.uninstall_refund_pct);
            let refund = saturating_mul(upgrade.cost(), refund_pct);
            report.refunded += refund;
            let crew = upgrade.crew_used().min(player.crew_assigned_to_equipment());
            if crew > 0 {
                player.release_equipment_crew(crew)?;
            }
            report.removed.push((idx, upgrade.id().clone()));
        }
    }
    if report.refunded > Decimal::ZERO {
        player.refund(report.refunded)?;
    }
    if !report.is_empty() {
        debug!(
            installed = report.installed.len(),
            removed = report.removed.len(),
            refunded = %report.refunded,
            "timers completed"
        );
    }
    Ok(report)
}

/// Price of the next housing module.
pub fn housing_cost(tuning: &Tuning) -> Amount {
    tuning.economy.housing_cost
}

/// Build one housing module. It takes a slot and raises crew capacity.
pub fn build_housing(
    player: &mut Player,
    tuning: &Tuning,
    planet_idx: usize,
) -> Result<Amount, ActionError> {
    ensure_free_slot(planet(player, planet_idx)?)?;
    let cost = housing_cost(tuning);
    let receipt = player.reserve(cost)?;
    if let Err(e) = player.add_housing(planet_idx) {
        player.cancel(receipt);
        return Err(e.into());
    }
    player.commit(receipt);
    Ok(cost)
}

/// Price of one more slot: `slot_expand_cost × current capacity`.
pub fn slot_expand_cost(
    player: &Player,
    tuning: &Tuning,
    planet_idx: usize,
) -> Result<Amount, ActionError> {
    let max = planet(player, planet_idx)?.max_upgrades();
    Ok(saturating_mul(tuning.economy.slot_expand_cost, from_count(max)))
}

/// Add one slot to a planet.
pub fn expand_slots(
    player: &mut Player,
    tuning: &Tuning,
    planet_idx: usize,
) -> Result<Amount, ActionError> {
    let cost = slot_expand_cost(player, tuning, planet_idx)?;
    player.spend(cost)?;
    player.expand_slots(planet_idx, 1)?;
    Ok(cost)
}

/// Price of the next hire: `hire_base_cost + roster × hire_cost_step`.
pub fn hire_cost(player: &Player, tuning: &Tuning) -> Amount {
    saturating_add(
        tuning.crew.hire_base_cost,
        saturating_mul(from_count(player.crew().total()), tuning.crew.hire_cost_step),
    )
}

/// Hire one crew member of `role`.
pub fn hire_crew(
    player: &mut Player,
    research: &ResearchState,
    tuning: &Tuning,
    role: CrewRole,
) -> Result<Amount, ActionError> {
    if !research.is_role_hireable(role) {
        return Err(ActionError::RoleLocked(role));
    }
    let capacity = player.crew_capacity(&tuning.crew);
    if player.crew().total() >= capacity {
        return Err(ActionError::CrewCapacity { capacity });
    }
    let cost = hire_cost(player, tuning);
    player.spend(cost)?;
    player.hire(role, 1);
    debug!(%role, %cost, total = player.crew().total(), "crew hired");
    Ok(cost)
}

pub fn assign_crew(player: &mut Player, planet_idx: usize, n: u32) -> Result<(), ActionError> {
    Ok(player.assign_crew(planet_idx, n)?)
}

pub fn unassign_crew(player: &mut Player, planet_idx: usize, n: u32) -> Result<(), ActionError> {
    Ok(player.unassign_crew(planet_idx, n)?)
}

/// Price of the next planet: `planet_base_cost × planets²`.
pub fn planet_cost(player: &Player, tuning: &Tuning) -> Amount {
    let n = from_count(player.planets().len() as u32);
    saturating_mul(tuning.economy.planet_base_cost, saturating_mul(n, n))
}

/// Colonize a new planet. Returns its index.
pub fn buy_planet(player: &mut Player, tuning: &Tuning) -> Result<usize, ActionError> {
    let cost = planet_cost(player, tuning);
    let index = player.planets().len();
    let id = naming::planet_id(index);
    let name = naming::planet_name(&id);
    let planet = Planet::new(id.clone(), name, tuning.economy.default_max_upgrades)
        .with_visual_seed(naming::visual_seed(&id));
    let receipt = player.reserve(cost)?;
    if let Err(e) = player.add_planet(planet) {
        player.cancel(receipt);
        return Err(e.into());
    }
    player.commit(receipt);
    info!(planet = %id, %cost, "planet colonized");
    Ok(index)
}

/// Coins for one click.
pub fn click_value(research: &ResearchState, tuning: &Tuning) -> Amount {
    saturating_mul(tuning.economy.click_base, research.click_multiplier())
}

pub fn click(
    player: &mut Player,
    research: &ResearchState,
    tuning: &Tuning,
) -> Result<Amount, ActionError> {
    let earned = click_value(research, tuning);
    player.earn(earned)?;
    Ok(earned)
}

/// Credit `rate` coins per second over `elapsed_ms`.
pub fn accrue(
    player: &mut Player,
    rate: Amount,
    elapsed_ms: Millis,
) -> Result<Amount, ActionError> {
    let earned = per_elapsed(rate.max(Decimal::ZERO), elapsed_ms);
    if earned > Decimal::ZERO {
        player.earn(earned)?;
    }
    Ok(earned)
}
