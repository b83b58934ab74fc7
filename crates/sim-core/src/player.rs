use crate::config::{CrewTuning, Tuning};
use crate::crew::{CrewRole, CrewRoster};
use crate::error::CoreError;
use crate::naming;
use crate::number::{saturating_add, Amount, Millis};
use crate::planet::{Completed, Planet};
use crate::session::Artifact;
use crate::upgrade::{Upgrade, UpgradeId};
use crate::wallet::{Denied, Receipt, Wallet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Crew away from the colony. They stay on the roster but cannot be assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expedition {
    pub crew: u32,
    pub start_at: Millis,
    pub ends_at: Millis,
}

/// What a player keeps when a run is reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Legacy {
    pub prestige_level: u32,
    pub total_coins_ever: Amount,
    pub artifacts: Vec<Artifact>,
    pub prestige_planet_bonus: u32,
    pub prestige_research_bonus: u32,
}

/// Plain field bag used to restore or persist a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerParts {
    pub id: String,
    pub coins: Amount,
    pub total_coins_ever: Amount,
    pub production_rate: Amount,
    pub planets: Vec<Planet>,
    pub artifacts: Vec<Artifact>,
    pub prestige_level: u32,
    pub crew: CrewRoster,
    pub veteran_count: u32,
    pub crew_assigned_to_equipment: u32,
    pub prestige_planet_bonus: u32,
    pub prestige_research_bonus: u32,
    pub expedition: Option<Expedition>,
}

/// Aggregate root of a run.
///
/// `production_rate` is the base rate maintained incrementally as installs
/// complete; the production calculator stacks every bonus on top of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    id: String,
    coins: Amount,
    held: Amount,
    total_coins_ever: Amount,
    production_rate: Amount,
    planets: Vec<Planet>,
    artifacts: Vec<Artifact>,
    prestige_level: u32,
    crew: CrewRoster,
    veteran_count: u32,
    crew_assigned_to_equipment: u32,
    prestige_planet_bonus: u32,
    prestige_research_bonus: u32,
    expedition: Option<Expedition>,
    per_housing: u32,
}

impl Player {
    /// A brand-new player with an empty home planet.
    pub fn fresh(id: impl Into<String>, tuning: &Tuning) -> Self {
        Self::fresh_with(id, tuning, Legacy::default())
    }

    /// A fresh run that inherits `legacy`.
    pub fn fresh_with(id: impl Into<String>, tuning: &Tuning, legacy: Legacy) -> Self {
        let home_id = naming::planet_id(0);
        let home = Planet::new(
            home_id.clone(),
            naming::planet_name(&home_id),
            tuning.economy.default_max_upgrades,
        )
        .with_visual_seed(naming::visual_seed(&home_id));
        Self {
            id: id.into(),
            coins: Decimal::ZERO,
            held: Decimal::ZERO,
            total_coins_ever: legacy.total_coins_ever,
            production_rate: Decimal::ZERO,
            planets: vec![home],
            artifacts: legacy.artifacts,
            prestige_level: legacy.prestige_level,
            crew: CrewRoster::default(),
            veteran_count: 0,
            crew_assigned_to_equipment: 0,
            prestige_planet_bonus: legacy.prestige_planet_bonus,
            prestige_research_bonus: legacy.prestige_research_bonus,
            expedition: None,
            per_housing: tuning.crew.per_housing,
        }
    }

    /// Rebuild a player, failing fast on any invariant violation.
    pub fn from_parts(parts: PlayerParts, per_housing: u32) -> Result<Self, CoreError> {
        if parts.planets.is_empty() {
            return Err(CoreError::NoPlanets);
        }
        for amount in [parts.coins, parts.total_coins_ever, parts.production_rate] {
            if amount < Decimal::ZERO {
                return Err(CoreError::NegativeAmount(amount));
            }
        }
        let player = Self {
            id: parts.id,
            coins: parts.coins,
            held: Decimal::ZERO,
            total_coins_ever: parts.total_coins_ever,
            production_rate: parts.production_rate,
            planets: parts.planets,
            artifacts: parts.artifacts,
            prestige_level: parts.prestige_level,
            crew: parts.crew,
            veteran_count: parts.veteran_count,
            crew_assigned_to_equipment: parts.crew_assigned_to_equipment,
            prestige_planet_bonus: parts.prestige_planet_bonus,
            prestige_research_bonus: parts.prestige_research_bonus,
            expedition: parts.expedition,
            per_housing,
        };
        for planet in &player.planets {
            let capacity = planet.crew_capacity(per_housing);
            if planet.assigned_crew() > capacity {
                return Err(CoreError::CrewOverCapacity {
                    planet: planet.id().to_string(),
                    assigned: planet.assigned_crew(),
                    capacity,
                });
            }
        }
        let committed = player
            .planet_assigned_crew()
            .saturating_add(player.crew_assigned_to_equipment)
            .saturating_add(player.crew_away());
        if committed > player.crew.total() {
            return Err(CoreError::NotEnoughCrew {
                needed: committed,
                free: player.crew.total(),
            });
        }
        if player.crew_away() > player.crew.get(CrewRole::Astronaut) {
            return Err(CoreError::NotEnoughCrew {
                needed: player.crew_away(),
                free: player.crew.get(CrewRole::Astronaut),
            });
        }
        Ok(player)
    }

    /// Snapshot of all persisted fields. Open reservations are folded back
    /// into `coins`.
    pub fn to_parts(&self) -> PlayerParts {
        PlayerParts {
            id: self.id.clone(),
            coins: self.coins + self.held,
            total_coins_ever: self.total_coins_ever,
            production_rate: self.production_rate,
            planets: self.planets.clone(),
            artifacts: self.artifacts.clone(),
            prestige_level: self.prestige_level,
            crew: self.crew.clone(),
            veteran_count: self.veteran_count,
            crew_assigned_to_equipment: self.crew_assigned_to_equipment,
            prestige_planet_bonus: self.prestige_planet_bonus,
            prestige_research_bonus: self.prestige_research_bonus,
            expedition: self.expedition.clone(),
        }
    }

    /// The fields that survive a reset.
    pub fn legacy(&self) -> Legacy {
        Legacy {
            prestige_level: self.prestige_level,
            total_coins_ever: self.total_coins_ever,
            artifacts: self.artifacts.clone(),
            prestige_planet_bonus: self.prestige_planet_bonus,
            prestige_research_bonus: self.prestige_research_bonus,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coins(&self) -> Amount {
        self.coins
    }

    pub fn total_coins_ever(&self) -> Amount {
        self.total_coins_ever
    }

    /// Base production from installed upgrades, before any bonus.
    pub fn production_rate(&self) -> Amount {
        self.production_rate
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn planet(&self, index: usize) -> Option<&Planet> {
        self.planets.get(index)
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn prestige_level(&self) -> u32 {
        self.prestige_level
    }

    pub fn crew(&self) -> &CrewRoster {
        &self.crew
    }

    pub fn veteran_count(&self) -> u32 {
        self.veteran_count
    }

    pub fn crew_assigned_to_equipment(&self) -> u32 {
        self.crew_assigned_to_equipment
    }

    pub fn prestige_planet_bonus(&self) -> u32 {
        self.prestige_planet_bonus
    }

    pub fn prestige_research_bonus(&self) -> u32 {
        self.prestige_research_bonus
    }

    pub fn expedition(&self) -> Option<&Expedition> {
        self.expedition.as_ref()
    }

    pub fn per_housing(&self) -> u32 {
        self.per_housing
    }

    fn planet_mut(&mut self, index: usize) -> Result<&mut Planet, CoreError> {
        self.planets
            .get_mut(index)
            .ok_or(CoreError::UnknownPlanet(index))
    }

    // --- coins ---

    /// Credit earned coins. Also raises the lifetime total.
    pub fn earn(&mut self, amount: Amount) -> Result<(), CoreError> {
        if amount < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(amount));
        }
        self.coins = saturating_add(self.coins, amount);
        self.total_coins_ever = saturating_add(self.total_coins_ever, amount);
        Ok(())
    }

    /// Return coins without counting them as earnings.
    pub fn refund(&mut self, amount: Amount) -> Result<(), CoreError> {
        if amount < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(amount));
        }
        self.coins = saturating_add(self.coins, amount);
        Ok(())
    }

    /// Spend coins; fails without change when the balance is short.
    pub fn spend(&mut self, cost: Amount) -> Result<(), CoreError> {
        let receipt = self.reserve(cost)?;
        self.commit(receipt);
        Ok(())
    }

    // --- production ---

    /// Sum of installed upgrade production over all planets.
    pub fn base_rate(&self) -> Amount {
        self.planets
            .iter()
            .fold(Decimal::ZERO, |acc, p| saturating_add(acc, p.base_rate()))
    }

    /// Re-derive the cached base rate from installed upgrades.
    pub fn recompute_rate(&mut self) {
        self.production_rate = self.base_rate();
    }

    fn apply_rate_delta(&mut self, delta: Amount) {
        self.production_rate = saturating_add(self.production_rate, delta).max(Decimal::ZERO);
    }

    // --- planets and upgrades ---

    /// Install an upgrade right away and start producing.
    pub fn install_now(&mut self, planet: usize, upgrade: Upgrade) -> Result<(), CoreError> {
        let rate = upgrade.coins_per_second();
        self.planet_mut(planet)?.add_upgrade(upgrade)?;
        self.apply_rate_delta(rate);
        Ok(())
    }

    pub fn begin_install(
        &mut self,
        planet: usize,
        upgrade: Upgrade,
        start_at: Millis,
        ends_at: Millis,
    ) -> Result<(), CoreError> {
        self.planet_mut(planet)?
            .begin_install(upgrade, start_at, ends_at)
    }

    pub fn begin_uninstall(
        &mut self,
        planet: usize,
        id: &UpgradeId,
        start_at: Millis,
        ends_at: Millis,
    ) -> Result<(), CoreError> {
        self.planet_mut(planet)?
            .begin_uninstall(id, start_at, ends_at)
    }

    pub fn add_housing(&mut self, planet: usize) -> Result<(), CoreError> {
        self.planet_mut(planet)?.add_housing()
    }

    pub fn remove_housing(&mut self, planet: usize) -> Result<(), CoreError> {
        let per_housing = self.per_housing;
        self.planet_mut(planet)?.remove_housing(per_housing)
    }

    pub fn expand_slots(&mut self, planet: usize, n: u32) -> Result<(), CoreError> {
        self.planet_mut(planet)?.expand_slots(n);
        Ok(())
    }

    /// Colonize another planet. Its installed upgrades start producing.
    pub fn add_planet(&mut self, planet: Planet) -> Result<(), CoreError> {
        let capacity = planet.crew_capacity(self.per_housing);
        if planet.assigned_crew() > 0 && planet.assigned_crew() > self.free_crew() {
            return Err(CoreError::NotEnoughCrew {
                needed: planet.assigned_crew(),
                free: self.free_crew(),
            });
        }
        if planet.assigned_crew() > capacity {
            return Err(CoreError::CrewOverCapacity {
                planet: planet.id().to_string(),
                assigned: planet.assigned_crew(),
                capacity,
            });
        }
        let rate = planet.base_rate();
        self.planets.push(planet);
        self.apply_rate_delta(rate);
        Ok(())
    }

    /// Finish every due install/uninstall on every planet, exactly once.
    pub fn complete_timers(&mut self, now: Millis) -> Vec<(usize, Completed)> {
        let mut finished = Vec::new();
        let mut delta = Decimal::ZERO;
        for (index, planet) in self.planets.iter_mut().enumerate() {
            let done = planet.complete_due(now);
            if !done.is_empty() {
                delta += done.rate_delta();
                finished.push((index, done));
            }
        }
        if !finished.is_empty() {
            self.apply_rate_delta(delta);
        }
        finished
    }

    // --- crew ---

    pub fn hire(&mut self, role: CrewRole, n: u32) {
        self.crew.add(role, n);
    }

    /// Crew capacity across all planets.
    pub fn crew_capacity(&self, tuning: &CrewTuning) -> u32 {
        self.planets.iter().fold(tuning.base_capacity, |acc, p| {
            acc.saturating_add(p.crew_capacity(tuning.per_housing))
        })
    }

    pub fn planet_assigned_crew(&self) -> u32 {
        self.planets
            .iter()
            .fold(0u32, |acc, p| acc.saturating_add(p.assigned_crew()))
    }

    pub fn crew_away(&self) -> u32 {
        self.expedition.as_ref().map(|e| e.crew).unwrap_or(0)
    }

    /// Hired crew that is neither assigned, operating equipment nor away.
    pub fn free_crew(&self) -> u32 {
        self.crew
            .total()
            .saturating_sub(self.planet_assigned_crew())
            .saturating_sub(self.crew_assigned_to_equipment)
            .saturating_sub(self.crew_away())
    }

    /// Astronauts available for an expedition.
    pub fn free_astronauts(&self) -> u32 {
        self.crew
            .get(CrewRole::Astronaut)
            .saturating_sub(self.crew_away())
            .min(self.free_crew())
    }

    pub fn assign_crew(&mut self, planet: usize, n: u32) -> Result<(), CoreError> {
        let free = self.free_crew();
        if n > free {
            return Err(CoreError::NotEnoughCrew { needed: n, free });
        }
        let per_housing = self.per_housing;
        self.planet_mut(planet)?.assign(n, per_housing)
    }

    pub fn unassign_crew(&mut self, planet: usize, n: u32) -> Result<(), CoreError> {
        self.planet_mut(planet)?.unassign(n)
    }

    /// Move free crew onto equipment duty.
    pub fn assign_equipment_crew(&mut self, n: u32) -> Result<(), CoreError> {
        let free = self.free_crew();
        if n > free {
            return Err(CoreError::NotEnoughCrew { needed: n, free });
        }
        self.crew_assigned_to_equipment += n;
        Ok(())
    }

    pub fn release_equipment_crew(&mut self, n: u32) -> Result<(), CoreError> {
        if n > self.crew_assigned_to_equipment {
            return Err(CoreError::NotEnoughCrew {
                needed: n,
                free: self.crew_assigned_to_equipment,
            });
        }
        self.crew_assigned_to_equipment -= n;
        Ok(())
    }

    // --- expeditions, veterans, artifacts ---

    pub fn start_expedition(
        &mut self,
        crew: u32,
        start_at: Millis,
        ends_at: Millis,
    ) -> Result<(), CoreError> {
        if self.expedition.is_some() {
            return Err(CoreError::ExpeditionUnderway);
        }
        let free = self.free_astronauts();
        if crew == 0 || crew > free {
            return Err(CoreError::NotEnoughCrew { needed: crew, free });
        }
        self.expedition = Some(Expedition {
            crew,
            start_at,
            ends_at,
        });
        Ok(())
    }

    /// Bring the expedition home: `lost` astronauts leave the roster, the
    /// rest come back as veterans.
    pub fn finish_expedition(&mut self, lost: u32) -> Result<Expedition, CoreError> {
        let expedition = self
            .expedition
            .take()
            .ok_or_else(|| CoreError::Invalid("no expedition underway".to_string()))?;
        let lost = lost.min(expedition.crew);
        if let Err(e) = self.crew.remove(CrewRole::Astronaut, lost) {
            self.expedition = Some(expedition);
            return Err(e);
        }
        self.veteran_count = self.veteran_count.saturating_add(expedition.crew - lost);
        Ok(expedition)
    }

    pub fn add_artifact(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }
}

impl Wallet for Player {
    fn balance(&self) -> Amount {
        self.coins
    }

    fn reserve(&mut self, cost: Amount) -> Result<Receipt, Denied> {
        if cost < Decimal::ZERO || cost > self.coins {
            return Err(Denied {
                needed: cost,
                available: self.coins,
            });
        }
        self.coins -= cost;
        self.held += cost;
        Ok(Receipt::issue(cost))
    }

    fn commit(&mut self, receipt: Receipt) {
        self.held = (self.held - receipt.amount()).max(Decimal::ZERO);
    }

    fn cancel(&mut self, receipt: Receipt) {
        let amount = receipt.amount().min(self.held);
        self.held -= amount;
        self.coins += amount;
    }
}
