use crate::error::CoreError;
use crate::number::{saturating_add, Amount, Millis};
use crate::upgrade::{Upgrade, UpgradeId};
use rust_decimal::Decimal;

/// An upgrade bought but not yet producing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingInstall {
    pub upgrade: Upgrade,
    pub start_at: Millis,
    pub ends_at: Millis,
    /// Production added to the player's base rate when the install completes.
    pub rate_to_add: Amount,
}

/// An owned upgrade on its way out. It keeps producing until `ends_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUninstall {
    pub upgrade_id: UpgradeId,
    pub start_at: Millis,
    pub ends_at: Millis,
}

/// Timers that finished during one [`Planet::complete_due`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completed {
    pub installed: Vec<Upgrade>,
    pub removed: Vec<Upgrade>,
}

impl Completed {
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty() && self.removed.is_empty()
    }

    /// Net change in base production.
    pub fn rate_delta(&self) -> Amount {
        let added = self
            .installed
            .iter()
            .fold(Decimal::ZERO, |acc, u| saturating_add(acc, u.coins_per_second()));
        let removed = self
            .removed
            .iter()
            .fold(Decimal::ZERO, |acc, u| saturating_add(acc, u.coins_per_second()));
        added - removed
    }
}

/// Plain field bag used to restore or persist a planet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanetParts {
    pub id: String,
    pub name: String,
    pub max_upgrades: u32,
    pub upgrades: Vec<Upgrade>,
    pub housing: u32,
    pub assigned_crew: u32,
    pub visual_seed: Option<u64>,
    pub installing: Vec<PendingInstall>,
    pub uninstalling: Vec<PendingUninstall>,
}

/// A planet with a finite number of slots.
///
/// Slot usage counts slot-using owned upgrades, housing modules and
/// slot-using upgrades still installing: a purchase holds its slot from the
/// moment it is paid for. No mutator can push usage past `max_upgrades`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Planet {
    id: String,
    name: String,
    max_upgrades: u32,
    upgrades: Vec<Upgrade>,
    housing: u32,
    assigned_crew: u32,
    visual_seed: Option<u64>,
    installing: Vec<PendingInstall>,
    uninstalling: Vec<PendingUninstall>,
}

impl Planet {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_upgrades: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_upgrades,
            upgrades: Vec::new(),
            housing: 0,
            assigned_crew: 0,
            visual_seed: None,
            installing: Vec::new(),
            uninstalling: Vec::new(),
        }
    }

    /// Rebuild a planet, failing fast on any invariant violation.
    pub fn from_parts(parts: PlanetParts, per_housing: u32) -> Result<Self, CoreError> {
        let planet = Self {
            id: parts.id,
            name: parts.name,
            max_upgrades: parts.max_upgrades,
            upgrades: parts.upgrades,
            housing: parts.housing,
            assigned_crew: parts.assigned_crew,
            visual_seed: parts.visual_seed,
            installing: parts.installing,
            uninstalling: parts.uninstalling,
        };
        let used = planet.used_slots();
        if used > planet.max_upgrades {
            return Err(CoreError::NoFreeSlot {
                planet: planet.id.clone(),
                used,
                max: planet.max_upgrades,
            });
        }
        let capacity = planet.crew_capacity(per_housing);
        if planet.assigned_crew > capacity {
            return Err(CoreError::CrewOverCapacity {
                planet: planet.id.clone(),
                assigned: planet.assigned_crew,
                capacity,
            });
        }
        for pending in &planet.uninstalling {
            let id = &pending.upgrade_id;
            if planet.owned_count(id) < planet.uninstalling_count(id) {
                return Err(CoreError::UpgradeNotOwned(pending.upgrade_id.0.clone()));
            }
        }
        Ok(planet)
    }

    pub fn to_parts(&self) -> PlanetParts {
        PlanetParts {
            id: self.id.clone(),
            name: self.name.clone(),
            max_upgrades: self.max_upgrades,
            upgrades: self.upgrades.clone(),
            housing: self.housing,
            assigned_crew: self.assigned_crew,
            visual_seed: self.visual_seed,
            installing: self.installing.clone(),
            uninstalling: self.uninstalling.clone(),
        }
    }

    pub fn with_visual_seed(mut self, seed: u64) -> Self {
        self.visual_seed = Some(seed);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_upgrades(&self) -> u32 {
        self.max_upgrades
    }

    /// Fully installed upgrades.
    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    pub fn housing(&self) -> u32 {
        self.housing
    }

    pub fn assigned_crew(&self) -> u32 {
        self.assigned_crew
    }

    pub fn visual_seed(&self) -> Option<u64> {
        self.visual_seed
    }

    pub fn installing(&self) -> &[PendingInstall] {
        &self.installing
    }

    pub fn uninstalling(&self) -> &[PendingUninstall] {
        &self.uninstalling
    }

    pub fn used_slots(&self) -> u32 {
        let owned = self.upgrades.iter().filter(|u| u.uses_slot()).count() as u32;
        let pending = self
            .installing
            .iter()
            .filter(|p| p.upgrade.uses_slot())
            .count() as u32;
        owned.saturating_add(pending).saturating_add(self.housing)
    }

    pub fn free_slots(&self) -> u32 {
        self.max_upgrades.saturating_sub(self.used_slots())
    }

    /// Production of fully installed upgrades on this planet.
    pub fn base_rate(&self) -> Amount {
        self.upgrades
            .iter()
            .fold(Decimal::ZERO, |acc, u| saturating_add(acc, u.coins_per_second()))
    }

    pub fn crew_capacity(&self, per_housing: u32) -> u32 {
        self.housing.saturating_mul(per_housing)
    }

    pub fn owned_count(&self, id: &UpgradeId) -> usize {
        self.upgrades.iter().filter(|u| u.id() == id).count()
    }

    fn uninstalling_count(&self, id: &UpgradeId) -> usize {
        self.uninstalling.iter().filter(|p| &p.upgrade_id == id).count()
    }

    fn ensure_free_slot(&self) -> Result<(), CoreError> {
        let used = self.used_slots();
        if used >= self.max_upgrades {
            return Err(CoreError::NoFreeSlot {
                planet: self.id.clone(),
                used,
                max: self.max_upgrades,
            });
        }
        Ok(())
    }

    /// Install immediately. Slot-using upgrades need a free slot.
    pub fn add_upgrade(&mut self, upgrade: Upgrade) -> Result<(), CoreError> {
        if upgrade.uses_slot() {
            self.ensure_free_slot()?;
        }
        self.upgrades.push(upgrade);
        Ok(())
    }

    /// Start a timed installation; the slot is held from now on.
    pub fn begin_install(
        &mut self,
        upgrade: Upgrade,
        start_at: Millis,
        ends_at: Millis,
    ) -> Result<(), CoreError> {
        if upgrade.uses_slot() {
            self.ensure_free_slot()?;
        }
        let rate_to_add = upgrade.coins_per_second();
        self.installing.push(PendingInstall {
            upgrade,
            start_at,
            ends_at,
            rate_to_add,
        });
        Ok(())
    }

    /// Schedule removal of one owned copy of `id`.
    pub fn begin_uninstall(
        &mut self,
        id: &UpgradeId,
        start_at: Millis,
        ends_at: Millis,
    ) -> Result<(), CoreError> {
        if self.owned_count(id) <= self.uninstalling_count(id) {
            return Err(CoreError::UpgradeNotOwned(id.0.clone()));
        }
        self.uninstalling.push(PendingUninstall {
            upgrade_id: id.clone(),
            start_at,
            ends_at,
        });
        Ok(())
    }

    pub fn add_housing(&mut self) -> Result<(), CoreError> {
        self.ensure_free_slot()?;
        self.housing += 1;
        Ok(())
    }

    /// Remove one housing module. Crew assigned here must still fit.
    pub(crate) fn remove_housing(&mut self, per_housing: u32) -> Result<(), CoreError> {
        if self.housing == 0 {
            return Err(CoreError::Invalid(format!("planet {} has no housing", self.id)));
        }
        let capacity = (self.housing - 1).saturating_mul(per_housing);
        if self.assigned_crew > capacity {
            return Err(CoreError::CrewOverCapacity {
                planet: self.id.clone(),
                assigned: self.assigned_crew,
                capacity,
            });
        }
        self.housing -= 1;
        Ok(())
    }

    pub fn expand_slots(&mut self, n: u32) {
        self.max_upgrades = self.max_upgrades.saturating_add(n);
    }

    pub(crate) fn assign(&mut self, n: u32, per_housing: u32) -> Result<(), CoreError> {
        let capacity = self.crew_capacity(per_housing);
        let assigned = self.assigned_crew.saturating_add(n);
        if assigned > capacity {
            return Err(CoreError::CrewOverCapacity {
                planet: self.id.clone(),
                assigned,
                capacity,
            });
        }
        self.assigned_crew = assigned;
        Ok(())
    }

    pub(crate) fn unassign(&mut self, n: u32) -> Result<(), CoreError> {
        if n > self.assigned_crew {
            return Err(CoreError::NotEnoughCrew {
                needed: n,
                free: self.assigned_crew,
            });
        }
        self.assigned_crew -= n;
        Ok(())
    }

    /// Apply every timer with `ends_at <= now`. Finished timers are drained,
    /// so calling this twice with the same `now` completes nothing the second time.
    pub fn complete_due(&mut self, now: Millis) -> Completed {
        let mut done = Completed::default();
        let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.installing)
            .into_iter()
            .partition(|p| p.ends_at <= now);
        self.installing = pending;
        for p in finished {
            self.upgrades.push(p.upgrade.clone());
            done.installed.push(p.upgrade);
        }

        let (finished, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.uninstalling)
            .into_iter()
            .partition(|p| p.ends_at <= now);
        self.uninstalling = pending;
        for p in finished {
            if let Some(pos) = self.upgrades.iter().position(|u| u.id() == &p.upgrade_id) {
                done.removed.push(self.upgrades.remove(pos));
            }
        }
        done
    }
}
