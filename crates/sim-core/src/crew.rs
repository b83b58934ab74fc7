use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Jobs a crew member can be hired for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewRole {
    /// Generic crew, hireable from the start.
    Astronaut,
    /// Boosts production more than other roles; hireable from the start.
    Miner,
    /// Raises research success chance.
    Scientist,
    Pilot,
    Medic,
    Engineer,
}

impl CrewRole {
    pub const ALL: [CrewRole; 6] = [
        CrewRole::Astronaut,
        CrewRole::Miner,
        CrewRole::Scientist,
        CrewRole::Pilot,
        CrewRole::Medic,
        CrewRole::Engineer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CrewRole::Astronaut => "astronaut",
            CrewRole::Miner => "miner",
            CrewRole::Scientist => "scientist",
            CrewRole::Pilot => "pilot",
            CrewRole::Medic => "medic",
            CrewRole::Engineer => "engineer",
        }
    }

    /// Roles that do not need a research unlock before hiring.
    pub fn hireable_by_default(self) -> bool {
        matches!(self, CrewRole::Astronaut | CrewRole::Miner)
    }
}

impl fmt::Display for CrewRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrewRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrewRole::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}

/// Hired crew per role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrewRoster {
    counts: BTreeMap<CrewRole, u32>,
}

impl CrewRoster {
    pub fn from_counts(counts: BTreeMap<CrewRole, u32>) -> Self {
        let counts = counts.into_iter().filter(|(_, n)| *n > 0).collect();
        Self { counts }
    }

    pub fn get(&self, role: CrewRole) -> u32 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().fold(0u32, |acc, n| acc.saturating_add(*n))
    }

    pub fn miners(&self) -> u32 {
        self.get(CrewRole::Miner)
    }

    /// Everyone who is not a miner.
    pub fn others(&self) -> u32 {
        self.total() - self.miners()
    }

    pub fn add(&mut self, role: CrewRole, n: u32) {
        if n == 0 {
            return;
        }
        let slot = self.counts.entry(role).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// Remove `n` crew of `role`; fails without change if fewer are hired.
    pub fn remove(&mut self, role: CrewRole, n: u32) -> Result<(), CoreError> {
        let have = self.get(role);
        if have < n {
            return Err(CoreError::NotEnoughCrew {
                needed: n,
                free: have,
            });
        }
        if have == n {
            self.counts.remove(&role);
        } else {
            self.counts.insert(role, have - n);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (CrewRole, u32)> + '_ {
        self.counts.iter().map(|(r, n)| (*r, *n))
    }

    pub fn counts(&self) -> &BTreeMap<CrewRole, u32> {
        &self.counts
    }
}
