use crate::error::CoreError;
use crate::number::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier of an upgrade, e.g. "drill".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

impl From<&str> for UpgradeId {
    fn from(s: &str) -> Self {
        UpgradeId(s.to_string())
    }
}

impl From<String> for UpgradeId {
    fn from(s: String) -> Self {
        UpgradeId(s)
    }
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One owned copy of an upgrade. Immutable once created; buying the same
/// upgrade twice yields two instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upgrade {
    id: UpgradeId,
    name: String,
    cost: Amount,
    coins_per_second: Amount,
    uses_slot: bool,
    module: Option<String>,
    crew_used: u32,
}

impl Upgrade {
    /// Create an upgrade instance. Cost and production must be non-negative.
    pub fn new(
        id: impl Into<UpgradeId>,
        name: impl Into<String>,
        cost: Amount,
        coins_per_second: Amount,
        uses_slot: bool,
    ) -> Result<Self, CoreError> {
        if cost < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(cost));
        }
        if coins_per_second < Decimal::ZERO {
            return Err(CoreError::NegativeAmount(coins_per_second));
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            cost,
            coins_per_second,
            uses_slot,
            module: None,
            crew_used: 0,
        })
    }

    /// Tag the instance with the module kind used by set bonuses.
    pub fn with_module(mut self, module: Option<String>) -> Self {
        self.module = module;
        self
    }

    /// Record the crew put on equipment duty to run this copy.
    pub fn with_crew(mut self, crew_used: u32) -> Self {
        self.crew_used = crew_used;
        self
    }

    pub fn id(&self) -> &UpgradeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coins paid at purchase time.
    pub fn cost(&self) -> Amount {
        self.cost
    }

    pub fn coins_per_second(&self) -> Amount {
        self.coins_per_second
    }

    pub fn uses_slot(&self) -> bool {
        self.uses_slot
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Crew released when this copy is removed.
    pub fn crew_used(&self) -> u32 {
        self.crew_used
    }
}
