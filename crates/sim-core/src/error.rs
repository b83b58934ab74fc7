use crate::number::Amount;
use thiserror::Error;

/// Invariant violations on the entity model.
///
/// Apart from `InsufficientFunds`, these indicate a caller bug: the economic
/// actions check their preconditions before touching an entity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Spending more coins than available.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },
    /// Slot-using addition on a full planet.
    #[error("planet {planet} has no free slot ({used}/{max} used)")]
    NoFreeSlot { planet: String, used: u32, max: u32 },
    /// Planet holds more than its housing allows.
    #[error("planet {planet} houses at most {capacity} crew, got {assigned}")]
    CrewOverCapacity {
        planet: String,
        assigned: u32,
        capacity: u32,
    },
    /// Not enough unassigned crew for an assignment.
    #[error("not enough free crew: need {needed}, {free} free")]
    NotEnoughCrew { needed: u32, free: u32 },
    /// A player always owns a home planet.
    #[error("player must own at least one planet")]
    NoPlanets,
    #[error("negative amount: {0}")]
    NegativeAmount(Amount),
    #[error("no planet at index {0}")]
    UnknownPlanet(usize),
    #[error("upgrade {0} is not owned")]
    UpgradeNotOwned(String),
    #[error("unknown crew role: {0}")]
    UnknownRole(String),
    #[error("an expedition is already underway")]
    ExpeditionUnderway,
    #[error("invalid state: {0}")]
    Invalid(String),
}
