use sim_core::{Amount, CoreError, CrewRole, Denied};
use thiserror::Error;

/// Why a player action was refused. State is unchanged in every case.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },
    #[error("no free slot on {planet} ({used}/{max})")]
    NoFreeSlot { planet: String, used: u32, max: u32 },
    #[error("not enough free crew: need {needed}, have {free}")]
    NoCrew { needed: u32, free: u32 },
    #[error("crew role {0} is not unlocked")]
    RoleLocked(CrewRole),
    #[error("unknown upgrade: {0}")]
    UnknownUpgrade(String),
    #[error("unknown planet index: {0}")]
    UnknownPlanet(usize),
    #[error("crew capacity reached ({capacity})")]
    CrewCapacity { capacity: u32 },
    #[error("busy: {0}")]
    Busy(String),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("event {event} has no choice {index}")]
    UnknownChoice { event: String, index: usize },
    #[error(transparent)]
    Core(CoreError),
}

impl From<Denied> for ActionError {
    fn from(d: Denied) -> Self {
        ActionError::InsufficientFunds {
            needed: d.needed,
            available: d.available,
        }
    }
}

impl From<CoreError> for ActionError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InsufficientFunds { needed, available } => {
                ActionError::InsufficientFunds { needed, available }
            }
            CoreError::NoFreeSlot { planet, used, max } => {
                ActionError::NoFreeSlot { planet, used, max }
            }
            CoreError::NotEnoughCrew { needed, free } => ActionError::NoCrew { needed, free },
            CoreError::CrewOverCapacity { capacity, .. } => ActionError::CrewCapacity { capacity },
            CoreError::UnknownPlanet(i) => ActionError::UnknownPlanet(i),
            CoreError::ExpeditionUnderway => ActionError::Busy("expedition underway".to_string()),
            other => ActionError::Core(other),
        }
    }
}
