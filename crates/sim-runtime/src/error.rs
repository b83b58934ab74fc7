use persistence::PersistError;
use sim_core::Amount;
use sim_econ::ActionError;
use sim_research::ResearchError;
use thiserror::Error;

/// Why a runtime command was refused. A refused command changes nothing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Research(#[from] ResearchError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("prestige needs {needed} coins, have {available}")]
    PrestigeLocked { needed: Amount, available: Amount },
    #[error("no choice event is waiting for an answer")]
    NoPendingChoice,
    #[error("config error: {0}")]
    Config(String),
}
