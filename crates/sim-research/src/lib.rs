#![deny(warnings)]

//! Research tree progression.
//!
//! Each node moves `Locked -> Attemptable -> Unlocked`. Attempts cost coins
//! (and sometimes research data) and succeed with a probability raised by
//! scientists; repeated failures eventually guarantee success. Randomness is
//! injected through [`RollSource`] so tests can force either outcome.

pub mod engine;
pub mod roll;

pub use engine::{ActiveModifiers, AttemptOutcome, NodeStatus, ResearchError, ResearchState};
pub use roll::{FixedRoll, RollSource, SeededRoll};
