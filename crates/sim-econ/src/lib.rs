#![deny(warnings)]

//! Economy rules for Star Idle.
//!
//! This crate provides the pure game rules that sit on top of the entity
//! model:
//! - Production rate stacking (planets, prestige, crew, morale, events,
//!   research, set bonuses)
//! - Player actions such as buying upgrades, hiring crew and colonizing
//! - Prestige resets, random events, expeditions, achievements and offline
//!   progress
//!
//! Every action checks before it mutates, so a returned error means the
//! player is unchanged.

pub mod actions;
pub mod error;
pub mod events;
pub mod expedition;
pub mod offline;
pub mod prestige;
pub mod production;
pub mod progress;

pub use actions::{Purchase, TimerReport};
pub use error::ActionError;
pub use events::{ChoiceOutcome, EventRoll};
pub use expedition::ExpeditionReport;
pub use offline::OfflineReport;
pub use production::RateBreakdown;
pub use progress::{ProgressBook, ProgressSnapshot};
