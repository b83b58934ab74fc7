#![deny(warnings)]

//! Core domain models and invariants for Star Idle.
//!
//! This crate defines the entity graph of a run (player, planets, upgrades,
//! crew, events) with mutation methods that keep its invariants: slot
//! capacity, non-negative coins and crew accounting. Balance constants live
//! in [`config::Tuning`].

pub mod config;
pub mod crew;
pub mod error;
pub mod naming;
pub mod number;
pub mod planet;
pub mod player;
pub mod session;
pub mod upgrade;
pub mod wallet;

pub use config::Tuning;
pub use crew::{CrewRole, CrewRoster};
pub use error::CoreError;
pub use number::{Amount, Millis};
pub use planet::{Completed, PendingInstall, PendingUninstall, Planet, PlanetParts};
pub use player::{Expedition, Legacy, Player, PlayerParts};
pub use session::{Artifact, EventEffect, GameEvent, GameSession, Rarity, RunStats};
pub use upgrade::{Upgrade, UpgradeId};
pub use wallet::{Denied, Receipt, Wallet};
