#![deny(warnings)]

//! Game loop for Star Idle on a `bevy_ecs` world.
//!
//! [`GameRuntime`] keeps the session, research, progress book, rules, clock,
//! dice and save slot as world resources. Each [`GameRuntime::tick`] runs a
//! fixed chain of systems (timers, expeditions, event expiry, production,
//! event rolls, achievements, autosave). Player commands are methods on the
//! runtime and are saved as soon as they succeed.

pub mod config;
pub mod error;
pub mod notice;
pub mod resources;
pub mod runtime;
pub mod systems;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use notice::{Notice, Notices};
pub use resources::DynStore;
pub use runtime::GameRuntime;
