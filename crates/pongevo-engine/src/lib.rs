//! Deterministic paddle-and-ball physics used to score agents.
//!
//! - [`core`] holds the geometry: court dimensions, [`Ball`], [`Paddle`] and the
//!   three-way paddle [`Action`].
//! - [`engine`] holds the tick loop ([`SimulationState`]) and the run-wide
//!   [`GameConfig`].
//!
//! The engine never picks actions and never draws random numbers on its own:
//! callers supply a decision for every tick and a fresh serve after every miss.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
