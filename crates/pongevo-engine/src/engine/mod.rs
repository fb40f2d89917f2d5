//! Tick loop and run configuration.
//!
//! - [`SimulationState`] - state of one fitness evaluation (ball, paddle,
//!   counters, the agent's delayed view of the ball)
//! - [`GameConfig`] - immutable parameters of a training run
//!
//! # Tick Order
//!
//! Every call to [`SimulationState::step`] performs, in order:
//!
//! 1. Advance the ball by its velocity
//! 2. Every [`SimulationState::REACTION_TICKS`] ticks, refresh the observed ball
//! 3. Ask the caller for an action based on the observed ball; move the paddle
//! 4. Bounce off the top and bottom walls (and the opponent's goal wall)
//! 5. Try a paddle return
//! 6. Report a return or a miss as a [`TickEvent`]
//!
//! # Example
//!
//! ```
//! use pongevo_engine::{Action, Ball, SimulationState, Side, TickEvent, court};
//!
//! let ball = Ball::launched(court::CENTER_Y, 0.0, Side::Right);
//! let mut state = SimulationState::new(ball, Side::Right);
//!
//! // Hold still: a flat serve straight at the centered paddle comes back.
//! let mut returned = false;
//! while state.tick() < 100 {
//!     let event = state
//!         .step(|_observed, _paddle| Ok::<_, ()>(Action::Hold))
//!         .unwrap();
//!     returned |= event == TickEvent::Returned;
//! }
//! assert!(returned);
//! ```

pub use self::{config::*, simulation::*};

mod config;
mod simulation;
