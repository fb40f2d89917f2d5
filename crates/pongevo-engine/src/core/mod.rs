//! Court geometry and the bodies moving in it.
//!
//! Coordinates are in pixels with the origin at the top-left corner of the
//! court: `x` grows toward the right goal line and `y` grows downward.

pub use self::{action::*, ball::*, paddle::*};

mod action;
mod ball;
pub mod court;
mod paddle;
