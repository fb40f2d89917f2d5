//! What an agent sees of the court.
//!
//! Networks are always trained from the point of view of the right-hand
//! paddle. An agent placed on the left side sees a horizontally mirrored
//! court, so the same weights work on either side:
//!
//! ```text
//! right: [ball.x / H,       ball.y / H,  ball.dx, ball.dy, paddle.y / H]
//! left:  [(W - ball.x) / H, ball.y / H, -ball.dx, ball.dy, paddle.y / H]
//! ```
//!
//! `W` and `H` are the court width and height. Velocities are passed through
//! unscaled.

use pongevo_engine::{Action, Ball, Paddle, Side, court};

use crate::network::{INPUT_SIZE, NeuralNetwork};

/// Builds the network input for an agent defending `viewpoint`.
#[must_use]
pub fn observe(viewpoint: Side, ball: &Ball, paddle: &Paddle) -> [f64; INPUT_SIZE] {
    let (x, dx) = match viewpoint {
        Side::Right => (ball.x, ball.dx),
        Side::Left => (court::WIDTH - ball.x, -ball.dx),
    };
    [
        x / court::HEIGHT,
        ball.y / court::HEIGHT,
        dx,
        ball.dy,
        paddle.y() / court::HEIGHT,
    ]
}

impl NeuralNetwork {
    /// Picks the paddle action for an agent defending `viewpoint`.
    ///
    /// Returns `None` when the network output is not finite.
    #[must_use]
    pub fn decide_for(&self, viewpoint: Side, ball: &Ball, paddle: &Paddle) -> Option<Action> {
        self.decide(&observe(viewpoint, ball, paddle))
    }
}
