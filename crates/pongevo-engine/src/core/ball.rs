use std::f64::consts::FRAC_PI_4;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Side, court};

/// The ball: a circle of [`Ball::RADIUS`] moving at a constant speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Ball {
    pub const RADIUS: f64 = 8.0;
    /// Distance travelled per tick, before and after every paddle return.
    pub const SPEED: f64 = 8.0;
    /// Serves leave the center within `±MAX_SERVE_ANGLE` of the horizontal.
    pub const MAX_SERVE_ANGLE: f64 = FRAC_PI_4;
    /// Floor on `|dy|` after a wall bounce.
    ///
    /// A ball skimming a wall with a tiny vertical speed would otherwise stay
    /// inside the collision band and bounce on every tick.
    pub const MIN_REBOUND_DY: f64 = 1.0;

    #[must_use]
    pub const fn new(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, dx, dy }
    }

    /// Launches a ball from the horizontal center of the court at height `y`.
    ///
    /// `angle` is measured from the horizontal; positive angles head up the
    /// screen (decreasing `y`).
    #[must_use]
    pub fn launched(y: f64, angle: f64, toward: Side) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: court::CENTER_X,
            y,
            dx: toward.sign() * Self::SPEED * cos,
            dy: -Self::SPEED * sin,
        }
    }

    /// Serves a ball from the center of the court with a random angle and
    /// a random direction.
    pub fn serve<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let angle = rng.random_range(-Self::MAX_SERVE_ANGLE..=Self::MAX_SERVE_ANGLE);
        let toward = if rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        Self::launched(court::CENTER_Y, angle, toward)
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn advance(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
    }

    /// Reflects the ball off the top and bottom walls.
    ///
    /// Returns `true` if the ball bounced.
    pub fn bounce_off_walls(&mut self) -> bool {
        if self.y - Self::RADIUS <= 0.0 {
            self.y = Self::RADIUS;
            self.dy = self.dy.abs().max(Self::MIN_REBOUND_DY);
            true
        } else if self.y + Self::RADIUS >= court::HEIGHT {
            self.y = court::HEIGHT - Self::RADIUS;
            self.dy = -self.dy.abs().max(Self::MIN_REBOUND_DY);
            true
        } else {
            false
        }
    }

    /// Reflects the ball off a solid wall standing on the goal line of `side`.
    ///
    /// Returns `true` if the ball bounced.
    pub fn bounce_off_goal_wall(&mut self, side: Side) -> bool {
        match side {
            Side::Left if self.dx < 0.0 && self.x - Self::RADIUS <= 0.0 => {
                self.x = Self::RADIUS;
                self.dx = self.dx.abs();
                true
            }
            Side::Right if self.dx > 0.0 && self.x + Self::RADIUS >= court::WIDTH => {
                self.x = court::WIDTH - Self::RADIUS;
                self.dx = -self.dx.abs();
                true
            }
            _ => false,
        }
    }

    /// Returns `true` once the ball's center is past the goal line of `side`.
    #[must_use]
    pub fn has_crossed_goal_line(&self, side: Side) -> bool {
        match side {
            Side::Left => self.x < 0.0,
            Side::Right => self.x > court::WIDTH,
        }
    }
}
