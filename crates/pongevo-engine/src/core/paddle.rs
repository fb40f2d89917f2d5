use serde::{Deserialize, Serialize};

use super::{Action, Ball, court};

/// Goal line a paddle defends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sign of `dx` for a ball travelling toward this side.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// A paddle standing in front of one goal line.
///
/// `y` is the top edge; the paddle never leaves the court.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    side: Side,
    y: f64,
}

impl Paddle {
    pub const WIDTH: f64 = 10.0;
    pub const HEIGHT: f64 = 100.0;
    /// Vertical distance covered by one move action.
    pub const SPEED: f64 = 6.0;
    /// Gap between the goal line and the back of the paddle.
    pub const MARGIN: f64 = 20.0;
    /// Rebound angle for a ball touching the very edge of the paddle (75°).
    pub const MAX_REBOUND_ANGLE: f64 = 75.0 * std::f64::consts::PI / 180.0;

    const MAX_Y: f64 = court::HEIGHT - Self::HEIGHT;

    /// Creates a paddle vertically centered on `side`.
    #[must_use]
    pub const fn centered(side: Side) -> Self {
        Self {
            side,
            y: (court::HEIGHT - Self::HEIGHT) / 2.0,
        }
    }

    /// Creates a paddle with its top edge at `y`, clamped into the court.
    #[must_use]
    pub fn at(side: Side, y: f64) -> Self {
        Self {
            side,
            y: y.clamp(0.0, Self::MAX_Y),
        }
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Top edge.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub const fn bottom(&self) -> f64 {
        self.y + Self::HEIGHT
    }

    #[must_use]
    pub const fn center_y(&self) -> f64 {
        self.y + Self::HEIGHT / 2.0
    }

    /// Left edge.
    #[must_use]
    pub const fn x(&self) -> f64 {
        match self.side {
            Side::Left => Self::MARGIN,
            Side::Right => court::WIDTH - Self::MARGIN - Self::WIDTH,
        }
    }

    pub fn apply(&mut self, action: Action) {
        self.y = (self.y + action.direction() * Self::SPEED).clamp(0.0, Self::MAX_Y);
    }

    /// Angle at which a ball touching the paddle at height `ball_y` leaves it.
    ///
    /// The offset from the paddle's center is normalized to `[-1, 1]` and
    /// scaled to [`Self::MAX_REBOUND_ANGLE`]. Hits above the center give
    /// positive angles (the ball heads up the screen).
    #[must_use]
    pub fn rebound_angle(&self, ball_y: f64) -> f64 {
        let offset = ((self.center_y() - ball_y) / (Self::HEIGHT / 2.0)).clamp(-1.0, 1.0);
        offset * Self::MAX_REBOUND_ANGLE
    }

    /// Returns `true` if the ball overlaps the paddle while travelling toward it.
    #[must_use]
    pub fn is_touching(&self, ball: &Ball) -> bool {
        let incoming = ball.dx * self.side.sign() > 0.0;
        incoming
            && ball.x + Ball::RADIUS >= self.x()
            && ball.x - Ball::RADIUS <= self.x() + Self::WIDTH
            && ball.y + Ball::RADIUS >= self.y
            && ball.y - Ball::RADIUS <= self.bottom()
    }

    /// Sends the ball back toward the opposite side if it touches the paddle.
    ///
    /// Returns `true` on a successful return.
    pub fn try_return(&self, ball: &mut Ball) -> bool {
        if !self.is_touching(ball) {
            return false;
        }
        let (sin, cos) = self.rebound_angle(ball.y).sin_cos();
        ball.dx = -self.side.sign() * Ball::SPEED * cos;
        ball.dy = Ball::SPEED * -sin;
        ball.x = match self.side {
            Side::Left => self.x() + Self::WIDTH + Ball::RADIUS,
            Side::Right => self.x() - Ball::RADIUS,
        };
        true
    }

    /// Vertical distance from `y` to the nearest point of the paddle.
    ///
    /// Zero when `y` lies between the top and bottom edges.
    #[must_use]
    pub fn gap_to(&self, y: f64) -> f64 {
        if y < self.y {
            self.y - y
        } else if y > self.bottom() {
            y - self.bottom()
        } else {
            0.0
        }
    }
}
