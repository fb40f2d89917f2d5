use crate::core::{Action, Ball, Paddle, Side};

/// What happened to the agent's paddle during one tick.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::IsVariant)]
pub enum TickEvent {
    Nothing,
    /// The paddle sent the ball back.
    Returned,
    /// The ball crossed the agent's goal line.
    ///
    /// `gap` is the vertical distance between the ball and the nearest edge
    /// of the paddle at the moment of the miss.
    Missed { gap: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SimulationStatus {
    Running,
    TimeLimitReached,
    TargetScoreReached,
}

/// State of a single fitness evaluation.
///
/// The agent defends one goal line; the opposite goal line is a solid wall
/// that returns every ball. Nothing here is shared between evaluations.
#[derive(Debug, Clone)]
pub struct SimulationState {
    ball: Ball,
    observed: Ball,
    paddle: Paddle,
    returns: u32,
    misses: u32,
    tick: u64,
}

impl SimulationState {
    /// The agent sees a snapshot of the ball refreshed once every this many ticks.
    pub const REACTION_TICKS: u64 = 60;

    /// Starts an evaluation with `ball` in play and a centered paddle on `side`.
    #[must_use]
    pub fn new(ball: Ball, side: Side) -> Self {
        Self {
            ball,
            observed: ball,
            paddle: Paddle::centered(side),
            returns: 0,
            misses: 0,
            tick: 0,
        }
    }

    /// The true ball position.
    #[must_use]
    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    /// The ball as last seen by the agent.
    #[must_use]
    pub fn observed_ball(&self) -> &Ball {
        &self.observed
    }

    #[must_use]
    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    /// Successful returns so far.
    #[must_use]
    pub fn returns(&self) -> u32 {
        self.returns
    }

    /// Points scored by the wall opponent so far.
    #[must_use]
    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Ticks simulated so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Puts a new ball in play, typically after a [`TickEvent::Missed`].
    ///
    /// The observed snapshot is left alone; it catches up on the next
    /// reaction tick.
    pub fn serve(&mut self, ball: Ball) {
        self.ball = ball;
    }

    #[must_use]
    pub fn status(&self, tick_limit: u64, target_score: u32) -> SimulationStatus {
        if self.misses >= target_score {
            SimulationStatus::TargetScoreReached
        } else if self.tick >= tick_limit {
            SimulationStatus::TimeLimitReached
        } else {
            SimulationStatus::Running
        }
    }

    /// Simulates one tick.
    ///
    /// `decide` receives the observed ball and the paddle and returns the
    /// paddle action. If it fails, the tick is abandoned and the error is
    /// returned unchanged.
    ///
    /// After a miss the ball stays out of court until [`Self::serve`] is called.
    pub fn step<F, E>(&mut self, decide: F) -> Result<TickEvent, E>
    where
        F: FnOnce(&Ball, &Paddle) -> Result<Action, E>,
    {
        self.ball.advance();
        if self.tick % Self::REACTION_TICKS == 0 {
            self.observed = self.ball;
        }

        let action = decide(&self.observed, &self.paddle)?;
        self.paddle.apply(action);

        let side = self.paddle.side();
        self.ball.bounce_off_walls();
        self.ball.bounce_off_goal_wall(side.opposite());

        let event = if self.paddle.try_return(&mut self.ball) {
            self.returns += 1;
            TickEvent::Returned
        } else if self.ball.has_crossed_goal_line(side) {
            self.misses += 1;
            TickEvent::Missed {
                gap: self.paddle.gap_to(self.ball.y),
            }
        } else {
            TickEvent::Nothing
        };

        self.tick += 1;
        Ok(event)
    }
}
