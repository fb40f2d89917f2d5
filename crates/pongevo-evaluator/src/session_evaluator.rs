//! Session evaluation: fitness functions for training agents.
//!
//! A session evaluator puts a network in control of a paddle, runs a
//! [`SimulationState`] until it terminates and turns what happened into a
//! fitness score. The opponent is always a solid wall on the far goal line.
//!
//! # Scoring
//!
//! ```text
//! fitness = returns + Σ miss_bonus(gap)
//!
//! miss_bonus(gap) = MISS_BONUS_WEIGHT × (1 - gap / MISS_BONUS_RANGE)   if gap < MISS_BONUS_RANGE
//!                 = 0                                                   otherwise
//! ```
//!
//! `gap` is the vertical distance between the ball and the paddle's nearest
//! edge when the ball crosses the goal line. The bonus rewards near misses so
//! that early generations, which rarely return anything, still have a
//! gradient to climb.
//!
//! # Modes
//!
//! ## Normal
//!
//! [`NormalSessionEvaluator`] serves from the center with a random angle and
//! direction and keeps playing, re-serving after every miss, until the tick
//! budget runs out or the wall has scored `target_score` points. Scores depend
//! on the random serves.
//!
//! ## Predefined
//!
//! [`PredefinedSessionEvaluator`] sweeps a fixed grid of serve heights and
//! angles. Each scenario starts with a centered paddle and runs until the
//! first miss or [`PredefinedSessionEvaluator::SCENARIO_TICK_LIMIT`] ticks;
//! the fitness is the total number of returns over all scenarios. It draws no
//! random numbers, so repeated runs give identical scores.

use std::fmt;

use pongevo_engine::{Ball, GameConfig, Side, SimulationState, TickEvent, court};
use rand::RngCore;

use crate::network::NeuralNetwork;

/// Misses closer than this many pixels to the paddle earn a bonus.
pub const MISS_BONUS_RANGE: f64 = 60.0;
/// Bonus for a miss that grazes the paddle edge.
pub const MISS_BONUS_WEIGHT: f64 = 0.5;

/// Fitness earned by a miss `gap` pixels away from the paddle.
#[must_use]
pub fn miss_bonus(gap: f64) -> f64 {
    if gap < MISS_BONUS_RANGE {
        MISS_BONUS_WEIGHT * (1.0 - gap / MISS_BONUS_RANGE)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SimulationError {
    #[display("network produced a non-finite decision at tick {tick}")]
    NonFiniteDecision { tick: u64 },
}

/// Evaluates complete game sessions for training.
///
/// Implementations must not keep state between calls: the training loop
/// shares one evaluator across all worker threads.
pub trait SessionEvaluator: fmt::Debug + Send + Sync {
    /// Plays one session with `network` in control and returns its fitness.
    fn evaluate(
        &self,
        network: &NeuralNetwork,
        config: &GameConfig,
        rng: &mut dyn RngCore,
    ) -> Result<f64, SimulationError>;
}

/// Which session evaluator scores a training run.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr, derive_more::Display)]
pub enum EvaluationMode {
    #[default]
    #[display("normal")]
    Normal,
    #[display("predefined")]
    Predefined,
}

impl EvaluationMode {
    /// Returns the evaluator for this mode, playing the right-hand paddle.
    #[must_use]
    pub fn evaluator(self) -> Box<dyn SessionEvaluator> {
        match self {
            Self::Normal => Box::new(NormalSessionEvaluator::default()),
            Self::Predefined => Box::new(PredefinedSessionEvaluator::default()),
        }
    }
}

/// Rejects networks whose parameters could only produce non-finite outputs.
fn ensure_finite(network: &NeuralNetwork) -> Result<(), SimulationError> {
    if network.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::NonFiniteDecision { tick: 0 })
    }
}

fn step(
    state: &mut SimulationState,
    network: &NeuralNetwork,
    viewpoint: Side,
) -> Result<TickEvent, SimulationError> {
    let tick = state.tick();
    state.step(|observed, paddle| {
        network
            .decide_for(viewpoint, observed, paddle)
            .ok_or(SimulationError::NonFiniteDecision { tick })
    })
}

/// Continuous play against the wall with random serves.
#[derive(Debug, Clone, Copy)]
pub struct NormalSessionEvaluator {
    viewpoint: Side,
}

impl Default for NormalSessionEvaluator {
    fn default() -> Self {
        Self::new(Side::Right)
    }
}

impl NormalSessionEvaluator {
    #[must_use]
    pub const fn new(viewpoint: Side) -> Self {
        Self { viewpoint }
    }
}

impl SessionEvaluator for NormalSessionEvaluator {
    fn evaluate(
        &self,
        network: &NeuralNetwork,
        config: &GameConfig,
        rng: &mut dyn RngCore,
    ) -> Result<f64, SimulationError> {
        ensure_finite(network)?;
        let tick_limit = config.tick_limit();
        let mut state = SimulationState::new(Ball::serve(rng), self.viewpoint);
        let mut fitness = 0.0;
        while state.status(tick_limit, config.target_score).is_running() {
            match step(&mut state, network, self.viewpoint)? {
                TickEvent::Nothing => {}
                TickEvent::Returned => fitness += 1.0,
                TickEvent::Missed { gap } => {
                    fitness += miss_bonus(gap);
                    state.serve(Ball::serve(rng));
                }
            }
        }
        Ok(fitness)
    }
}

/// Deterministic sweep over serve heights and angles.
#[derive(Debug, Clone, Copy)]
pub struct PredefinedSessionEvaluator {
    viewpoint: Side,
}

impl Default for PredefinedSessionEvaluator {
    fn default() -> Self {
        Self::new(Side::Right)
    }
}

impl PredefinedSessionEvaluator {
    /// Number of evenly spaced serve heights.
    pub const HEIGHT_STEPS: u32 = 8;
    /// Serve angles in degrees.
    pub const ANGLES_DEGREES: [f64; 7] = [-45.0, -30.0, -15.0, 0.0, 15.0, 30.0, 45.0];
    /// Upper bound on the length of one scenario.
    pub const SCENARIO_TICK_LIMIT: u64 = 1200;

    #[must_use]
    pub const fn new(viewpoint: Side) -> Self {
        Self { viewpoint }
    }

    /// Opening ball of every scenario, in sweep order.
    pub fn scenarios(&self) -> impl Iterator<Item = Ball> + use<> {
        let toward = self.viewpoint;
        let span = court::HEIGHT - 2.0 * Ball::RADIUS;
        (0..Self::HEIGHT_STEPS).flat_map(move |i| {
            let y = Ball::RADIUS + span * (f64::from(i) + 0.5) / f64::from(Self::HEIGHT_STEPS);
            Self::ANGLES_DEGREES
                .into_iter()
                .map(move |angle| Ball::launched(y, angle.to_radians(), toward))
        })
    }
}

impl SessionEvaluator for PredefinedSessionEvaluator {
    fn evaluate(
        &self,
        network: &NeuralNetwork,
        config: &GameConfig,
        _rng: &mut dyn RngCore,
    ) -> Result<f64, SimulationError> {
        ensure_finite(network)?;
        let tick_limit = config.tick_limit().min(Self::SCENARIO_TICK_LIMIT);
        let mut returns = 0;
        for ball in self.scenarios() {
            let mut state = SimulationState::new(ball, self.viewpoint);
            while state.tick() < tick_limit {
                if step(&mut state, network, self.viewpoint)?.is_missed() {
                    break;
                }
            }
            returns += state.returns();
        }
        Ok(f64::from(returns))
    }
}

#[cfg(test)]
mod tests {
    use pongevo_engine::Action;
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::network::{DenseLayer, HIDDEN_SIZE, OUTPUT_SIZE};

    fn short_config() -> GameConfig {
        GameConfig {
            time_limit_minutes: 0.25,
            ..GameConfig::default()
        }
    }

    fn random_network(seed: u64) -> NeuralNetwork {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut network = NeuralNetwork::zeros();
        for layer in network.layers_mut() {
            for w in layer.weights.iter_mut().chain(layer.biases.iter_mut()) {
                *w = rng.random_range(-2.0..2.0);
            }
        }
        network
    }

    /// A network that always holds still.
    fn holding_network() -> NeuralNetwork {
        let mut biases = [0.0; OUTPUT_SIZE];
        biases[Action::Hold as usize] = 1.0;
        NeuralNetwork::new(
            DenseLayer::zeros(),
            DenseLayer::zeros(),
            DenseLayer::new([[0.0; OUTPUT_SIZE]; HIDDEN_SIZE], biases),
        )
    }

    /// Plays a normal session tick by tick on the engine.
    ///
    /// Returns the fitness built from the observed events and the final state.
    fn play_by_hand(
        network: &NeuralNetwork,
        config: &GameConfig,
        seed: u64,
    ) -> (f64, SimulationState) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut state = SimulationState::new(Ball::serve(&mut rng), Side::Right);
        let mut returns = 0.0;
        let mut bonuses = 0.0;
        while state.status(config.tick_limit(), config.target_score).is_running() {
            let event = state
                .step(|observed, paddle| network.decide_for(Side::Right, observed, paddle).ok_or(()))
                .unwrap();
            match event {
                TickEvent::Nothing => {}
                TickEvent::Returned => returns += 1.0,
                TickEvent::Missed { gap } => {
                    let bonus = miss_bonus(gap);
                    assert!((0.0..=MISS_BONUS_WEIGHT).contains(&bonus));
                    bonuses += bonus;
                    state.serve(Ball::serve(&mut rng));
                }
            }
        }
        assert_eq!(returns, f64::from(state.returns()));
        (returns + bonuses, state)
    }

    #[test]
    fn test_miss_bonus() {
        assert_eq!(miss_bonus(0.0), MISS_BONUS_WEIGHT);
        assert_eq!(miss_bonus(MISS_BONUS_RANGE / 2.0), MISS_BONUS_WEIGHT / 2.0);
        assert_eq!(miss_bonus(MISS_BONUS_RANGE), 0.0);
        assert_eq!(miss_bonus(500.0), 0.0);
    }

    #[test]
    fn test_predefined_sweep_is_reproducible() {
        let evaluator = PredefinedSessionEvaluator::default();
        let config = GameConfig::default();
        for seed in 0..4 {
            let network = random_network(seed);
            let first = evaluator
                .evaluate(&network, &config, &mut Pcg32::seed_from_u64(1))
                .unwrap();
            let second = evaluator
                .evaluate(&network, &config, &mut Pcg32::seed_from_u64(2))
                .unwrap();
            assert_eq!(first.to_bits(), second.to_bits());
        }
    }

    #[test]
    fn test_predefined_sweep_covers_grid() {
        let evaluator = PredefinedSessionEvaluator::default();
        let balls = evaluator.scenarios().collect::<Vec<_>>();
        assert_eq!(balls.len(), 8 * 7);
        assert!(balls.iter().all(|b| b.dx > 0.0));
        assert!(
            balls
                .iter()
                .all(|b| b.y > Ball::RADIUS && b.y < court::HEIGHT - Ball::RADIUS)
        );
    }

    #[test]
    fn test_holding_paddle_returns_some_predefined_serves() {
        let evaluator = PredefinedSessionEvaluator::default();
        let fitness = evaluator
            .evaluate(&holding_network(), &GameConfig::default(), &mut rand::rng())
            .unwrap();
        assert!(fitness >= 1.0);
        assert_eq!(fitness.fract(), 0.0);
    }

    #[test]
    fn test_normal_mode_terminates_within_budget() {
        let evaluator = NormalSessionEvaluator::default();
        let config = short_config();
        let mut rng = Pcg32::seed_from_u64(9);
        for seed in 0..4 {
            let fitness = evaluator
                .evaluate(&random_network(seed), &config, &mut rng)
                .unwrap();
            assert!(fitness.is_finite());
            assert!(fitness >= 0.0);
        }
    }

    #[test]
    fn test_normal_mode_is_deterministic_for_a_seed() {
        let evaluator = NormalSessionEvaluator::default();
        let config = short_config();
        let network = random_network(5);
        let a = evaluator
            .evaluate(&network, &config, &mut Pcg32::seed_from_u64(42))
            .unwrap();
        let b = evaluator
            .evaluate(&network, &config, &mut Pcg32::seed_from_u64(42))
            .unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_normal_mode_ends_on_target_score() {
        let evaluator = NormalSessionEvaluator::default();
        let config = GameConfig {
            time_limit_minutes: 5.0,
            target_score: 1,
            ..GameConfig::default()
        };
        // All-zero outputs always pick the first action, so the paddle sits
        // against one edge of the court and most serves get past it.
        let network = NeuralNetwork::zeros();
        let mut ended_early = 0;
        for seed in 0..8 {
            let (expected, state) = play_by_hand(&network, &config, seed);
            let fitness = evaluator
                .evaluate(&network, &config, &mut Pcg32::seed_from_u64(seed))
                .unwrap();
            assert_eq!(fitness.to_bits(), expected.to_bits());
            assert!(fitness - f64::from(state.returns()) <= MISS_BONUS_WEIGHT);
            if state.status(config.tick_limit(), config.target_score).is_target_score_reached() {
                assert_eq!(state.misses(), 1);
                assert!(state.tick() < config.tick_limit());
                ended_early += 1;
            }
        }
        assert!(ended_early > 0);
    }

    #[test]
    fn test_normal_mode_reserves_after_each_miss() {
        let evaluator = NormalSessionEvaluator::default();
        let config = GameConfig {
            time_limit_minutes: 5.0,
            target_score: 3,
            ..GameConfig::default()
        };
        let network = NeuralNetwork::zeros();
        let mut reached = 0;
        for seed in 0..8 {
            let (expected, state) = play_by_hand(&network, &config, seed);
            let fitness = evaluator
                .evaluate(&network, &config, &mut Pcg32::seed_from_u64(seed))
                .unwrap();
            assert_eq!(fitness.to_bits(), expected.to_bits());
            let bonuses = fitness - f64::from(state.returns());
            assert!((0.0..=3.0 * MISS_BONUS_WEIGHT).contains(&bonuses));
            if state.misses() == 3 {
                assert!(state.tick() < config.tick_limit());
                reached += 1;
            }
        }
        assert!(reached > 0);
    }

    #[test]
    fn test_infinite_hidden_weight_fails() {
        let mut network = holding_network();
        let [hidden1, _, _] = network.layers_mut();
        hidden1.weights[0] = f64::INFINITY;
        for mode in [EvaluationMode::Normal, EvaluationMode::Predefined] {
            let result = mode
                .evaluator()
                .evaluate(&network, &short_config(), &mut rand::rng());
            assert_eq!(result, Err(SimulationError::NonFiniteDecision { tick: 0 }));
        }
    }

    #[test]
    fn test_non_finite_network_fails() {
        let mut network = NeuralNetwork::zeros();
        let [_, _, output] = network.layers_mut();
        output.biases[0] = f64::NAN;
        for mode in [EvaluationMode::Normal, EvaluationMode::Predefined] {
            let result = mode
                .evaluator()
                .evaluate(&network, &short_config(), &mut rand::rng());
            assert_eq!(result, Err(SimulationError::NonFiniteDecision { tick: 0 }));
        }
    }

    #[test]
    fn test_evaluation_mode_from_str() {
        assert_eq!("Normal".parse::<EvaluationMode>().unwrap(), EvaluationMode::Normal);
        assert_eq!(
            "predefined".parse::<EvaluationMode>().unwrap(),
            EvaluationMode::Predefined
        );
        assert!("sweep".parse::<EvaluationMode>().is_err());
    }
}
