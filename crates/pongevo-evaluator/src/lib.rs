//! Agent policy and fitness evaluation.
//!
//! This crate implements two levels of the evaluator architecture:
//!
//! 1. **Inference** ([`network`], [`observation`]) - A fixed-topology feedforward
//!    network turns what the agent sees of the court into a paddle [`Action`].
//!
//! 2. **Session Evaluation** ([`session_evaluator`]) - Plays a simulated game with
//!    a network in control of the paddle and turns the result into a fitness
//!    score for the genetic algorithm.
//!
//! # Architecture
//!
//! ```text
//! Session Evaluation (fitness for training)
//!     ↓ drives
//! SimulationState (pongevo-engine)
//!     ↓ asks every tick
//! NeuralNetwork::decide (observation → action)
//! ```
//!
//! # Example
//!
//! ```
//! use pongevo_engine::GameConfig;
//! use pongevo_evaluator::{
//!     network::NeuralNetwork,
//!     session_evaluator::{PredefinedSessionEvaluator, SessionEvaluator},
//! };
//!
//! let network = NeuralNetwork::zeros();
//! let evaluator = PredefinedSessionEvaluator::default();
//! let fitness = evaluator
//!     .evaluate(&network, &GameConfig::default(), &mut rand::rng())
//!     .unwrap();
//! assert!(fitness >= 0.0);
//! ```
//!
//! [`Action`]: pongevo_engine::Action

pub mod network;
pub mod observation;
pub mod session_evaluator;
