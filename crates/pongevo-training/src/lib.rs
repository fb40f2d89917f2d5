//! Neuroevolution of paddle-ball agents.
//!
//! This crate evolves the weights of the
//! [`NeuralNetwork`](pongevo_evaluator::network::NeuralNetwork) policy with a
//! simple genetic algorithm. Fitness comes from a
//! [`SessionEvaluator`](pongevo_evaluator::session_evaluator::SessionEvaluator).
//!
//! # How Training Works
//!
//! 1. **Seed** - Load the stored population of a model, or start from random
//!    agents
//! 2. **Breed** - Keep the elite, add averaged and mutated children, fill the
//!    rest with random agents
//! 3. **Evaluate** - Every agent plays one session on the worker pool
//! 4. **Select** - The best agents survive as the next elite
//! 5. **Checkpoint** - The survivors are written to the model artifact
//! 6. **Repeat** - Continue for the configured number of generations
//!
//! # Architecture
//!
//! ```text
//! ArtifactStore ──load──→ elite ──breed──→ Population
//!       ↑                   ↑                  │ evaluate (rayon)
//!       └────checkpoint─────┴──────select──────┘
//! ```
//!
//! # Modules
//!
//! - [`genetic`] - Agents, populations, breeding and selection
//! - [`weights`] - Element-wise operators on parameter slices
//! - [`trainer`] - The parallel training loop
//! - [`artifact`] - JSON persistence of populations
//! - [`stats`] - Fitness summaries
//!
//! # Example
//!
//! ```
//! use pongevo_engine::GameConfig;
//! use pongevo_evaluator::session_evaluator::PredefinedSessionEvaluator;
//! use pongevo_training::trainer::{Trainer, TrainerOptions};
//!
//! let config = GameConfig {
//!     nb_generation: 1,
//!     species_count: 4,
//!     ..GameConfig::default()
//! };
//! let evaluator = PredefinedSessionEvaluator::default();
//! let trainer = Trainer::new(config, &evaluator, TrainerOptions::default())?;
//! let report = trainer.run(&mut rand::rng());
//! assert_eq!(report.generations.len(), 1);
//! assert!(report.best().is_some());
//! # Ok::<(), pongevo_training::trainer::TrainingError>(())
//! ```
//!
//! # Current Limitations
//!
//! - **Fixed topology**: Only weights evolve; the network shape is fixed
//! - **Single evaluation**: In normal mode each agent plays one randomly
//!   served session per generation, so fitness is noisy
//! - **No diversity control**: Beyond the random fill, nothing keeps the
//!   population from converging on one strategy

pub mod artifact;
pub mod genetic;
pub mod stats;
pub mod trainer;
pub mod weights;
