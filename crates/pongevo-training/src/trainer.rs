//! The training loop.
//!
//! Each generation is bred by the [`PopulationEvolver`], evaluated in
//! parallel on a dedicated rayon pool and cut down to its survivors. The
//! survivors become the next generation's elite and are checkpointed to the
//! [`ArtifactStore`] when one is configured.
//!
//! # Parallel Evaluation
//!
//! Every agent becomes an independent task carrying its ordinal, a copy of its
//! network and a seed for its own [`Pcg32`]. Tasks finish in any order; their
//! results are written back by ordinal, so a generation's outcome depends only
//! on the seeds and not on scheduling.
//!
//! A task that fails (simulation error, non-finite fitness or panic) gets
//! [`FAILED_FITNESS`] and is logged; the generation carries on.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    thread,
};

use chrono::Utc;
use pongevo_engine::{ConfigurationError, GameConfig};
use pongevo_evaluator::{
    network::NeuralNetwork,
    session_evaluator::{SessionEvaluator, SimulationError},
};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder, prelude::*};

use crate::{
    artifact::ArtifactStore,
    genetic::{Agent, Population, PopulationEvolver},
    stats::FitnessStats,
};

/// Fitness assigned to agents whose evaluation failed.
pub const FAILED_FITNESS: f64 = -1.0;

/// Default worker count: one less than the available cores, at least one.
#[must_use]
pub fn default_worker_count() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get().saturating_sub(1).max(1))
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("invalid game configuration")]
    Configuration(ConfigurationError),
    #[display("failed to start worker pool")]
    WorkerPool(ThreadPoolBuildError),
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum WorkerEvaluationError {
    #[display("simulation failed")]
    Simulation(SimulationError),
    #[display("fitness {fitness} is not finite")]
    NonFiniteFitness { fitness: f64 },
    #[display("evaluation panicked: {message}")]
    Panicked { message: String },
}

/// Where checkpoints go and which model seeds a warm start.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub store: ArtifactStore,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct TrainerOptions {
    /// Worker threads; [`default_worker_count`] when `None`.
    pub workers: Option<usize>,
    /// Ignore any stored population and start from random agents.
    pub force_random: bool,
    pub checkpoint: Option<Checkpoint>,
    pub evolver: PopulationEvolver,
}

/// Outcome of one evaluated generation.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub generation: usize,
    pub fitness: FitnessStats,
    /// Agents whose evaluation failed.
    pub failures: usize,
    pub survivors: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub generations: Vec<GenerationSummary>,
    /// Survivors of the final generation, best first.
    pub elite: Vec<Agent>,
}

impl TrainingReport {
    #[must_use]
    pub fn best(&self) -> Option<&Agent> {
        self.elite.first()
    }
}

#[derive(Debug)]
struct EvaluationTask {
    ordinal: usize,
    network: NeuralNetwork,
    seed: u64,
}

impl EvaluationTask {
    fn run(
        self,
        evaluator: &dyn SessionEvaluator,
        config: &GameConfig,
    ) -> (usize, Result<f64, WorkerEvaluationError>) {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            evaluator.evaluate(&self.network, config, &mut rng)
        }));
        let result = match result {
            Ok(Ok(fitness)) if fitness.is_finite() => Ok(fitness),
            Ok(Ok(fitness)) => Err(WorkerEvaluationError::NonFiniteFitness { fitness }),
            Ok(Err(e)) => Err(WorkerEvaluationError::Simulation(e)),
            Err(payload) => Err(WorkerEvaluationError::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        };
        (self.ordinal, result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Runs the genetic algorithm against one session evaluator.
#[derive(Debug)]
pub struct Trainer<'a> {
    config: GameConfig,
    evaluator: &'a dyn SessionEvaluator,
    options: TrainerOptions,
    pool: ThreadPool,
}

impl<'a> Trainer<'a> {
    /// Validates `config` and starts the worker pool.
    pub fn new(
        config: GameConfig,
        evaluator: &'a dyn SessionEvaluator,
        options: TrainerOptions,
    ) -> Result<Self, TrainingError> {
        config.validate()?;
        let workers = options.workers.unwrap_or_else(default_worker_count).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pongevo-worker-{i}"))
            .build()?;
        tracing::debug!(workers, "worker pool started");
        Ok(Self {
            config,
            evaluator,
            options,
            pool,
        })
    }

    /// Runs `nb_generation` generations and returns their summaries.
    pub fn run<R>(&self, rng: &mut R) -> TrainingReport
    where
        R: Rng + ?Sized,
    {
        let GameConfig {
            nb_generation,
            species_count,
            ..
        } = self.config;
        let mut elite = self.initial_elite();
        let mut generations = Vec::with_capacity(nb_generation);

        for generation in 0..nb_generation {
            let mut population = self
                .options
                .evolver
                .next_generation(&elite, species_count, rng);
            assert_eq!(population.len(), species_count);

            let failures = self.evaluate(&mut population, rng);
            let Some(fitness) = population.compute_fitness_stats() else {
                break;
            };
            elite = self.options.evolver.select_survivors(population);

            tracing::info!(
                generation,
                best = fitness.max,
                mean = fitness.mean,
                median = fitness.median,
                worst = fitness.min,
                std_dev = fitness.std_dev,
                failures,
                survivors = elite.len(),
                "generation evaluated"
            );
            self.save_checkpoint(&elite);

            generations.push(GenerationSummary {
                generation,
                fitness,
                failures,
                survivors: elite.len(),
            });
        }

        TrainingReport { generations, elite }
    }

    fn initial_elite(&self) -> Vec<Agent> {
        let Some(checkpoint) = &self.options.checkpoint else {
            return vec![];
        };
        if self.options.force_random {
            tracing::info!(name = %checkpoint.name, "ignoring stored model, starting from random agents");
            return vec![];
        }
        match checkpoint.store.load(&checkpoint.name) {
            Ok(Some(agents)) => {
                tracing::info!(name = %checkpoint.name, agents = agents.len(), "resuming from stored model");
                agents
            }
            Ok(None) => {
                tracing::info!(name = %checkpoint.name, "no stored model, starting from random agents");
                vec![]
            }
            Err(e) => {
                tracing::warn!(name = %checkpoint.name, error = %e, "stored model unreadable, starting from random agents");
                vec![]
            }
        }
    }

    /// Evaluates every agent and records its fitness. Returns the number of
    /// failed evaluations.
    fn evaluate<R>(&self, population: &mut Population, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let tasks = population
            .agents()
            .iter()
            .map(|agent| EvaluationTask {
                ordinal: agent.ordinal(),
                network: agent.network().clone(),
                seed: rng.random(),
            })
            .collect::<Vec<_>>();

        let evaluator = self.evaluator;
        let config = &self.config;
        let results = self.pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| task.run(evaluator, config))
                .collect::<Vec<_>>()
        });

        let mut failures = 0;
        for (ordinal, result) in results {
            let fitness = result.unwrap_or_else(|e| {
                tracing::warn!(ordinal, error = %e, "agent evaluation failed");
                failures += 1;
                FAILED_FITNESS
            });
            tracing::trace!(ordinal, fitness, "agent evaluated");
            if !population.record_fitness(ordinal, fitness) {
                tracing::warn!(ordinal, fitness, "no agent with this ordinal, result dropped");
            }
        }
        failures
    }

    fn save_checkpoint(&self, elite: &[Agent]) {
        let Some(checkpoint) = &self.options.checkpoint else {
            return;
        };
        match checkpoint.store.save(&checkpoint.name, elite, Utc::now()) {
            Ok(path) => tracing::debug!(path = %path.display(), "checkpoint saved"),
            Err(e) => tracing::warn!(error = %e, "failed to save checkpoint"),
        }
    }
}
