use anyhow::Context;
use pongevo_evaluator::session_evaluator::EvaluationMode;
use pongevo_training::{
    genetic::PopulationEvolver,
    trainer::{Checkpoint, Trainer, TrainerOptions},
};

use super::{GameConfigArg, ModelArg};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[clap(flatten)]
    model: ModelArg,
    #[clap(flatten)]
    game: GameConfigArg,
    /// Fitness function: `normal` or `predefined`
    #[arg(long, default_value_t = EvaluationMode::Normal)]
    mode: EvaluationMode,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads (default: available cores minus one)
    #[arg(long)]
    workers: Option<usize>,
    /// Start from random agents even if the model exists
    #[arg(long)]
    force_random: bool,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        model,
        game,
        mode,
        seed,
        workers,
        force_random,
    } = arg;
    let config = game.load()?;
    let evaluator = mode.evaluator();
    let store = model.store();
    let options = TrainerOptions {
        workers: *workers,
        force_random: *force_random,
        checkpoint: Some(Checkpoint {
            store: store.clone(),
            name: model.name.clone(),
        }),
        evolver: PopulationEvolver::default(),
    };
    let trainer =
        Trainer::new(config, &*evaluator, options).context("Failed to start training")?;
    let (seed, mut rng) = util::seeded_rng(*seed);

    eprintln!("Training model {:?} ({mode} mode):", model.name);
    eprintln!("  Generations:  {}", config.nb_generation);
    eprintln!("  Species:      {}", config.species_count);
    eprintln!("  Time limit:   {} min ({} ticks)", config.time_limit_minutes, config.tick_limit());
    eprintln!("  Target score: {}", config.target_score);
    eprintln!("  Seed:         {seed}");

    let report = trainer.run(&mut rng);

    eprintln!();
    eprintln!("Fitness by generation:");
    eprintln!("  {:>4}  {:>9}  {:>9}  {:>9}  {:>9}  {:>4}", "gen", "best", "mean", "median", "worst", "fail");
    for summary in &report.generations {
        let stats = &summary.fitness;
        eprintln!(
            "  {:>4}  {:>9.3}  {:>9.3}  {:>9.3}  {:>9.3}  {:>4}",
            summary.generation, stats.max, stats.mean, stats.median, stats.min, summary.failures
        );
    }

    let best = report.best().context("Training produced no agents")?;
    eprintln!();
    eprintln!("Training completed");
    eprintln!("  Path:          {}", store.path(&model.name).display());
    eprintln!("  Survivors:     {}", report.elite.len());
    eprintln!("  Best fitness:  {:.3}", best.fitness());

    Ok(())
}
