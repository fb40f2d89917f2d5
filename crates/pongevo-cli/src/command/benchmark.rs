use anyhow::Context;
use pongevo_evaluator::session_evaluator::{
    NormalSessionEvaluator, PredefinedSessionEvaluator, SessionEvaluator,
};
use pongevo_training::stats::FitnessStats;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use super::{GameConfigArg, ModelArg};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BenchmarkArg {
    #[clap(flatten)]
    model: ModelArg,
    #[clap(flatten)]
    game: GameConfigArg,
    /// Randomly served sessions to play in addition to the predefined sweep
    #[arg(long, default_value_t = 0)]
    sessions: usize,
    /// Seed for the randomly served sessions
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &BenchmarkArg) -> anyhow::Result<()> {
    let BenchmarkArg {
        model,
        game,
        sessions,
        seed,
    } = arg;
    let config = game.load()?;
    let record = model.store().best_agent(&model.name);
    let network = record
        .to_network()
        .with_context(|| format!("Model {:?} has an invalid network", model.name))?;
    let (seed, mut rng) = util::seeded_rng(*seed);

    let sweep = PredefinedSessionEvaluator::default()
        .evaluate(&network, &config, &mut rng)
        .context("Predefined sweep failed")?;

    eprintln!("Benchmark of model {:?}:", model.name);
    eprintln!("  Stored fitness:  {:.3}", record.fitness);
    eprintln!(
        "  Predefined:      {sweep} returns over {} serves",
        PredefinedSessionEvaluator::default().scenarios().count()
    );

    if *sessions > 0 {
        let evaluator = NormalSessionEvaluator::default();
        let scores = (0..*sessions)
            .map(|_| {
                let mut session_rng = Pcg32::seed_from_u64(rng.random());
                evaluator.evaluate(&network, &config, &mut session_rng)
            })
            .collect::<Result<Vec<_>, _>>()
            .context("Normal session failed")?;
        let stats = FitnessStats::new(scores).context("No sessions played")?;
        eprintln!("  Normal sessions: {sessions} (seed {seed})");
        eprintln!("    Min:    {:.3}", stats.min);
        eprintln!("    Max:    {:.3}", stats.max);
        eprintln!("    Mean:   {:.3}", stats.mean);
        eprintln!("    Median: {:.3}", stats.median);
        eprintln!("    StdDev: {:.3}", stats.std_dev);
    }
    Ok(())
}
