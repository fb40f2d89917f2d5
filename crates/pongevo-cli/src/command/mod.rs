use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pongevo_engine::GameConfig;
use pongevo_training::artifact::ArtifactStore;

use crate::util;

use self::{benchmark::BenchmarkArg, export::ExportArg, train::TrainArg};

mod benchmark;
mod export;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve agents with the genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Score the best stored agent of a model
    Benchmark(#[clap(flatten)] BenchmarkArg),
    /// Write the best stored agent of a model as JSON
    Export(#[clap(flatten)] ExportArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Benchmark(arg) => benchmark::run(&arg)?,
        Mode::Export(arg) => export::run(&arg)?,
    }
    Ok(())
}

/// Selects a model artifact.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ModelArg {
    /// Model name; stored as `<model-dir>/<name>.json`
    #[arg(long, default_value = "default")]
    name: String,
    /// Directory holding model artifacts
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,
}

impl ModelArg {
    pub(crate) fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.model_dir)
    }
}

/// Game settings: an optional JSON file, overridden by individual flags.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct GameConfigArg {
    /// JSON file with game settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of generations
    #[arg(long)]
    generations: Option<usize>,
    /// Number of agents per generation
    #[arg(long)]
    species: Option<usize>,
    /// Simulated minutes per evaluation session
    #[arg(long)]
    time_limit: Option<f64>,
    /// Misses that end an evaluation session
    #[arg(long)]
    target_score: Option<u32>,
}

impl GameConfigArg {
    pub(crate) fn load(&self) -> anyhow::Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("game config", path)?,
            None => GameConfig::default(),
        };
        if let Some(n) = self.generations {
            config.nb_generation = n;
        }
        if let Some(n) = self.species {
            config.species_count = n;
        }
        if let Some(minutes) = self.time_limit {
            config.time_limit_minutes = minutes;
        }
        if let Some(score) = self.target_score {
            config.target_score = score;
        }
        config.validate().context("Invalid game configuration")?;
        Ok(config)
    }
}
