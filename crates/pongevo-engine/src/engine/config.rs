use serde::{Deserialize, Serialize};

/// Simulated ticks in one minute of play (60 ticks per second).
pub const TICKS_PER_MINUTE: f64 = 3600.0;

/// Parameters of a training run.
///
/// Read by both the simulator (tick budget, target score) and the training
/// loop (generation and species counts). Missing fields fall back to
/// [`GameConfig::default`] when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of generations to train.
    pub nb_generation: usize,
    /// Number of agents in every generation.
    pub species_count: usize,
    /// Simulated play time per evaluation, in minutes.
    pub time_limit_minutes: f64,
    /// An evaluation ends once the opponent has scored this many points.
    pub target_score: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            nb_generation: 50,
            species_count: 50,
            time_limit_minutes: 1.0,
            target_score: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigurationError {
    #[display("generation count must be positive")]
    NoGeneration,
    #[display("species count must be positive")]
    NoSpecies,
    #[display("time limit must be a positive number of minutes worth at least one tick, got {minutes}")]
    InvalidTimeLimit { minutes: f64 },
    #[display("target score must be positive")]
    NoTargetScore,
}

impl GameConfig {
    /// Tick budget of a single evaluation.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tick_limit(&self) -> u64 {
        (self.time_limit_minutes * TICKS_PER_MINUTE).round() as u64
    }

    /// Checks every value before a run starts.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.nb_generation == 0 {
            return Err(ConfigurationError::NoGeneration);
        }
        if self.species_count == 0 {
            return Err(ConfigurationError::NoSpecies);
        }
        if !self.time_limit_minutes.is_finite()
            || self.time_limit_minutes <= 0.0
            || self.tick_limit() == 0
        {
            return Err(ConfigurationError::InvalidTimeLimit {
                minutes: self.time_limit_minutes,
            });
        }
        if self.target_score == 0 {
            return Err(ConfigurationError::NoTargetScore);
        }
        Ok(())
    }
}
