//! Engine configuration: hard caps and tuning for the bounded algorithms.
//!
//! Every field has a default, and `#[serde(default)]` lets a config file
//! override only the values it names.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Largest `max_hanoi_disks` a config may set; the move list has `2^n - 1` entries.
pub const HANOI_DISKS_CEILING: u32 = 25;
/// Largest `max_game_depth` a config may set; Connect-4 branches sevenfold per ply.
pub const GAME_DEPTH_CEILING: u32 = 10;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: Limits,
    pub annealing: AnnealingSchedule,
    pub genetic: GeneticParams,
}

/// Hard ceilings that keep a single request from running indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Steps recorded per trace. Later steps are counted but not stored.
    pub max_trace_steps: usize,
    /// Move cap for Hill Climbing and Simulated Annealing.
    pub max_local_iterations: usize,
    /// Expansion cap for the 8-puzzle. Larger than 9!/2, so the default is exhaustive.
    pub max_puzzle_states: usize,
    /// Candidate attempts allowed for N-Queens and Sudoku backtracking.
    pub max_backtrack_nodes: u64,
    /// Deepest Connect-4 search a request may ask for.
    pub max_game_depth: u32,
    pub max_hanoi_disks: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_trace_steps: 100_000,
            max_local_iterations: 1_000,
            max_puzzle_states: 200_000,
            max_backtrack_nodes: 20_000_000,
            max_game_depth: 8,
            max_hanoi_disks: 20,
        }
    }
}

/// Geometric cooling schedule for Simulated Annealing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingSchedule {
    pub initial_temperature: f64,
    /// Multiplier applied to the temperature after every iteration.
    pub cooling_rate: f64,
    /// The walk stops once the temperature drops below this.
    pub min_temperature: f64,
}

impl Default for AnnealingSchedule {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            cooling_rate: 0.95,
            min_temperature: 0.01,
        }
    }
}

/// Population parameters for the Genetic Algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    pub population_size: usize,
    /// Hard generation cap.
    pub generations: usize,
    pub mutation_rate: f64,
    /// Best individuals copied unchanged into the next generation.
    pub elite_size: usize,
    pub tournament_size: usize,
    /// Probability that path construction takes the greedy neighbor.
    pub greedy_bias: f64,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            elite_size: 5,
            tournament_size: 3,
            greedy_bias: 0.7,
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON configuration and validates it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)
            .map_err(|e| EngineError::invalid(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.max_local_iterations == 0 {
            return Err(EngineError::invalid("max_local_iterations must be positive"));
        }
        if limits.max_puzzle_states == 0 || limits.max_backtrack_nodes == 0 {
            return Err(EngineError::invalid("puzzle caps must be positive"));
        }
        if !(1..=GAME_DEPTH_CEILING).contains(&limits.max_game_depth) {
            return Err(EngineError::invalid(format!(
                "max_game_depth must be in 1..={GAME_DEPTH_CEILING}"
            )));
        }
        if !(1..=HANOI_DISKS_CEILING).contains(&limits.max_hanoi_disks) {
            return Err(EngineError::invalid(format!(
                "max_hanoi_disks must be in 1..={HANOI_DISKS_CEILING}"
            )));
        }

        let annealing = &self.annealing;
        if !(annealing.cooling_rate > 0.0 && annealing.cooling_rate < 1.0) {
            return Err(EngineError::invalid("cooling_rate must be in (0, 1)"));
        }
        if annealing.min_temperature <= 0.0
            || annealing.initial_temperature <= annealing.min_temperature
        {
            return Err(EngineError::invalid(
                "temperatures must satisfy 0 < min_temperature < initial_temperature",
            ));
        }

        let genetic = &self.genetic;
        if genetic.population_size == 0 || genetic.generations == 0 {
            return Err(EngineError::invalid("population_size and generations must be positive"));
        }
        if genetic.tournament_size == 0 || genetic.tournament_size > genetic.population_size {
            return Err(EngineError::invalid(
                "tournament_size must be in 1..=population_size",
            ));
        }
        if genetic.elite_size > genetic.population_size {
            return Err(EngineError::invalid("elite_size exceeds population_size"));
        }
        for (name, p) in [
            ("mutation_rate", genetic.mutation_rate),
            ("greedy_bias", genetic.greedy_bias),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EngineError::invalid(format!("{name} must be in [0, 1]")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config =
            EngineConfig::from_json(r#"{"genetic": {"generations": 10}, "limits": {"max_trace_steps": 5}}"#)
                .unwrap();
        assert_eq!(config.genetic.generations, 10);
        assert_eq!(config.genetic.population_size, 50);
        assert_eq!(config.limits.max_trace_steps, 5);
        assert_eq!(config.annealing, AnnealingSchedule::default());
    }

    #[test]
    fn test_rejects_bad_cooling_rate() {
        let err = EngineConfig::from_json(r#"{"annealing": {"cooling_rate": 1.5}}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_oversized_tournament() {
        let mut config = EngineConfig::default();
        config.genetic.tournament_size = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_game_limits_have_ceilings() {
        let err = EngineConfig::from_json(r#"{"limits": {"max_hanoi_disks": 40}}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        let config = EngineConfig::from_json(r#"{"limits": {"max_hanoi_disks": 25}}"#).unwrap();
        assert_eq!(config.limits.max_hanoi_disks, HANOI_DISKS_CEILING);

        assert!(EngineConfig::from_json(r#"{"limits": {"max_game_depth": 11}}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"limits": {"max_game_depth": 0}}"#).is_err());
    }
}
