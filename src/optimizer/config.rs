//! Optimizer configuration.

use crate::fitness::PenaltyWeights;
use crate::ga::GaConfig;
use crate::model::Problem;

/// Configuration for [`optimize`](super::optimize).
///
/// Every child produced by the GA goes through the per-cell mutation pass,
/// so the embedded [`GaConfig::mutation_rate`] defaults to 1.0 and
/// [`cell_mutation_rate`](Self::cell_mutation_rate) controls how much a child
/// actually changes.
///
/// # Examples
///
/// ```
/// use u_timetable::optimizer::OptimizerConfig;
///
/// let config = OptimizerConfig::default()
///     .with_seed(42)
///     .with_cell_mutation_rate(0.1);
/// assert_eq!(config.ga.seed, Some(42));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Evolutionary loop parameters.
    pub ga: GaConfig,

    /// Probability that a mutation is attempted on each cell of a child.
    pub cell_mutation_rate: f64,

    /// Weights of the fitness penalty.
    pub weights: PenaltyWeights,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            ga: GaConfig::default().with_mutation_rate(1.0),
            cell_mutation_rate: 0.05,
            weights: PenaltyWeights::default(),
        }
    }
}

impl OptimizerConfig {
    /// Sizes the GA by the number of weekly occurrences to place.
    pub fn for_problem(problem: &Problem) -> Self {
        Self {
            ga: GaConfig::for_occurrences(problem.total_occurrences()).with_mutation_rate(1.0),
            ..Self::default()
        }
    }

    /// Replaces the GA parameters.
    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the per-cell mutation probability.
    pub fn with_cell_mutation_rate(mut self, rate: f64) -> Self {
        self.cell_mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the penalty weights.
    pub fn with_weights(mut self, weights: PenaltyWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Seeds the GA for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ga.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.ga.validate()?;
        if !(0.0..=1.0).contains(&self.cell_mutation_rate) {
            return Err("cell_mutation_rate must be within 0.0..=1.0".into());
        }
        self.weights.validate()
    }
}
