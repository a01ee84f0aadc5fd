//! Backtracking solver configuration.

use crate::fitness::PenaltyWeights;

/// Configuration for [`BacktrackSolver`](super::BacktrackSolver).
///
/// # Examples
///
/// ```
/// use u_timetable::csp::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_max_nodes(50_000)
///     .with_time_limit_ms(2_000)
///     .with_num_workers(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum number of assignments tried before giving up.
    pub max_nodes: u64,

    /// Optional wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,

    /// Number of workers the root choice point is split across.
    ///
    /// Each worker searches a disjoint share of the root variable's values
    /// on its own copy of the occupancy index. Values above 1 need the
    /// `parallel` feature; without it the search runs on one thread.
    pub num_workers: usize,

    /// Weights of the soft cost used for value ordering and for the final
    /// report.
    pub weights: PenaltyWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1_000_000,
            time_limit_ms: None,
            num_workers: 1,
            weights: PenaltyWeights::default(),
        }
    }
}

impl SolverConfig {
    /// Sets the node budget.
    pub fn with_max_nodes(mut self, n: u64) -> Self {
        self.max_nodes = n;
        self
    }

    /// Sets the wall-clock limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the number of root workers.
    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Sets the penalty weights.
    pub fn with_weights(mut self, weights: PenaltyWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_nodes == 0 {
            return Err("max_nodes must be at least 1".into());
        }
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.max_nodes, 1_000_000);
        assert!(config.time_limit_ms.is_none());
        assert_eq!(config.num_workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        assert!(SolverConfig::default().with_max_nodes(0).validate().is_err());
        assert!(SolverConfig::default().with_num_workers(0).validate().is_err());
        assert!(SolverConfig::default()
            .with_time_limit_ms(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_checks_weights() {
        let config =
            SolverConfig::default().with_weights(PenaltyWeights::default().with_unmet_hours(0));
        assert!(config.validate().is_err());
    }
}
