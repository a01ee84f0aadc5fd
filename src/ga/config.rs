//! Parameters of the evolutionary loop.

use super::selection::Selection;

/// Genetic Algorithm parameters.
///
/// ```
/// use u_timetable::ga::{GaConfig, Selection};
///
/// let config = GaConfig::default();
/// assert_eq!(config.selection, Selection::Roulette);
/// assert_eq!(config.elite_count(), 10);
///
/// let small = GaConfig::default()
///     .with_population_size(25)
///     .with_elite_ratio(0.1);
/// assert_eq!(small.elite_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub population_size: usize,
    pub max_generations: usize,
    /// Parent selection; roulette over inverse penalties by default.
    pub selection: Selection,
    /// Share of the population copied unchanged into the next generation,
    /// rounded up (see [`GaConfig::elite_count`]).
    pub elite_ratio: f64,
    /// Chance that a parent pair is recombined rather than cloned.
    pub crossover_rate: f64,
    /// Chance that a child goes through the mutation step.
    pub mutation_rate: f64,
    /// Generations without improvement before the run stops; 0 disables.
    pub stagnation_limit: usize,
    /// Relative improvement `|old - new| / |old|` below which a new best
    /// still counts as stagnating. 0.0 counts any improvement.
    pub convergence_threshold: f64,
    /// Evaluate and breed on the rayon pool. Has no effect without the
    /// `parallel` feature; a seeded run gives the same result either way.
    pub parallel: bool,
    /// `None` draws a seed from the OS.
    pub seed: Option<u64>,
    /// Wall-clock budget, checked once per generation.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            selection: Selection::default(),
            elite_ratio: 0.1,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            stagnation_limit: 50,
            convergence_threshold: 0.0,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    /// Sizing for a timetable with `occurrences` weekly sessions to place.
    ///
    /// | occurrences | population | generations | stagnation | time limit |
    /// |---|---|---|---|---|
    /// | < 50 | 50 | 100 | 20 | 10 s |
    /// | < 200 | 100 | 300 | 50 | 30 s |
    /// | otherwise | 150 | 500 | 80 | 60 s |
    pub fn for_occurrences(occurrences: usize) -> Self {
        let (population_size, max_generations, stagnation_limit, seconds) = match occurrences {
            0..=49 => (50, 100, 20, 10),
            50..=199 => (100, 300, 50, 30),
            _ => (150, 500, 80, 60),
        };
        Self {
            population_size,
            max_generations,
            stagnation_limit,
            time_limit_ms: Some(seconds * 1_000),
            ..Self::default()
        }
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Clamped to `0.0..=1.0`, as are the other rates.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold.max(0.0);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// `ceil(population_size × elite_ratio)`.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio).ceil() as usize
    }

    /// Checks the parameters before a run.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.elite_count() >= self.population_size {
            return Err("elite_ratio leaves no room for children".into());
        }
        if self.convergence_threshold < 0.0 {
            return Err("convergence_threshold must be non-negative".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        if self.selection == Selection::Tournament(0) {
            return Err("tournament size must be at least 1".into());
        }
        Ok(())
    }
}
