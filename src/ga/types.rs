//! Core trait definitions for the GA framework.
//!
//! [`Individual`] and [`GaProblem`] form the contract between the generic
//! GA engine and the problem it evolves, timetabling in this crate.

use rand::Rng;

/// Marker trait for fitness values.
///
/// Fitness must support comparison and be cheaply copyable.
/// Lower fitness is considered better (minimization).
///
/// Built-in implementations exist for `u64` (integer penalties) and `f64`.
pub trait Fitness: PartialOrd + Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Returns a value representing the worst possible fitness.
    ///
    /// Used for unevaluated individuals.
    fn worst() -> Self;

    /// Converts the fitness to `f64` for statistics and selection weights.
    fn to_f64(self) -> f64;
}

impl Fitness for u64 {
    fn worst() -> Self {
        u64::MAX
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Fitness for f64 {
    fn worst() -> Self {
        f64::INFINITY
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// A candidate solution in the GA population.
///
/// Individuals cache their own fitness. The runner calls
/// [`GaProblem::evaluate`] only for individuals whose cache is stale
/// ([`is_evaluated`](Individual::is_evaluated) returns `false`) and stores
/// the result via [`set_fitness`](Individual::set_fitness).
pub trait Individual: Clone + Send + Sync {
    /// The fitness type. Must implement [`Fitness`].
    type Fitness: Fitness;

    /// Returns the cached fitness, or [`Fitness::worst`] when unevaluated.
    fn fitness(&self) -> Self::Fitness;

    /// Stores an evaluated fitness.
    fn set_fitness(&mut self, fitness: Self::Fitness);

    /// Whether the cached fitness is current.
    ///
    /// The default re-evaluates every individual every generation.
    fn is_evaluated(&self) -> bool {
        false
    }
}

/// Defines a GA optimization problem.
///
/// 1. **Initialization**: how to create random individuals
/// 2. **Evaluation**: how to compute fitness
/// 3. **Crossover**: how to recombine two parents
/// 4. **Mutation**: how to perturb an individual
///
/// # Thread Safety
///
/// `GaProblem` must be `Send + Sync` because the runner may evaluate and
/// breed individuals in parallel. Every stochastic method receives its own
/// generator, so implementations need no interior mutability.
pub trait GaProblem: Send + Sync {
    /// The individual (solution) type for this problem.
    type Individual: Individual;

    /// Creates a random individual.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Evaluates an individual. Lower is better.
    fn evaluate(&self, individual: &Self::Individual) -> <Self::Individual as Individual>::Fitness;

    /// Produces one or two offspring by recombining two parents.
    ///
    /// The default implementation clones parent1 (no crossover).
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        _parent2: &Self::Individual,
        _rng: &mut R,
    ) -> Vec<Self::Individual> {
        vec![parent1.clone()]
    }

    /// Mutates an individual in place. Implementations must invalidate the
    /// cached fitness when they change the individual.
    fn mutate<R: Rng>(&self, _individual: &mut Self::Individual, _rng: &mut R) {}

    /// Whether `best` is good enough to stop immediately, e.g. a zero
    /// penalty. The default never stops early.
    fn target_reached(&self, _best: <Self::Individual as Individual>::Fitness) -> bool {
        false
    }

    /// Called at the end of each generation with the current best fitness.
    fn on_generation(
        &self,
        _generation: usize,
        _best_fitness: <Self::Individual as Individual>::Fitness,
    ) {
    }
}
