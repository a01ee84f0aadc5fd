//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! initialization → evaluation → selection → crossover → mutation → repeat.
//!
//! Breeding happens in pairs. The parents and a child seed for every pair
//! are drawn from the master generator in a fixed order before any pair is
//! bred, so a seeded run gives the same result with or without rayon.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::config::GaConfig;
use super::types::{Fitness, GaProblem, Individual};
use crate::random::{create_rng, rng_from_seed, split_seed};

/// Population statistics of one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// Generation number; 0 is the initial population.
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

impl GenerationStats {
    fn of<I: Individual>(generation: usize, population: &[I]) -> Self {
        let values: Vec<f64> = population.iter().map(|i| i.fitness().to_f64()).collect();
        let best = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let worst = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
        Self {
            generation,
            best,
            mean,
            worst,
        }
    }
}

/// Result of a GA optimization run.
///
/// Contains the best solution found, along with statistics about the
/// evolutionary process.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found during the entire run.
    pub best: I,

    /// Best fitness value (same as `best.fitness()`).
    pub best_fitness: I::Fitness,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether the run was terminated due to stagnation.
    pub stagnated: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Whether the wall-clock limit stopped the run.
    pub timed_out: bool,

    /// Whether [`GaProblem::target_reached`] stopped the run.
    pub reached_target: bool,

    /// Best fitness so far at the end of each generation, starting with the
    /// initial population.
    pub fitness_history: Vec<f64>,

    /// Per-generation population statistics, starting with the initial
    /// population.
    pub generation_stats: Vec<GenerationStats>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let config = GaConfig::default().with_seed(42);
/// let result = GaRunner::run(&problem, &config);
/// println!("Best fitness: {:?}", result.best_fitness);
/// ```
pub struct GaRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Exhausted,
    Stagnated,
    Cancelled,
    TimedOut,
    Target,
}

impl GaRunner {
    /// Runs the GA optimization.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call [`GaConfig::validate`] first
    /// to get a descriptive error).
    pub fn run<P: GaProblem>(problem: &P, config: &GaConfig) -> GaResult<P::Individual> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the GA will
    /// stop at the start of the next generation and return the best
    /// solution found so far.
    pub fn run_with_cancel<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> GaResult<P::Individual> {
        config.validate().expect("invalid GaConfig");

        let start = Instant::now();
        let deadline = config
            .time_limit_ms
            .map(|ms| start + Duration::from_millis(ms));
        let mut rng = rng_from_seed(config.seed);

        // 1. Initialize and evaluate
        let mut population: Vec<P::Individual> = (0..config.population_size)
            .map(|_| problem.create_individual(&mut rng))
            .collect();
        evaluate_population(problem, &mut population, config.parallel);

        // 2. Track best
        let mut best = find_best(&population).clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        let mut generation_stats = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best.fitness().to_f64());
        generation_stats.push(GenerationStats::of(0, &population));

        let elite_count = config.elite_count();
        let offspring_count = config.population_size - elite_count;
        let mut stagnation_counter = 0usize;
        let mut generations = 0usize;
        let mut stop = if problem.target_reached(best.fitness()) {
            Stop::Target
        } else {
            Stop::Exhausted
        };

        // 3. Evolutionary loop
        while stop == Stop::Exhausted && generations < config.max_generations {
            if cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                stop = Stop::Cancelled;
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                stop = Stop::TimedOut;
                break;
            }

            sort_by_fitness(&mut population);

            // Draw every pair's parents and seed up front, in a fixed order.
            let pairs: Vec<(usize, usize, u64)> = (0..offspring_count.div_ceil(2))
                .map(|_| {
                    let p1 = config.selection.select(&population, &mut rng);
                    let p2 = config.selection.select(&population, &mut rng);
                    (p1, p2, split_seed(&mut rng))
                })
                .collect();

            let breed = |&(p1, p2, seed): &(usize, usize, u64)| {
                let mut pair_rng = create_rng(seed);
                let mut children =
                    if pair_rng.random_range(0.0..1.0) < config.crossover_rate {
                        problem.crossover(&population[p1], &population[p2], &mut pair_rng)
                    } else {
                        vec![population[p1].clone(), population[p2].clone()]
                    };
                for child in &mut children {
                    if pair_rng.random_range(0.0..1.0) < config.mutation_rate {
                        problem.mutate(child, &mut pair_rng);
                    }
                }
                children
            };

            #[cfg(feature = "parallel")]
            let broods: Vec<Vec<P::Individual>> = if config.parallel {
                pairs.par_iter().map(breed).collect()
            } else {
                pairs.iter().map(breed).collect()
            };
            #[cfg(not(feature = "parallel"))]
            let broods: Vec<Vec<P::Individual>> = pairs.iter().map(breed).collect();

            let mut next_gen: Vec<P::Individual> = population[..elite_count].to_vec();
            next_gen.extend(broods.into_iter().flatten().take(offspring_count));
            // A crossover that yields a single child can leave the brood short.
            while next_gen.len() < config.population_size {
                let idx = config.selection.select(&population, &mut rng);
                next_gen.push(population[idx].clone());
            }

            evaluate_population(problem, &mut next_gen, config.parallel);
            population = next_gen;
            generations += 1;

            // Update best
            let gen_best = find_best(&population);
            if gen_best.fitness() < best.fitness() {
                let old = best.fitness().to_f64();
                let new = gen_best.fitness().to_f64();
                best = gen_best.clone();
                if is_significant(old, new, config.convergence_threshold) {
                    stagnation_counter = 0;
                } else {
                    stagnation_counter += 1;
                }
            } else {
                stagnation_counter += 1;
            }

            let stats = GenerationStats::of(generations, &population);
            debug!(
                "generation {}: best {:?}, population best {:.1} / mean {:.1} / worst {:.1}",
                generations,
                best.fitness(),
                stats.best,
                stats.mean,
                stats.worst
            );
            fitness_history.push(best.fitness().to_f64());
            generation_stats.push(stats);
            problem.on_generation(generations, best.fitness());

            if problem.target_reached(best.fitness()) {
                stop = Stop::Target;
            } else if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit
            {
                stop = Stop::Stagnated;
            }
        }

        GaResult {
            best_fitness: best.fitness(),
            best,
            generations,
            stagnated: stop == Stop::Stagnated,
            cancelled: stop == Stop::Cancelled,
            timed_out: stop == Stop::TimedOut,
            reached_target: stop == Stop::Target,
            fitness_history,
            generation_stats,
        }
    }
}

/// Whether moving from `old` to `new` resets the stagnation counter.
fn is_significant(old: f64, new: f64, threshold: f64) -> bool {
    if threshold <= 0.0 || !old.is_finite() || old.abs() < f64::EPSILON {
        return true;
    }
    (old - new).abs() / old.abs() >= threshold
}

/// Evaluates every individual whose cached fitness is stale.
fn evaluate_population<P: GaProblem>(
    problem: &P,
    population: &mut [P::Individual],
    parallel: bool,
) {
    let evaluate = |ind: &mut P::Individual| {
        if !ind.is_evaluated() {
            let f = problem.evaluate(ind);
            ind.set_fitness(f);
        }
    };
    #[cfg(feature = "parallel")]
    if parallel {
        population.par_iter_mut().for_each(evaluate);
        return;
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    population.iter_mut().for_each(evaluate);
}

fn sort_by_fitness<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        a.fitness()
            .partial_cmp(&b.fitness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Find the individual with the best (lowest) fitness.
fn find_best<I: Individual>(population: &[I]) -> &I {
    population
        .iter()
        .min_by(|a, b| {
            a.fitness()
                .partial_cmp(&b.fitness())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("population must not be empty")
}

// ============================================================================
// Tests
// ============================================================================
