//! Population optimizer.
//!
//! Evolves a population of timetables with the generic [`crate::ga`]
//! engine:
//!
//! - **Initialization**: randomized greedy placement of every weekly
//!   occurrence; what does not fit is left to the ledger.
//! - **Selection**: roulette over `1 / (penalty + 1)` with
//!   `ceil(10%)` elitism (the [`GaConfig`](crate::ga::GaConfig) defaults).
//! - **Crossover**: two-point crossover over the 20 grid cells.
//! - **Mutation**: per cell, one [`MutationOp`], validated before it is
//!   applied and skipped otherwise.
//!
//! Initialization and mutation never create a hard conflict and crossover
//! swaps whole cells, so every timetable the optimizer returns is
//! conflict-free; what remains is soft penalty.
//!
//! The run stops at a zero-penalty timetable or when the GA budget
//! (generations, stagnation, wall clock, cancellation) runs out. The latter
//! is a degraded success reported as [`OptimizeStatus::BudgetExceeded`].

mod candidate;
mod config;
mod init;
mod mutation;
mod problem;

pub use candidate::Candidate;
pub use config::OptimizerConfig;
pub use init::greedy_timetable;
pub use mutation::MutationOp;
pub use problem::TimetableGaProblem;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::error::{Result, TimetableError};
use crate::fitness::{FitnessEvaluator, FitnessReport};
use crate::ga::{GaRunner, GenerationStats};
use crate::model::{HoursLedger, Problem, Timetable};

/// How an optimizer run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeStatus {
    /// A timetable with zero penalty was found.
    Optimal,
    /// The budget ran out; the best timetable carries a nonzero penalty.
    BudgetExceeded,
}

/// Result of an optimizer run.
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub status: OptimizeStatus,
    /// Best timetable found over all generations.
    pub timetable: Timetable,
    pub ledger: HoursLedger,
    /// Violation breakdown of `timetable`.
    pub report: FitnessReport,
    pub generations: usize,
    /// Best penalty after each generation, starting with the initial
    /// population.
    pub fitness_history: Vec<f64>,
    pub generation_stats: Vec<GenerationStats>,
    pub stagnated: bool,
    pub cancelled: bool,
    pub timed_out: bool,
    pub solve_time_ms: u64,
}

impl OptimizeOutcome {
    pub fn penalty(&self) -> u64 {
        self.report.penalty
    }

    pub fn is_optimal(&self) -> bool {
        self.status == OptimizeStatus::Optimal
    }
}

/// Runs the population optimizer.
///
/// # Errors
/// - [`TimetableError::InvalidConfig`] if `config` fails validation
/// - [`TimetableError::InfeasibleDomain`] if any task has no qualified
///   lecturer
///
/// # Example
///
/// ```
/// use u_timetable::model::{ActivityType, Institution, Problem, ProblemConfig};
/// use u_timetable::optimizer::{optimize, OptimizeStatus, OptimizerConfig};
///
/// let inst = Institution::new()
///     .with_group("G1", 20)
///     .with_subject("G1", "Math", 15, 0, false)
///     .with_qualification("L1", "Math", ActivityType::Lecture)
///     .with_room("R1", 30);
/// let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
///
/// let outcome = optimize(&problem, &OptimizerConfig::default().with_seed(42)).unwrap();
/// assert_eq!(outcome.status, OptimizeStatus::Optimal);
/// assert_eq!(outcome.penalty(), 0);
/// ```
pub fn optimize(problem: &Problem, config: &OptimizerConfig) -> Result<OptimizeOutcome> {
    optimize_with_cancel(problem, config, None)
}

/// Runs the population optimizer with an optional cancellation flag.
///
/// Setting the flag stops the run at the start of the next generation; the
/// best timetable found so far is returned.
pub fn optimize_with_cancel(
    problem: &Problem,
    config: &OptimizerConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<OptimizeOutcome> {
    config.validate().map_err(TimetableError::InvalidConfig)?;
    problem.validate_domains()?;

    info!(
        "optimizing {} tasks ({} occurrences), population {}, up to {} generations",
        problem.tasks().len(),
        problem.total_occurrences(),
        config.ga.population_size,
        config.ga.max_generations
    );

    let start = Instant::now();
    let ga_problem = TimetableGaProblem::new(problem, config);
    let result = GaRunner::run_with_cancel(&ga_problem, &config.ga, cancel);

    let (timetable, ledger) = result.best.into_parts();
    let report = FitnessEvaluator::new(problem, config.weights).report(&timetable, &ledger);
    let status = if report.is_perfect() {
        OptimizeStatus::Optimal
    } else {
        OptimizeStatus::BudgetExceeded
    };
    let solve_time_ms = start.elapsed().as_millis() as u64;

    info!(
        "optimizer finished after {} generations in {} ms: {:?}, penalty {} \
         ({} conflicts, {} gaps, {} overflows, {} unmet half-sessions)",
        result.generations,
        solve_time_ms,
        status,
        report.penalty,
        report.conflicts,
        report.gaps,
        report.overflows,
        report.unmet_half_sessions
    );

    Ok(OptimizeOutcome {
        status,
        timetable,
        ledger,
        report,
        generations: result.generations,
        fitness_history: result.fitness_history,
        generation_stats: result.generation_stats,
        stagnated: result.stagnated,
        cancelled: result.cancelled,
        timed_out: result.timed_out,
        solve_time_ms,
    })
}
