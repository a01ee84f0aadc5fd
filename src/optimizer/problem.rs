//! Timetabling GA problem definition.
//!
//! Implements [`GaProblem`] for the weekly grid: greedy initialization,
//! two-point crossover over cells, per-cell mutation, and the shared fitness
//! penalty.

use log::trace;
use rand::Rng;

use super::candidate::Candidate;
use super::config::OptimizerConfig;
use super::init::greedy_timetable;
use super::mutation::{apply, MutationOp};
use crate::fitness::FitnessEvaluator;
use crate::ga::operators::two_point_crossover;
use crate::ga::GaProblem;
use crate::model::{Cell, Problem, Timetable};

/// Bridges a [`Problem`] to the generic GA engine.
///
/// # Example
///
/// ```
/// use u_timetable::ga::GaRunner;
/// use u_timetable::model::{ActivityType, Institution, Problem, ProblemConfig};
/// use u_timetable::optimizer::{OptimizerConfig, TimetableGaProblem};
///
/// let inst = Institution::new()
///     .with_group("G1", 20)
///     .with_subject("G1", "Math", 42, 0, false)
///     .with_qualification("L1", "Math", ActivityType::Lecture)
///     .with_room("R1", 30);
/// let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
/// let config = OptimizerConfig::default().with_seed(1);
///
/// let ga_problem = TimetableGaProblem::new(&problem, &config);
/// let result = GaRunner::run(&ga_problem, &config.ga);
/// assert!(result.reached_target);
/// ```
pub struct TimetableGaProblem<'a> {
    problem: &'a Problem,
    evaluator: FitnessEvaluator<'a>,
    cell_mutation_rate: f64,
}

impl<'a> TimetableGaProblem<'a> {
    pub fn new(problem: &'a Problem, config: &OptimizerConfig) -> Self {
        Self {
            problem,
            evaluator: FitnessEvaluator::new(problem, config.weights),
            cell_mutation_rate: config.cell_mutation_rate,
        }
    }

    pub fn problem(&self) -> &Problem {
        self.problem
    }
}

impl GaProblem for TimetableGaProblem<'_> {
    type Individual = Candidate;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> Candidate {
        Candidate::new(self.problem, greedy_timetable(self.problem, rng))
    }

    fn evaluate(&self, individual: &Candidate) -> u64 {
        self.evaluator
            .evaluate(individual.timetable(), individual.ledger())
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &Candidate,
        parent2: &Candidate,
        rng: &mut R,
    ) -> Vec<Candidate> {
        let (a, b) = two_point_crossover(
            parent1.timetable().cells(),
            parent2.timetable().cells(),
            rng,
        );
        match (Timetable::from_cells(a), Timetable::from_cells(b)) {
            (Some(a), Some(b)) => vec![
                Candidate::new(self.problem, a),
                Candidate::new(self.problem, b),
            ],
            _ => vec![parent1.clone(), parent2.clone()],
        }
    }

    fn mutate<R: Rng>(&self, individual: &mut Candidate, rng: &mut R) {
        let mut timetable = individual.timetable().clone();
        let mut changed = false;
        for cell in Cell::all() {
            if !rng.random_bool(self.cell_mutation_rate) {
                continue;
            }
            let op = MutationOp::random(rng);
            match apply(self.problem, &timetable, cell, op, rng) {
                Ok(next) => {
                    timetable = next;
                    changed = true;
                }
                Err(reason) => trace!("skipped {:?} at {}: {}", op, cell, reason),
            }
        }
        if changed {
            individual.set_timetable(self.problem, timetable);
        }
    }

    fn target_reached(&self, best: u64) -> bool {
        best == 0
    }
}
