//! GA individual: a timetable with its ledger and a cached fitness.

use crate::ga::Individual;
use crate::model::{HoursLedger, Problem, Timetable};

/// One member of the optimizer population.
///
/// The ledger is rebuilt from the grid whenever the grid is replaced, and
/// the cached fitness is dropped at the same time, so a stale score can
/// never outlive the timetable it was computed for.
#[derive(Debug, Clone)]
pub struct Candidate {
    timetable: Timetable,
    ledger: HoursLedger,
    fitness: Option<u64>,
}

impl Candidate {
    /// Wraps `timetable`, computing its ledger.
    pub fn new(problem: &Problem, timetable: Timetable) -> Self {
        let ledger = HoursLedger::from_timetable(problem, &timetable);
        Self {
            timetable,
            ledger,
            fitness: None,
        }
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn ledger(&self) -> &HoursLedger {
        &self.ledger
    }

    /// Cached penalty, if evaluated since the last change.
    pub fn cached_fitness(&self) -> Option<u64> {
        self.fitness
    }

    /// Swaps in a new grid and invalidates the cached fitness.
    pub fn set_timetable(&mut self, problem: &Problem, timetable: Timetable) {
        self.ledger = HoursLedger::from_timetable(problem, &timetable);
        self.timetable = timetable;
        self.fitness = None;
    }

    pub fn into_parts(self) -> (Timetable, HoursLedger) {
        (self.timetable, self.ledger)
    }
}

impl Individual for Candidate {
    type Fitness = u64;

    fn fitness(&self) -> u64 {
        self.fitness.unwrap_or(u64::MAX)
    }

    fn set_fitness(&mut self, fitness: u64) {
        self.fitness = Some(fitness);
    }

    fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}
