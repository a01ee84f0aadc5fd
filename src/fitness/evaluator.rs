//! Full-timetable fitness.

use super::cost::overflows;
use super::gaps::StreamMasks;
use super::weights::PenaltyWeights;
use crate::model::{HoursLedger, Problem, Timetable};
use crate::occupancy::count_conflicts;

/// Violation counts of one timetable and the resulting penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitnessReport {
    /// Colliding dimensions over all cells.
    pub conflicts: u64,
    pub gaps: u64,
    /// Placements whose headcount exceeds the room capacity.
    pub overflows: u64,
    /// Sum of `|required - placed|` over all tasks, in half-sessions.
    pub unmet_half_sessions: u64,
    pub penalty: u64,
}

impl FitnessReport {
    /// Zero penalty: no conflict, gap, overflow, or unmet session.
    pub fn is_perfect(&self) -> bool {
        self.penalty == 0
    }

    /// Whether the timetable breaks no hard constraint.
    pub fn is_feasible(&self) -> bool {
        self.conflicts == 0
    }
}

/// Scores complete timetables of one problem.
///
/// Evaluation is a pure function of the timetable and its ledger, so
/// re-evaluating an unchanged timetable always yields the same value.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator<'a> {
    problem: &'a Problem,
    weights: PenaltyWeights,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(problem: &'a Problem, weights: PenaltyWeights) -> Self {
        Self { problem, weights }
    }

    pub fn weights(&self) -> &PenaltyWeights {
        &self.weights
    }

    /// Penalty of `timetable` given its ledger.
    pub fn evaluate(&self, timetable: &Timetable, ledger: &HoursLedger) -> u64 {
        self.report(timetable, ledger).penalty
    }

    /// Full violation breakdown of `timetable`.
    pub fn report(&self, timetable: &Timetable, ledger: &HoursLedger) -> FitnessReport {
        let config = self.problem.config();
        let conflicts = count_conflicts(timetable, config.subgroup_policy, config.room_sharing);
        let gaps = StreamMasks::from_timetable(self.problem, timetable).total_gaps();
        let overflows = timetable
            .iter()
            .filter(|(_, p)| overflows(self.problem, p))
            .count() as u64;
        let unmet_half_sessions = ledger.total_outstanding();

        let w = &self.weights;
        let penalty = w.hard_conflict * conflicts
            + w.gap * gaps
            + w.capacity_overflow * overflows
            + w.unmet_hours * unmet_half_sessions;

        FitnessReport {
            conflicts,
            gaps,
            overflows,
            unmet_half_sessions,
            penalty,
        }
    }

    /// Report for `timetable`, rebuilding its ledger first.
    pub fn report_timetable(&self, timetable: &Timetable) -> FitnessReport {
        let ledger = HoursLedger::from_timetable(self.problem, timetable);
        self.report(timetable, &ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityType, Cell, Institution, Placement, ProblemConfig};

    fn problem(room_capacity: u32, students: u32) -> Problem {
        let inst = Institution::new()
            .with_group("G1", students)
            .with_subject("G1", "Math", 15, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", room_capacity);
        Problem::new(&inst, ProblemConfig::default()).unwrap()
    }

    fn single_placement(p: &Problem) -> Timetable {
        let task = &p.tasks()[0];
        let d = p.domain(task.id);
        let mut tt = Timetable::new();
        tt.add(Cell::new(2, 2).unwrap(), Placement::new(task, d.rooms[0], d.lecturers[0]));
        tt
    }

    #[test]
    fn test_perfect_timetable_scores_zero() {
        let p = problem(30, 20);
        let tt = single_placement(&p);
        let report = FitnessEvaluator::new(&p, PenaltyWeights::default()).report_timetable(&tt);
        assert_eq!(report, FitnessReport::default());
        assert!(report.is_perfect());
    }

    #[test]
    fn test_capacity_overflow_counted_once() {
        let p = problem(20, 25);
        let tt = single_placement(&p);
        let report = FitnessEvaluator::new(&p, PenaltyWeights::default()).report_timetable(&tt);
        assert_eq!(report.overflows, 1);
        assert_eq!(report.penalty, 5);
    }

    #[test]
    fn test_unplaced_sessions_penalized() {
        let p = problem(30, 20);
        let tt = Timetable::new();
        let report = FitnessEvaluator::new(&p, PenaltyWeights::default()).report_timetable(&tt);
        assert_eq!(report.unmet_half_sessions, 2);
        assert_eq!(report.penalty, 4);
    }

    #[test]
    fn test_conflicts_dominate() {
        let p = problem(30, 20);
        let mut tt = single_placement(&p);
        let dup = tt.placements(Cell::new(2, 2).unwrap())[0];
        tt.add(Cell::new(2, 2).unwrap(), dup);
        let report = FitnessEvaluator::new(&p, PenaltyWeights::default()).report_timetable(&tt);
        assert_eq!(report.conflicts, 3);
        assert!(!report.is_feasible());
        // 3 conflicts + 1 overbooked session.
        assert_eq!(report.penalty, 300 + 2 * 2);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let p = problem(20, 25);
        let tt = single_placement(&p);
        let ledger = HoursLedger::from_timetable(&p, &tt);
        let eval = FitnessEvaluator::new(&p, PenaltyWeights::default());
        let first = eval.evaluate(&tt, &ledger);
        for _ in 0..5 {
            assert_eq!(eval.evaluate(&tt, &ledger), first);
        }
    }

    // ========================================================================
    // Divided labs
    // ========================================================================

    fn two_divided_labs() -> Problem {
        let inst = Institution::new()
            .with_group("G1", 40)
            .with_subject("G1", "Math", 0, 21, true)
            .with_subject("G1", "Phys", 0, 21, true)
            .with_qualification("L1", "Math", ActivityType::Lab)
            .with_qualification("L2", "Math", ActivityType::Lab)
            .with_qualification("L3", "Phys", ActivityType::Lab)
            .with_qualification("L4", "Phys", ActivityType::Lab)
            .with_room("R1", 25)
            .with_room("R2", 25);
        Problem::new(&inst, ProblemConfig::default()).unwrap()
    }

    fn lab(p: &Problem, entity: &str, subject: &str, room: usize, lecturer: usize) -> Placement {
        let task = p
            .tasks()
            .iter()
            .find(|t| {
                t.activity == ActivityType::Lab
                    && p.entity(t.entity.id).name == entity
                    && p.subject_name(t.subject) == subject
            })
            .unwrap();
        let d = p.domain(task.id);
        Placement::new(task, d.rooms[room], d.lecturers[lecturer])
    }

    #[test]
    fn test_swapped_subgroup_labs_are_penalized() {
        let p = two_divided_labs();
        let eval = FitnessEvaluator::new(&p, PenaltyWeights::default());
        let first = Cell::new(1, 1).unwrap();
        let second = Cell::new(1, 2).unwrap();

        let mut tt = Timetable::new();
        tt.add(first, lab(&p, "G1.1", "Math", 0, 0));
        tt.add(first, lab(&p, "G1.2", "Math", 1, 1));
        tt.add(second, lab(&p, "G1.1", "Phys", 0, 0));
        tt.add(second, lab(&p, "G1.2", "Phys", 1, 1));
        assert!(eval.report_timetable(&tt).is_perfect());

        // G1.1 has Phys twice and no Math; G1.2 the other way round.
        let mut swapped = Timetable::new();
        for cell in [first, second] {
            swapped.add(cell, lab(&p, "G1.1", "Phys", 0, 0));
            swapped.add(cell, lab(&p, "G1.2", "Math", 1, 0));
        }
        let report = eval.report_timetable(&swapped);
        assert_eq!(report.conflicts, 0);
        assert_eq!(report.gaps, 0);
        assert_eq!(report.unmet_half_sessions, 4);
        assert_eq!(report.penalty, 8);
    }
}
