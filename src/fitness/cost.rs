//! Incremental soft cost of a single placement.

use super::gaps::StreamMasks;
use super::weights::PenaltyWeights;
use crate::model::{Cell, Placement, Problem};

/// Whether the attending entity does not fit in the placement's room.
pub fn overflows(problem: &Problem, placement: &Placement) -> bool {
    problem.headcount(placement.entity) > problem.room(placement.room).capacity
}

/// Soft cost `placement` would add to a partial timetable whose streams are
/// `masks`: the weighted change in gaps plus the weighted capacity overflow.
///
/// Negative when the placement fills a hole.
pub fn marginal_cost(
    problem: &Problem,
    masks: &StreamMasks,
    weights: &PenaltyWeights,
    cell: Cell,
    placement: &Placement,
) -> i64 {
    let gaps = masks.gap_delta(problem, placement.entity.id, cell) * weights.gap as i64;
    let overflow = if overflows(problem, placement) {
        weights.capacity_overflow as i64
    } else {
        0
    };
    gaps + overflow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityType, Institution, ProblemConfig, Timetable};

    fn problem() -> Problem {
        let inst = Institution::new()
            .with_group("G1", 25)
            .with_subject("G1", "Math", 42, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("Small", 20)
            .with_room("Large", 30);
        Problem::new(&inst, ProblemConfig::default()).unwrap()
    }

    #[test]
    fn test_overflow_detected() {
        let p = problem();
        let task = &p.tasks()[0];
        let d = p.domain(task.id);
        assert!(overflows(&p, &Placement::new(task, d.rooms[0], d.lecturers[0])));
        assert!(!overflows(&p, &Placement::new(task, d.rooms[1], d.lecturers[0])));
    }

    #[test]
    fn test_marginal_cost_prefers_fitting_adjacent_cells() {
        let p = problem();
        let task = &p.tasks()[0];
        let d = p.domain(task.id);
        let weights = PenaltyWeights::default();

        let mut tt = Timetable::new();
        let large = Placement::new(task, d.rooms[1], d.lecturers[0]);
        tt.add(Cell::new(1, 1).unwrap(), large);
        let masks = StreamMasks::from_timetable(&p, &tt);

        let adjacent = marginal_cost(&p, &masks, &weights, Cell::new(1, 2).unwrap(), &large);
        let with_gap = marginal_cost(&p, &masks, &weights, Cell::new(1, 3).unwrap(), &large);
        let small = Placement::new(task, d.rooms[0], d.lecturers[0]);
        let cramped = marginal_cost(&p, &masks, &weights, Cell::new(1, 2).unwrap(), &small);

        assert_eq!(adjacent, 0);
        assert_eq!(with_gap, 10);
        assert_eq!(cramped, 5);
    }
}
