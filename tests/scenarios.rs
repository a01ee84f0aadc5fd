//! End-to-end scenarios over small institutions.

use u_timetable::csp::{BacktrackSolver, SolverConfig, SolverStatus};
use u_timetable::error::TimetableError;
use u_timetable::fitness::{FitnessEvaluator, PenaltyWeights};
use u_timetable::ga::GaConfig;
use u_timetable::model::{
    ActivityType, Cell, HoursLedger, Institution, Placement, Problem, ProblemConfig,
    ScheduleFilter, Timetable,
};
use u_timetable::occupancy::{count_conflicts, RoomSharing, SubgroupPolicy};
use u_timetable::optimizer::{optimize, OptimizeStatus, OptimizerConfig};

fn optimizer_config() -> OptimizerConfig {
    OptimizerConfig::default()
        .with_ga(
            GaConfig::default()
                .with_population_size(20)
                .with_max_generations(40)
                .with_mutation_rate(1.0),
        )
        .with_seed(7)
}

// ============================================================================
// Single task
// ============================================================================

fn single_task(room_capacity: u32, students: u32) -> Problem {
    let inst = Institution::new()
        .with_group("G1", students)
        .with_subject("G1", "Math", 15, 0, false)
        .with_qualification("L1", "Math", ActivityType::Lecture)
        .with_room("R1", room_capacity);
    Problem::new(&inst, ProblemConfig::default()).unwrap()
}

#[test]
fn single_lecture_is_placed_with_zero_penalty() {
    let problem = single_task(30, 20);
    assert_eq!(problem.tasks().len(), 1);
    assert_eq!(problem.tasks()[0].weekly_occurrences, 1);

    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
    assert_eq!(solution.status, SolverStatus::Feasible);
    assert_eq!(solution.timetable.len(), 1);
    assert_eq!(solution.penalty(), 0);

    let outcome = optimize(&problem, &optimizer_config()).unwrap();
    assert_eq!(outcome.status, OptimizeStatus::Optimal);
    assert_eq!(outcome.generations, 0);
    assert_eq!(outcome.timetable.len(), 1);
}

#[test]
fn rounding_residue_stays_in_ledger_but_is_not_penalized() {
    let problem = single_task(30, 20);
    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
    let (_, entry) = solution
        .ledger
        .iter()
        .find(|(k, _)| k.activity == ActivityType::Lecture)
        .unwrap();
    // 15 h requested, 21 h scheduled.
    assert!((entry.residue_hours + 6.0).abs() < 1e-9);
    assert_eq!(entry.outstanding_halves(), 0);
    assert!(solution.ledger.is_balanced());
}

#[test]
fn overflow_is_penalized_once_per_placement() {
    let problem = single_task(20, 25);
    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
    assert_eq!(solution.report.overflows, 1);
    assert_eq!(solution.penalty(), PenaltyWeights::default().capacity_overflow);

    // Placed by hand, the same single placement costs the same.
    let task = &problem.tasks()[0];
    let domain = problem.domain(task.id);
    let mut tt = Timetable::new();
    tt.add(
        Cell::new(3, 2).unwrap(),
        Placement::new(task, domain.rooms[0], domain.lecturers[0]),
    );
    let report = FitnessEvaluator::new(&problem, PenaltyWeights::default()).report_timetable(&tt);
    assert_eq!(report.overflows, 1);
    assert_eq!(report.penalty, 5);
}

// ============================================================================
// Subgroups
// ============================================================================

fn divided(students: u32) -> Problem {
    let inst = Institution::new()
        .with_group("G1", students)
        .with_subject("G1", "Chem", 21, 21, true)
        .with_qualification("L1", "Chem", ActivityType::Lecture)
        .with_qualification("L2", "Chem", ActivityType::Lab)
        .with_qualification("L3", "Chem", ActivityType::Lab)
        .with_room("Hall", 50)
        .with_room("Lab", 25);
    Problem::new(&inst, ProblemConfig::default()).unwrap()
}

fn lab_headcounts(problem: &Problem) -> Vec<(String, u32)> {
    problem
        .tasks()
        .iter()
        .filter(|t| t.activity == ActivityType::Lab)
        .map(|t| {
            let entity = problem.entity(t.entity.id);
            (entity.name.clone(), entity.headcount)
        })
        .collect()
}

#[test]
fn division_of_forty_gives_two_subgroups_of_twenty() {
    let problem = divided(40);
    assert_eq!(
        lab_headcounts(&problem),
        vec![("G1.1".to_string(), 20), ("G1.2".to_string(), 20)]
    );
}

#[test]
fn odd_division_balances_by_one() {
    let problem = divided(41);
    assert_eq!(
        lab_headcounts(&problem),
        vec![("G1.1".to_string(), 21), ("G1.2".to_string(), 20)]
    );
}

#[test]
fn parallel_subgroups_may_share_a_cell() {
    let problem = divided(40);
    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
    assert!(solution.is_feasible());
    assert!(solution.ledger.is_balanced());
    // Both labs plus the lecture, each subgroup lab counting half.
    assert_eq!(solution.timetable.len(), 3);
}

#[test]
fn exclusive_subgroups_never_share_a_cell() {
    let inst = Institution::new()
        .with_group("G1", 40)
        .with_subject("G1", "Chem", 21, 84, true)
        .with_qualification("L1", "Chem", ActivityType::Lecture)
        .with_qualification("L2", "Chem", ActivityType::Lab)
        .with_qualification("L3", "Chem", ActivityType::Lab)
        .with_room("Hall", 50)
        .with_room("Lab", 25);
    let config = ProblemConfig::default().with_subgroup_policy(SubgroupPolicy::Exclusive);
    let problem = Problem::new(&inst, config).unwrap();
    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
    assert!(solution.is_feasible());
    for cell in Cell::all() {
        let subgroups = solution
            .timetable
            .placements(cell)
            .iter()
            .filter(|p| p.entity.is_subgroup())
            .count();
        assert!(subgroups <= 1, "cell {cell} holds {subgroups} subgroup labs");
    }
    assert_eq!(
        count_conflicts(&solution.timetable, SubgroupPolicy::Exclusive, RoomSharing::Exclusive),
        0
    );
}

// ============================================================================
// Rooms
// ============================================================================

#[test]
fn shared_lecture_halls_host_simultaneous_lectures() {
    // 22 weekly lectures but only 20 cells and one hall.
    let inst = Institution::new()
        .with_group("G1", 20)
        .with_group("G2", 20)
        .with_subject("G1", "Math", 231, 0, false)
        .with_subject("G2", "Art", 231, 0, false)
        .with_qualification("L1", "Math", ActivityType::Lecture)
        .with_qualification("L2", "Art", ActivityType::Lecture)
        .with_room("Hall", 100);
    let config = ProblemConfig::default().with_room_sharing(RoomSharing::SharedLectures);
    let problem = Problem::new(&inst, config).unwrap();

    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
    assert!(solution.is_feasible());
    assert_eq!(solution.timetable.len(), 22);
    let shared = Cell::all()
        .filter(|&c| solution.timetable.placements(c).len() == 2)
        .count();
    assert!(shared >= 2);
    assert_eq!(solution.report.conflicts, 0);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn every_infeasible_task_is_named() {
    let inst = Institution::new()
        .with_group("G1", 30)
        .with_group("G2", 30)
        .with_subject("G1", "Math", 21, 21, true)
        .with_subject("G2", "Math", 21, 0, false)
        .with_qualification("L1", "Math", ActivityType::Lecture)
        .with_room("R1", 40);
    let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
    let expected = TimetableError::InfeasibleDomain {
        tasks: vec!["G1.1/Math (Lab)".into(), "G1.2/Math (Lab)".into()],
    };
    assert_eq!(
        BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap_err(),
        expected
    );
    assert_eq!(
        optimize(&problem, &optimizer_config()).unwrap_err(),
        expected
    );
}

#[test]
fn overcommitted_group_exhausts_search_but_optimizer_degrades() {
    // 21 weekly sessions for one group cannot fit in 20 cells.
    let inst = Institution::new()
        .with_group("G1", 10)
        .with_subject("G1", "Math", 441, 0, false)
        .with_qualification("L1", "Math", ActivityType::Lecture)
        .with_room("R1", 30);
    let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();

    assert!(matches!(
        BacktrackSolver::solve(&problem, &SolverConfig::default()),
        Err(TimetableError::SearchExhausted { .. })
    ));

    let outcome = optimize(&problem, &optimizer_config()).unwrap();
    assert_eq!(outcome.status, OptimizeStatus::BudgetExceeded);
    assert_eq!(outcome.report.conflicts, 0);
    assert_eq!(outcome.report.unmet_half_sessions, 2);
    assert_eq!(outcome.penalty(), 2 * PenaltyWeights::default().unmet_hours);
}

#[test]
fn invalid_records_are_rejected() {
    let inst = Institution::new()
        .with_group("G1", 10)
        .with_subject("G9", "Math", 21, 0, false);
    assert!(matches!(
        Problem::new(&inst, ProblemConfig::default()),
        Err(TimetableError::UnknownGroup { .. })
    ));

    let inst = Institution::new().with_group("G1", 10).with_group("G1", 12);
    assert_eq!(
        Problem::new(&inst, ProblemConfig::default()).unwrap_err(),
        TimetableError::DuplicateGroup("G1".into())
    );
}

// ============================================================================
// Schedule extraction
// ============================================================================

#[test]
fn group_schedule_includes_subgroups_in_time_order() {
    let problem = divided(40);
    let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();

    let entries = problem.resolve_for(&solution.timetable, &ScheduleFilter::Group("G1".into()));
    assert_eq!(entries.len(), 3);
    assert!(entries
        .windows(2)
        .all(|w| (w[0].day, w[0].slot) <= (w[1].day, w[1].slot)));
    assert!(entries.iter().any(|e| e.entity == "G1.1" && e.headcount == 20));
    assert!(entries.iter().any(|e| e.entity == "G1.2"));

    let hall = problem.resolve_for(&solution.timetable, &ScheduleFilter::Room("Nowhere".into()));
    assert!(hall.is_empty());

    let ledger = HoursLedger::from_timetable(&problem, &solution.timetable);
    assert_eq!(ledger, solution.ledger);
}
