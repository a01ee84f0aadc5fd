//! Backtracking search.
//!
//! [`BacktrackSolver`] places one weekly occurrence per search node:
//! select the most constrained occurrence, try its legal values cheapest
//! first, recurse, undo on failure.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info};

use super::config::SolverConfig;
use super::variables::Occurrence;
use crate::error::{Result, TimetableError};
use crate::fitness::{marginal_cost, FitnessEvaluator, FitnessReport, StreamMasks};
use crate::model::{Cell, HoursLedger, Placement, Problem, TaskId, Timetable, CELL_COUNT};
use crate::occupancy::OccupancyIndex;

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Every occurrence is placed without a hard conflict.
    Feasible,
    /// The budget ran out; the deepest partial assignment is returned.
    Partial,
}

/// Result of a backtracking run.
#[derive(Debug, Clone)]
pub struct CspSolution {
    pub status: SolverStatus,
    /// Conflict-free timetable; incomplete when `status` is `Partial`.
    pub timetable: Timetable,
    pub ledger: HoursLedger,
    /// Fitness of `timetable` under the configured weights.
    pub report: FitnessReport,
    /// Assignments tried.
    pub nodes: u64,
    /// Occurrences left unplaced (empty when feasible).
    pub unassigned: Vec<Occurrence>,
    pub solve_time_ms: u64,
}

impl CspSolution {
    pub fn is_feasible(&self) -> bool {
        self.status == SolverStatus::Feasible
    }

    pub fn penalty(&self) -> u64 {
        self.report.penalty
    }
}

/// Backtracking solver for timetabling problems.
///
/// # Usage
///
/// ```
/// use u_timetable::csp::{BacktrackSolver, SolverConfig, SolverStatus};
/// use u_timetable::model::{ActivityType, Institution, Problem, ProblemConfig};
///
/// let inst = Institution::new()
///     .with_group("G1", 20)
///     .with_subject("G1", "Math", 15, 0, false)
///     .with_qualification("L1", "Math", ActivityType::Lecture)
///     .with_room("R1", 30);
/// let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
///
/// let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();
/// assert_eq!(solution.status, SolverStatus::Feasible);
/// assert_eq!(solution.penalty(), 0);
/// ```
pub struct BacktrackSolver;

impl BacktrackSolver {
    /// Searches for a conflict-free timetable.
    ///
    /// # Errors
    /// - [`TimetableError::InvalidConfig`] if `config` fails validation
    /// - [`TimetableError::InfeasibleDomain`] if any task has no qualified
    ///   lecturer, before any search
    /// - [`TimetableError::SearchExhausted`] if the search space was fully
    ///   explored without a solution
    pub fn solve(problem: &Problem, config: &SolverConfig) -> Result<CspSolution> {
        config.validate().map_err(TimetableError::InvalidConfig)?;
        problem.validate_domains()?;

        let start = Instant::now();
        let budget = Budget {
            nodes: AtomicU64::new(0),
            max_nodes: config.max_nodes,
            deadline: config
                .time_limit_ms
                .map(|ms| start + Duration::from_millis(ms)),
            stop: AtomicBool::new(false),
        };

        info!(
            "backtracking over {} tasks ({} occurrences), {} worker(s)",
            problem.tasks().len(),
            problem.total_occurrences(),
            config.num_workers
        );

        let root = Search::new(problem, config, &budget);
        let (outcome, search) = if config.num_workers > 1 {
            search_split(root, config.num_workers)
        } else {
            let mut search = root;
            let outcome = search.run();
            (outcome, search)
        };

        let nodes = budget.nodes.load(Ordering::Relaxed).min(config.max_nodes);
        let solve_time_ms = start.elapsed().as_millis() as u64;

        let (status, placed) = match outcome {
            Outcome::Found => (SolverStatus::Feasible, search.placed),
            Outcome::Aborted => {
                debug!("backtracking budget exhausted after {} nodes", nodes);
                (SolverStatus::Partial, search.best)
            }
            Outcome::Failed => {
                info!("backtracking exhausted the search space after {} nodes", nodes);
                return Err(TimetableError::SearchExhausted { nodes });
            }
        };

        let mut timetable = Timetable::new();
        let mut unassigned = Vec::new();
        for (task, cells) in problem.tasks().iter().zip(&placed) {
            for (cell, placement) in cells {
                timetable.add(*cell, *placement);
            }
            unassigned.extend((cells.len() as u32..task.weekly_occurrences).map(|index| {
                Occurrence {
                    task: task.id,
                    index,
                }
            }));
        }
        let ledger = HoursLedger::from_timetable(problem, &timetable);
        let report = FitnessEvaluator::new(problem, config.weights).report(&timetable, &ledger);

        info!(
            "backtracking finished: {:?}, penalty {}, {} nodes, {} unplaced, {} ms",
            status,
            report.penalty,
            nodes,
            unassigned.len(),
            solve_time_ms
        );

        Ok(CspSolution {
            status,
            timetable,
            ledger,
            report,
            nodes,
            unassigned,
            solve_time_ms,
        })
    }
}

/// Shared node/time budget and stop flag.
struct Budget {
    nodes: AtomicU64,
    max_nodes: u64,
    deadline: Option<Instant>,
    stop: AtomicBool,
}

impl Budget {
    /// Accounts one node. Returns `false` once the search must stop.
    fn tick(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return false;
        }
        if self.nodes.fetch_add(1, Ordering::Relaxed) >= self.max_nodes {
            return false;
        }
        match self.deadline {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Found,
    Failed,
    Aborted,
}

type Placed = Vec<Vec<(Cell, Placement)>>;

/// Mutable search state. Cloning it gives a worker its own branch.
#[derive(Clone)]
struct Search<'a> {
    problem: &'a Problem,
    config: &'a SolverConfig,
    budget: &'a Budget,
    index: OccupancyIndex,
    masks: StreamMasks,
    /// Per task, its placed occurrences in increasing cell order.
    placed: Placed,
    depth: usize,
    best: Placed,
    best_depth: usize,
}

impl<'a> Search<'a> {
    fn new(problem: &'a Problem, config: &'a SolverConfig, budget: &'a Budget) -> Self {
        let placed = vec![Vec::new(); problem.tasks().len()];
        Self {
            problem,
            config,
            budget,
            index: OccupancyIndex::for_problem(problem),
            masks: StreamMasks::new(problem),
            best: placed.clone(),
            placed,
            depth: 0,
            best_depth: 0,
        }
    }

    fn run(&mut self) -> Outcome {
        match self.select() {
            None => Outcome::Found,
            Some((_, 0)) => Outcome::Failed,
            Some((task, _)) => {
                let values = self.ordered_values(task);
                self.try_values(task, values)
            }
        }
    }

    fn try_values(&mut self, task: TaskId, values: Vec<(Cell, Placement)>) -> Outcome {
        for (cell, placement) in values {
            if !self.budget.tick() {
                return Outcome::Aborted;
            }
            self.assign(task, cell, placement);
            match self.run() {
                Outcome::Found => return Outcome::Found,
                Outcome::Aborted => return Outcome::Aborted,
                Outcome::Failed => self.unassign(task),
            }
        }
        Outcome::Failed
    }

    fn assign(&mut self, task: TaskId, cell: Cell, placement: Placement) {
        self.index.commit(cell, &placement);
        self.masks.add(self.problem, placement.entity.id, cell);
        self.placed[task.index()].push((cell, placement));
        self.depth += 1;
        if self.depth > self.best_depth {
            self.best_depth = self.depth;
            self.best = self.placed.clone();
        }
    }

    fn unassign(&mut self, task: TaskId) {
        if let Some((cell, placement)) = self.placed[task.index()].pop() {
            self.index.release(cell, &placement);
            self.masks.remove(self.problem, placement.entity.id, cell);
            self.depth -= 1;
        }
    }

    /// Cells the next occurrence of `task` may use: strictly after its
    /// previous occurrence, leaving room for the ones after it.
    fn cell_range(&self, task: TaskId) -> std::ops::Range<usize> {
        let placed = &self.placed[task.index()];
        let remaining = self.problem.task(task).weekly_occurrences as usize - placed.len();
        let lo = placed.last().map_or(0, |(cell, _)| cell.index() + 1);
        let hi = (CELL_COUNT + 1).saturating_sub(remaining);
        lo..hi.max(lo)
    }

    /// Number of legal values for the next occurrence of `task`.
    fn legal_count(&self, task: TaskId) -> usize {
        let t = self.problem.task(task);
        let domain = self.problem.domain(task);
        self.cell_range(task)
            .map(Cell::from_index)
            .filter(|&cell| self.index.entity_free(cell, t.entity))
            .map(|cell| {
                let rooms = domain
                    .rooms
                    .iter()
                    .filter(|&&r| self.index.room_available(cell, r, t.activity))
                    .count();
                let lecturers = domain
                    .lecturers
                    .iter()
                    .filter(|&&l| self.index.lecturer_free(cell, l))
                    .count();
                rooms * lecturers
            })
            .sum()
    }

    /// Minimum-remaining-values: the task whose next occurrence has the
    /// fewest legal values, first in task order on ties. `None` when every
    /// occurrence is placed.
    fn select(&self) -> Option<(TaskId, usize)> {
        let mut best: Option<(TaskId, usize)> = None;
        for task in self.problem.tasks() {
            if self.placed[task.id.index()].len() >= task.weekly_occurrences as usize {
                continue;
            }
            let count = self.legal_count(task.id);
            if count == 0 {
                return Some((task.id, 0));
            }
            if best.map_or(true, |(_, c)| count < c) {
                best = Some((task.id, count));
            }
        }
        best
    }

    /// Legal values of the next occurrence of `task`, cheapest first. Ties
    /// keep domain order (room, lecturer, day, slot).
    fn ordered_values(&self, task: TaskId) -> Vec<(Cell, Placement)> {
        let t = self.problem.task(task);
        let domain = self.problem.domain(task);
        let range = self.cell_range(task);
        let mut values: Vec<(i64, Cell, Placement)> = Vec::new();
        for &room in &domain.rooms {
            for &lecturer in &domain.lecturers {
                let placement = Placement::new(t, room, lecturer);
                for cell in range.clone().map(Cell::from_index) {
                    if self.index.is_legal(cell, &placement) {
                        let cost = marginal_cost(
                            self.problem,
                            &self.masks,
                            &self.config.weights,
                            cell,
                            &placement,
                        );
                        values.push((cost, cell, placement));
                    }
                }
            }
        }
        values.sort_by_key(|(cost, _, _)| *cost);
        values.into_iter().map(|(_, c, p)| (c, p)).collect()
    }
}

/// Splits the root choice point across `workers` branches, each with a
/// private copy of the search state.
#[cfg(feature = "parallel")]
fn search_split(root: Search<'_>, workers: usize) -> (Outcome, Search<'_>) {
    use rayon::prelude::*;

    let (task, values) = match root.select() {
        None => return (Outcome::Found, root),
        Some((_, 0)) => return (Outcome::Failed, root),
        Some((task, _)) => (task, root.ordered_values(task)),
    };

    let shares: Vec<Vec<(Cell, Placement)>> = (0..workers)
        .map(|w| values.iter().skip(w).step_by(workers).copied().collect())
        .collect();

    let results: Vec<(Outcome, Search<'_>)> = shares
        .into_par_iter()
        .map(|share| {
            let mut branch = root.clone();
            let outcome = branch.try_values(task, share);
            if outcome == Outcome::Found {
                branch.budget.stop.store(true, Ordering::Relaxed);
            }
            (outcome, branch)
        })
        .collect();

    merge_branches(results, root)
}

#[cfg(not(feature = "parallel"))]
fn search_split(root: Search<'_>, _workers: usize) -> (Outcome, Search<'_>) {
    debug!("parallel feature disabled, searching on one thread");
    let mut search = root;
    let outcome = search.run();
    (outcome, search)
}

/// Combines branch results: the first success wins; otherwise any aborted
/// branch makes the whole run partial, keeping the deepest assignment.
#[cfg(feature = "parallel")]
fn merge_branches<'a>(
    results: Vec<(Outcome, Search<'a>)>,
    root: Search<'a>,
) -> (Outcome, Search<'a>) {
    let mut aborted = false;
    let mut deepest: Option<Search<'a>> = None;
    for (outcome, branch) in results {
        match outcome {
            Outcome::Found => return (Outcome::Found, branch),
            Outcome::Aborted => aborted = true,
            Outcome::Failed => {}
        }
        if deepest
            .as_ref()
            .map_or(true, |d| branch.best_depth > d.best_depth)
        {
            deepest = Some(branch);
        }
    }
    let outcome = if aborted {
        Outcome::Aborted
    } else {
        Outcome::Failed
    };
    (outcome, deepest.unwrap_or(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityType, Institution, ProblemConfig};
    use crate::occupancy::count_conflicts;

    fn solve(inst: &Institution, config: SolverConfig) -> Result<CspSolution> {
        let problem = Problem::new(inst, ProblemConfig::default()).unwrap();
        BacktrackSolver::solve(&problem, &config)
    }

    fn university() -> Institution {
        Institution::new()
            .with_group("G1", 40)
            .with_group("G2", 28)
            .with_group("G3", 22)
            .with_subject("G1", "Math", 42, 21, true)
            .with_subject("G1", "Physics", 21, 21, false)
            .with_subject("G2", "Math", 42, 0, false)
            .with_subject("G2", "Chemistry", 21, 21, true)
            .with_subject("G3", "Physics", 21, 0, false)
            .with_subject("G3", "Chemistry", 42, 21, false)
            .with_qualification("Ann", "Math", ActivityType::Lecture)
            .with_qualification("Ben", "Math", ActivityType::Lab)
            .with_qualification("Ben", "Physics", ActivityType::Lecture)
            .with_qualification("Cleo", "Physics", ActivityType::Lab)
            .with_qualification("Cleo", "Chemistry", ActivityType::Lecture)
            .with_qualification("Dan", "Chemistry", ActivityType::Lab)
            .with_room("A101", 45)
            .with_room("B201", 30)
            .with_room("Lab1", 25)
    }

    #[test]
    fn test_single_task_scenario() {
        let inst = Institution::new()
            .with_group("G1", 20)
            .with_subject("G1", "Math", 15, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30);
        let solution = solve(&inst, SolverConfig::default()).unwrap();
        assert_eq!(solution.status, SolverStatus::Feasible);
        assert_eq!(solution.timetable.len(), 1);
        assert_eq!(solution.report, FitnessReport::default());
        assert!(solution.unassigned.is_empty());
    }

    #[test]
    fn test_feasible_solution_is_conflict_free_and_complete() {
        let inst = university();
        let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
        let solution = BacktrackSolver::solve(&problem, &SolverConfig::default()).unwrap();

        assert!(solution.is_feasible());
        assert_eq!(solution.timetable.len(), problem.total_occurrences());
        let config = problem.config();
        assert_eq!(
            count_conflicts(&solution.timetable, config.subgroup_policy, config.room_sharing),
            0
        );
        assert!(solution.ledger.is_balanced());
        for (_, p) in solution.timetable.iter() {
            assert!(problem.is_qualified(p.lecturer, p.subject, p.activity));
        }
    }

    #[test]
    fn test_value_ordering_avoids_gaps_and_overflow() {
        let inst = Institution::new()
            .with_group("G1", 25)
            .with_subject("G1", "Math", 63, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("Small", 20)
            .with_room("Large", 30);
        let solution = solve(&inst, SolverConfig::default()).unwrap();
        assert_eq!(solution.report.overflows, 0);
        assert_eq!(solution.report.gaps, 0);
        assert!(solution.report.is_perfect());
    }

    #[test]
    fn test_occurrences_in_distinct_cells() {
        let inst = Institution::new()
            .with_group("G1", 20)
            .with_subject("G1", "Math", 84, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30)
            .with_room("R2", 30);
        let solution = solve(&inst, SolverConfig::default()).unwrap();
        assert_eq!(solution.timetable.len(), 4);
        assert!(solution.timetable.cells().iter().all(|c| c.len() <= 1));
    }

    #[test]
    fn test_infeasible_domain_reported_before_search() {
        let inst = university().with_subject("G3", "Art", 21, 0, false);
        match solve(&inst, SolverConfig::default()) {
            Err(TimetableError::InfeasibleDomain { tasks }) => {
                assert_eq!(tasks, vec!["G3/Art (Lecture)".to_string()]);
            }
            other => panic!("expected InfeasibleDomain, got {other:?}"),
        }
    }

    #[test]
    fn test_search_exhausted() {
        // 21 weekly sessions cannot fit 20 cells.
        let inst = Institution::new()
            .with_group("G1", 20)
            .with_subject("G1", "Math", 21 * 21, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30);
        assert!(matches!(
            solve(&inst, SolverConfig::default()),
            Err(TimetableError::SearchExhausted { .. })
        ));
    }

    #[test]
    fn test_budget_returns_partial() {
        // One lecturer, 22 sessions: never fits, and the space is too large
        // to exhaust within the budget.
        let inst = Institution::new()
            .with_group("G1", 20)
            .with_group("G2", 20)
            .with_subject("G1", "Math", 11 * 21, 0, false)
            .with_subject("G2", "Math", 11 * 21, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30)
            .with_room("R2", 30);
        let solution = solve(&inst, SolverConfig::default().with_max_nodes(500)).unwrap();
        assert_eq!(solution.status, SolverStatus::Partial);
        assert!(!solution.unassigned.is_empty());
        assert_eq!(solution.report.conflicts, 0);
        assert!(solution.report.unmet_half_sessions > 0);
        assert_eq!(solution.nodes, 500);
        assert_eq!(
            solution.timetable.len() + solution.unassigned.len(),
            22
        );
    }

    #[test]
    fn test_deterministic() {
        let inst = university();
        let a = solve(&inst, SolverConfig::default()).unwrap();
        let b = solve(&inst, SolverConfig::default()).unwrap();
        assert_eq!(a.timetable, b.timetable);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            solve(&university(), SolverConfig::default().with_max_nodes(0)),
            Err(TimetableError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_multiple_workers_find_feasible() {
        let inst = university();
        let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
        let solution =
            BacktrackSolver::solve(&problem, &SolverConfig::default().with_num_workers(4)).unwrap();
        assert!(solution.is_feasible());
        assert_eq!(solution.timetable.len(), problem.total_occurrences());
        let config = problem.config();
        assert_eq!(
            count_conflicts(&solution.timetable, config.subgroup_policy, config.room_sharing),
            0
        );
    }

    #[test]
    fn test_multiple_workers_place_disjoint_lectures() {
        let inst = Institution::new()
            .with_group("G1", 20)
            .with_group("G2", 20)
            .with_subject("G1", "Math", 21, 0, false)
            .with_subject("G2", "Math", 21, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30);
        let solution = solve(&inst, SolverConfig::default().with_num_workers(3)).unwrap();
        assert!(solution.is_feasible());
        assert_eq!(solution.timetable.len(), 2);
    }

    #[test]
    fn test_multiple_workers_exhaust_overcommitted_group() {
        // 21 weekly sessions for one group cannot fit in 20 cells.
        let inst = Institution::new()
            .with_group("G1", 10)
            .with_subject("G1", "Math", 441, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30);
        assert!(matches!(
            solve(&inst, SolverConfig::default().with_num_workers(3)),
            Err(TimetableError::SearchExhausted { .. })
        ));
    }

    #[test]
    fn test_every_branch_failing_exhausts() {
        // Math fills all 20 cells, leaving none for Art; the root choice has
        // a value, so the branches are searched before failing.
        let inst = Institution::new()
            .with_group("G1", 10)
            .with_subject("G1", "Math", 420, 0, false)
            .with_subject("G1", "Art", 21, 0, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_qualification("L2", "Art", ActivityType::Lecture)
            .with_room("R1", 30);
        match solve(&inst, SolverConfig::default().with_num_workers(3)) {
            Err(TimetableError::SearchExhausted { nodes }) => assert!(nodes >= 20),
            other => panic!("expected SearchExhausted, got {other:?}"),
        }
    }
}
