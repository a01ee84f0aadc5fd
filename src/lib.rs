//! University timetabling engine.
//!
//! Assigns lectures and labs of student groups (and their split subgroups)
//! to a weekly grid of 5 days × 4 slots, each placement bound to one room
//! and one qualified lecturer.
//!
//! - **Model** ([`model`]): input records, derived tasks and domains, the
//!   timetable grid, and the remaining-hours ledger.
//! - **Occupancy** ([`occupancy`]): per-cell room, lecturer and group
//!   bookings; the single source of truth for hard constraints.
//! - **Fitness** ([`fitness`]): the soft-constraint penalty shared by both
//!   solvers.
//! - **Backtracking** ([`csp`]): depth-first search with
//!   minimum-remaining-values and cost-guided value ordering under a node
//!   and time budget.
//! - **Genetic Algorithm** ([`ga`], [`optimizer`]): a generic GA engine and
//!   its timetabling instance with greedy initialization, two-point cell
//!   crossover and validated per-cell mutation.
//!
//! # Example
//!
//! ```
//! use u_timetable::csp::{BacktrackSolver, SolverConfig};
//! use u_timetable::model::{ActivityType, Institution, Problem, ProblemConfig, ScheduleFilter};
//!
//! let inst = Institution::new()
//!     .with_group("CS1", 40)
//!     .with_subject("CS1", "Algorithms", 42, 21, true)
//!     .with_qualification("Turing", "Algorithms", ActivityType::Lecture)
//!     .with_qualification("Hopper", "Algorithms", ActivityType::Lab)
//!     .with_room("Aula", 80)
//!     .with_room("Lab 1", 24);
//! let problem = Problem::new(&inst, ProblemConfig::default())?;
//!
//! let solution = BacktrackSolver::solve(&problem, &SolverConfig::default())?;
//! assert!(solution.is_feasible());
//!
//! let hopper = problem.resolve_for(&solution.timetable, &ScheduleFilter::Lecturer("Hopper".into()));
//! assert_eq!(hopper.len(), 2);
//! # Ok::<(), u_timetable::error::TimetableError>(())
//! ```
//!
//! Both solvers log through the [`log`] facade; the library never installs
//! a logger.

pub mod csp;
pub mod error;
pub mod fitness;
pub mod ga;
pub mod model;
pub mod occupancy;
pub mod optimizer;
pub mod random;
