//! Backtracking constraint-satisfaction solver.
//!
//! Depth-first search over weekly task occurrences with
//! minimum-remaining-values variable ordering and cost-guided value
//! ordering. Only hard constraints are enforced during search; the soft cost
//! model of [`crate::fitness`] merely decides which legal value is tried
//! first.
//!
//! The search is exponential in the worst case, so it runs under a node and
//! wall-clock budget. When the budget runs out the deepest partial
//! assignment found so far is returned as a [`SolverStatus::Partial`]
//! result instead.
//!
//! # References
//!
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems"
//! - Russell & Norvig, *Artificial Intelligence: A Modern Approach*, ch. 6

mod config;
mod solver;
mod variables;

pub use config::SolverConfig;
pub use solver::{BacktrackSolver, CspSolution, SolverStatus};
pub use variables::Occurrence;
