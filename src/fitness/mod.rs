//! Soft-constraint cost model shared by both solvers.
//!
//! The GA scores complete timetables with [`FitnessEvaluator`]; the
//! backtracking solver orders values by [`marginal_cost`], which prices the
//! same gap and capacity terms for one prospective placement.
//!
//! # Penalty
//!
//! ```text
//! penalty = hard_conflict     × conflicts
//!         + gap               × gaps
//!         + capacity_overflow × overflows
//!         + unmet_hours       × |outstanding half-sessions|
//! ```

mod cost;
mod evaluator;
mod gaps;
mod weights;

pub use cost::{marginal_cost, overflows};
pub use evaluator::{FitnessEvaluator, FitnessReport};
pub use gaps::{count_gaps, StreamMasks};
pub use weights::PenaltyWeights;
