//! Occupancy index and constraint checker.
//!
//! Tracks, per (day, slot) cell, which rooms, lecturers, and groups are
//! already committed. Every hard-constraint check in the crate goes through
//! this module, so both solvers and the fitness evaluator agree on what a
//! conflict is.
//!
//! # Hard constraints
//!
//! Within one cell:
//! - a lecturer teaches at most one placement;
//! - a room hosts at most one placement, unless [`RoomSharing::SharedLectures`]
//!   lets several lectures share it (a lab never shares);
//! - an entity attends at most one placement;
//! - a whole group never overlaps one of its subgroups;
//! - under [`SubgroupPolicy::Exclusive`], the two subgroups of a group never
//!   overlap each other either.

mod conflicts;
mod index;

pub use conflicts::{count_conflicts, find_conflicts, Conflict, ConflictKind};
pub use index::{CellOccupancy, OccupancyIndex};

/// Whether the two halves of a split group may be taught at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubgroupPolicy {
    /// `G.1` and `G.2` may share a cell (parallel lab sections).
    #[default]
    ParallelSubgroups,
    /// Subgroups of one parent never overlap.
    Exclusive,
}

/// Whether a room may host several simultaneous lectures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoomSharing {
    /// One placement per room and cell.
    #[default]
    Exclusive,
    /// Lectures for different groups may share a lecture hall.
    SharedLectures,
}
