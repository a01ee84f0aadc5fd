//! Hard-conflict detection over complete timetables.

use super::index::CellOccupancy;
use super::{RoomSharing, SubgroupPolicy};
use crate::model::{Cell, Placement, Timetable};

/// The resource a conflict is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    Room,
    Lecturer,
    Group,
}

/// A placement that collides with an earlier placement of the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub cell: Cell,
    /// Position of the offending placement within the cell.
    pub position: usize,
    pub placement: Placement,
    pub kind: ConflictKind,
}

/// Lists every hard conflict of `timetable`.
///
/// Placements are replayed in cell order; each one is checked against the
/// placements before it and reported once per colliding dimension.
pub fn find_conflicts(
    timetable: &Timetable,
    policy: SubgroupPolicy,
    sharing: RoomSharing,
) -> Vec<Conflict> {
    let kinds = [ConflictKind::Room, ConflictKind::Lecturer, ConflictKind::Group];
    let mut conflicts = Vec::new();
    for (i, placements) in timetable.cells().iter().enumerate() {
        let cell = Cell::from_index(i);
        let mut occupancy = CellOccupancy::default();
        for (position, placement) in placements.iter().enumerate() {
            let hits = occupancy.violations(placement, policy, sharing);
            for (kind, hit) in kinds.iter().zip(hits) {
                if hit {
                    conflicts.push(Conflict {
                        cell,
                        position,
                        placement: *placement,
                        kind: *kind,
                    });
                }
            }
            occupancy.commit(placement);
        }
    }
    conflicts
}

/// Number of hard conflicts in `timetable`.
pub fn count_conflicts(timetable: &Timetable, policy: SubgroupPolicy, sharing: RoomSharing) -> u64 {
    timetable
        .cells()
        .iter()
        .map(|placements| {
            let mut occupancy = CellOccupancy::default();
            placements
                .iter()
                .map(|p| {
                    let hits = occupancy.violations(p, policy, sharing);
                    occupancy.commit(p);
                    hits.iter().filter(|&&hit| hit).count() as u64
                })
                .sum::<u64>()
        })
        .sum()
}
