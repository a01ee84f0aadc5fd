//! Per-cell occupancy sets.

use std::collections::{HashMap, HashSet};

use super::{RoomSharing, SubgroupPolicy};
use crate::model::{
    ActivityType, Cell, EntityId, EntityRef, GroupId, LecturerId, Placement, Problem, RoomId,
    Timetable, CELL_COUNT,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RoomUse {
    lectures: u32,
    labs: u32,
}

/// Committed resources of one cell.
///
/// Counts are kept per resource so that a cell holding conflicting
/// placements (as a GA child may) still releases cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellOccupancy {
    placements: HashSet<Placement>,
    rooms: HashMap<RoomId, RoomUse>,
    lecturers: HashMap<LecturerId, u32>,
    entities: HashMap<EntityId, u32>,
    whole_groups: HashMap<GroupId, u32>,
    subgroup_roots: HashMap<GroupId, u32>,
}

impl CellOccupancy {
    /// Whether `room` can take another placement of `activity`.
    pub fn room_available(&self, room: RoomId, activity: ActivityType, sharing: RoomSharing) -> bool {
        match self.rooms.get(&room) {
            None => true,
            Some(used) => {
                sharing == RoomSharing::SharedLectures
                    && activity == ActivityType::Lecture
                    && used.labs == 0
            }
        }
    }

    pub fn lecturer_free(&self, lecturer: LecturerId) -> bool {
        !self.lecturers.contains_key(&lecturer)
    }

    /// Whether `entity` can attend something in this cell.
    pub fn entity_free(&self, entity: EntityRef, policy: SubgroupPolicy) -> bool {
        if self.entities.contains_key(&entity.id) || self.whole_groups.contains_key(&entity.group) {
            return false;
        }
        if entity.is_subgroup() {
            policy == SubgroupPolicy::ParallelSubgroups
                || !self.subgroup_roots.contains_key(&entity.group)
        } else {
            !self.subgroup_roots.contains_key(&entity.group)
        }
    }

    /// Hard-constraint dimensions (room, lecturer, group) on which
    /// `placement` collides with this cell's commitments.
    pub fn violations(
        &self,
        placement: &Placement,
        policy: SubgroupPolicy,
        sharing: RoomSharing,
    ) -> [bool; 3] {
        [
            !self.room_available(placement.room, placement.activity, sharing),
            !self.lecturer_free(placement.lecturer),
            !self.entity_free(placement.entity, policy),
        ]
    }

    /// Records a placement. Returns `false` if it was already committed.
    pub fn commit(&mut self, placement: &Placement) -> bool {
        if !self.placements.insert(*placement) {
            return false;
        }
        let room = self.rooms.entry(placement.room).or_default();
        match placement.activity {
            ActivityType::Lecture => room.lectures += 1,
            ActivityType::Lab => room.labs += 1,
        }
        *self.lecturers.entry(placement.lecturer).or_default() += 1;
        *self.entities.entry(placement.entity.id).or_default() += 1;
        let roots = if placement.entity.is_subgroup() {
            &mut self.subgroup_roots
        } else {
            &mut self.whole_groups
        };
        *roots.entry(placement.entity.group).or_default() += 1;
        true
    }

    /// Removes a placement. Returns `false` if it was not committed.
    pub fn release(&mut self, placement: &Placement) -> bool {
        if !self.placements.remove(placement) {
            return false;
        }
        if let Some(room) = self.rooms.get_mut(&placement.room) {
            match placement.activity {
                ActivityType::Lecture => room.lectures -= 1,
                ActivityType::Lab => room.labs -= 1,
            }
            if room.lectures == 0 && room.labs == 0 {
                self.rooms.remove(&placement.room);
            }
        }
        decrement(&mut self.lecturers, placement.lecturer);
        decrement(&mut self.entities, placement.entity.id);
        let roots = if placement.entity.is_subgroup() {
            &mut self.subgroup_roots
        } else {
            &mut self.whole_groups
        };
        decrement(roots, placement.entity.group);
        true
    }

    /// Number of committed placements.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

fn decrement<K: std::hash::Hash + Eq>(counts: &mut HashMap<K, u32>, key: K) {
    if let Some(n) = counts.get_mut(&key) {
        *n -= 1;
        if *n == 0 {
            counts.remove(&key);
        }
    }
}

/// Occupancy of the whole weekly grid under one subgroup and room policy.
///
/// Owned by a single solver run; the backtracking solver commits and
/// releases as it descends and retreats, the GA rebuilds one per candidate.
///
/// # Examples
///
/// ```
/// use u_timetable::model::{ActivityType, Cell, Institution, Placement, Problem, ProblemConfig};
/// use u_timetable::occupancy::OccupancyIndex;
///
/// let inst = Institution::new()
///     .with_group("G1", 20)
///     .with_subject("G1", "Math", 42, 0, false)
///     .with_qualification("L1", "Math", ActivityType::Lecture)
///     .with_room("R1", 30);
/// let problem = Problem::new(&inst, ProblemConfig::default()).unwrap();
/// let task = &problem.tasks()[0];
/// let domain = problem.domain(task.id);
/// let placement = Placement::new(task, domain.rooms[0], domain.lecturers[0]);
///
/// let mut index = OccupancyIndex::for_problem(&problem);
/// let cell = Cell::new(1, 1).unwrap();
/// assert!(index.is_legal(cell, &placement));
/// index.commit(cell, &placement);
/// assert!(!index.is_legal(cell, &placement));
/// index.release(cell, &placement);
/// assert!(index.is_legal(cell, &placement));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyIndex {
    cells: Vec<CellOccupancy>,
    policy: SubgroupPolicy,
    sharing: RoomSharing,
}

impl OccupancyIndex {
    /// Creates an empty index.
    pub fn new(policy: SubgroupPolicy, sharing: RoomSharing) -> Self {
        Self {
            cells: vec![CellOccupancy::default(); CELL_COUNT],
            policy,
            sharing,
        }
    }

    /// Creates an empty index with the policies of `problem`.
    pub fn for_problem(problem: &Problem) -> Self {
        let config = problem.config();
        Self::new(config.subgroup_policy, config.room_sharing)
    }

    /// Commits every placement of `timetable`.
    pub fn from_timetable(problem: &Problem, timetable: &Timetable) -> Self {
        let mut index = Self::for_problem(problem);
        for (cell, placement) in timetable.iter() {
            index.commit(cell, placement);
        }
        index
    }

    pub fn policy(&self) -> SubgroupPolicy {
        self.policy
    }

    pub fn sharing(&self) -> RoomSharing {
        self.sharing
    }

    /// Occupancy of a single cell.
    pub fn cell(&self, cell: Cell) -> &CellOccupancy {
        &self.cells[cell.index()]
    }

    /// Whether `placement` may be committed to `cell` without breaking a
    /// hard constraint.
    pub fn is_legal(&self, cell: Cell, placement: &Placement) -> bool {
        !self.cells[cell.index()]
            .violations(placement, self.policy, self.sharing)
            .contains(&true)
    }

    pub fn room_available(&self, cell: Cell, room: RoomId, activity: ActivityType) -> bool {
        self.cells[cell.index()].room_available(room, activity, self.sharing)
    }

    pub fn lecturer_free(&self, cell: Cell, lecturer: LecturerId) -> bool {
        self.cells[cell.index()].lecturer_free(lecturer)
    }

    pub fn entity_free(&self, cell: Cell, entity: EntityRef) -> bool {
        self.cells[cell.index()].entity_free(entity, self.policy)
    }

    /// Records `placement` in `cell`. Committing twice is a no-op.
    pub fn commit(&mut self, cell: Cell, placement: &Placement) -> bool {
        self.cells[cell.index()].commit(placement)
    }

    /// Removes `placement` from `cell`. Releasing twice is a no-op.
    pub fn release(&mut self, cell: Cell, placement: &Placement) -> bool {
        self.cells[cell.index()].release(placement)
    }
}
