//! Scheduling variables and their values.

use super::types::{
    ActivityType, Cell, EntityId, EntityRef, LecturerId, RoomId, SubjectId, TaskId, CELL_COUNT,
};

/// A required teaching activity: one entity, one subject, one activity type,
/// repeated `weekly_occurrences` times per week.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub entity: EntityRef,
    pub subject: SubjectId,
    pub activity: ActivityType,
    /// `round(term_hours / (session_hours × weeks))`.
    pub weekly_occurrences: u32,
    /// Term hours left over by the rounding above. Negative when rounding
    /// overshoots.
    pub residue_hours: f64,
}

impl Task {
    pub fn entity_id(&self) -> EntityId {
        self.entity.id
    }
}

/// A value for a task: where, when, and by whom it is taught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assignment {
    pub room: RoomId,
    pub lecturer: LecturerId,
    pub cell: Cell,
}

/// The legal values of a task under attribute compatibility alone: every
/// room × every qualified lecturer × every cell.
///
/// Stored as its factors rather than the expanded product; [`Domain::iter`]
/// enumerates the product in room, lecturer, day, slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Domain {
    pub rooms: Vec<RoomId>,
    pub lecturers: Vec<LecturerId>,
}

impl Domain {
    /// Number of assignments in the domain.
    pub fn len(&self) -> usize {
        self.rooms.len() * self.lecturers.len() * CELL_COUNT
    }

    /// Whether the domain holds no assignment at all.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty() || self.lecturers.is_empty()
    }

    /// Whether `lecturer` is qualified for the owning task.
    pub fn allows_lecturer(&self, lecturer: LecturerId) -> bool {
        self.lecturers.contains(&lecturer)
    }

    /// Enumerates every assignment in the domain.
    pub fn iter(&self) -> impl Iterator<Item = Assignment> + '_ {
        self.rooms.iter().flat_map(move |&room| {
            self.lecturers.iter().flat_map(move |&lecturer| {
                Cell::all().map(move |cell| Assignment {
                    room,
                    lecturer,
                    cell,
                })
            })
        })
    }
}

/// A committed occurrence of a task inside a timetable cell.
///
/// The cell itself is the position in the [`Timetable`](super::Timetable)
/// grid; a placement carries everything the constraint checks need without
/// looking anything up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub task: TaskId,
    pub entity: EntityRef,
    pub subject: SubjectId,
    pub activity: ActivityType,
    pub lecturer: LecturerId,
    pub room: RoomId,
}

impl Placement {
    /// Places `task` in `room`, taught by `lecturer`.
    pub fn new(task: &Task, room: RoomId, lecturer: LecturerId) -> Self {
        Self {
            task: task.id,
            entity: task.entity,
            subject: task.subject,
            activity: task.activity,
            lecturer,
            room,
        }
    }
}
