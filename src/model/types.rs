//! Identifiers, grid coordinates, and the resolved institutional entities.

use std::fmt;

/// Number of teaching days in the weekly grid.
pub const DAYS_PER_WEEK: usize = 5;

/// Number of teaching slots per day.
pub const SLOTS_PER_DAY: usize = 4;

/// Number of cells in the weekly grid.
pub const CELL_COUNT: usize = DAYS_PER_WEEK * SLOTS_PER_DAY;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of this id in the owning table.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

id_newtype!(
    /// Index of a student group.
    GroupId
);
id_newtype!(
    /// Index of a schedulable entity (a whole group or one of its subgroups).
    EntityId
);
id_newtype!(
    /// Index of a subject name.
    SubjectId
);
id_newtype!(
    /// Index of a lecturer.
    LecturerId
);
id_newtype!(
    /// Index of a room.
    RoomId
);
id_newtype!(
    /// Index of a task (scheduling variable).
    TaskId
);

/// Kind of teaching activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivityType {
    Lecture,
    Lab,
}

impl ActivityType {
    /// Both activity types, in declaration order.
    pub const ALL: [ActivityType; 2] = [ActivityType::Lecture, ActivityType::Lab];
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Lecture => f.write_str("Lecture"),
            ActivityType::Lab => f.write_str("Lab"),
        }
    }
}

/// A (day, slot) position in the weekly grid.
///
/// Days run `1..=5` and slots `1..=4`. Cells are ordered day-major, which is
/// also the order of [`Cell::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCell"))]
pub struct Cell {
    day: u8,
    slot: u8,
}

/// Unchecked wire form of [`Cell`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCell {
    day: u8,
    slot: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCell> for Cell {
    type Error = String;

    fn try_from(raw: RawCell) -> std::result::Result<Self, Self::Error> {
        Cell::new(raw.day, raw.slot)
            .ok_or_else(|| format!("day {} slot {} is outside the grid", raw.day, raw.slot))
    }
}

impl Cell {
    /// Creates a cell from 1-based day and slot numbers.
    ///
    /// Returns `None` when either coordinate is outside the grid.
    pub fn new(day: u8, slot: u8) -> Option<Self> {
        let valid_day = (1..=DAYS_PER_WEEK as u8).contains(&day);
        let valid_slot = (1..=SLOTS_PER_DAY as u8).contains(&slot);
        (valid_day && valid_slot).then_some(Self { day, slot })
    }

    /// Cell at a flat grid index (`0..CELL_COUNT`).
    ///
    /// # Panics
    /// Panics if `index >= CELL_COUNT`.
    pub fn from_index(index: usize) -> Self {
        assert!(index < CELL_COUNT, "cell index {index} out of range");
        Self {
            day: (index / SLOTS_PER_DAY) as u8 + 1,
            slot: (index % SLOTS_PER_DAY) as u8 + 1,
        }
    }

    /// 1-based day.
    pub fn day(self) -> u8 {
        self.day
    }

    /// 1-based slot.
    pub fn slot(self) -> u8 {
        self.slot
    }

    /// Flat grid index.
    pub fn index(self) -> usize {
        (self.day as usize - 1) * SLOTS_PER_DAY + (self.slot as usize - 1)
    }

    /// 0-based day index.
    pub fn day_index(self) -> usize {
        self.day as usize - 1
    }

    /// 0-based slot index.
    pub fn slot_index(self) -> usize {
        self.slot as usize - 1
    }

    /// Every cell of the grid in index order.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..CELL_COUNT).map(Cell::from_index)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {} slot {}", self.day, self.slot)
    }
}

/// A student group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub students: u32,
}

/// A room with its seat capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub capacity: u32,
}

/// Something that attends a teaching activity: a whole group, or one half of
/// a group split for labs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Display name: `G1` for a group, `G1.1` / `G1.2` for its subgroups.
    pub name: String,
    /// The parent (root) group.
    pub group: GroupId,
    /// Subgroup number (1 or 2), `None` for the whole group.
    pub part: Option<u8>,
    /// Students attending.
    pub headcount: u32,
}

impl Entity {
    /// Whether this entity is a subgroup.
    pub fn is_subgroup(&self) -> bool {
        self.part.is_some()
    }

    /// Compact, copyable reference used in placements.
    pub fn reference(&self, id: EntityId) -> EntityRef {
        EntityRef {
            id,
            group: self.group,
            part: self.part,
        }
    }
}

/// Copyable projection of an [`Entity`] carrying what the constraint checks
/// need: its own id and its root group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    pub id: EntityId,
    pub group: GroupId,
    pub part: Option<u8>,
}

impl EntityRef {
    /// Whether this entity is a subgroup.
    pub fn is_subgroup(self) -> bool {
        self.part.is_some()
    }
}

/// Splits a headcount between two subgroups.
///
/// Half of `students`, with the odd student (the ±0.5 balancing) going to the
/// first subgroup.
pub fn split_headcount(students: u32) -> (u32, u32) {
    let first = students.div_ceil(2);
    (first, students - first)
}
