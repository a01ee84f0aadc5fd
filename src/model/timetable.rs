//! The weekly timetable grid and its resolved, renderer-facing view.

use super::domain::Placement;
use super::problem::Problem;
use super::types::{ActivityType, Cell, CELL_COUNT};

/// A weekly grid: each (day, slot) cell holds an ordered list of placements.
///
/// The grid always has exactly [`CELL_COUNT`] cells. A timetable may contain
/// hard-constraint violations; use
/// [`count_conflicts`](crate::occupancy::count_conflicts) to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timetable {
    cells: Vec<Vec<Placement>>,
}

impl Default for Timetable {
    fn default() -> Self {
        Self::new()
    }
}

impl Timetable {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self {
            cells: vec![Vec::new(); CELL_COUNT],
        }
    }

    /// Builds a grid from per-cell placement lists.
    ///
    /// Returns `None` unless exactly [`CELL_COUNT`] cells are given.
    pub fn from_cells(cells: Vec<Vec<Placement>>) -> Option<Self> {
        (cells.len() == CELL_COUNT).then_some(Self { cells })
    }

    /// Placements in a cell.
    pub fn placements(&self, cell: Cell) -> &[Placement] {
        &self.cells[cell.index()]
    }

    /// Appends a placement to a cell. No constraint is checked.
    pub fn add(&mut self, cell: Cell, placement: Placement) {
        self.cells[cell.index()].push(placement);
    }

    /// Removes and returns the placement at `position` within a cell.
    pub fn remove(&mut self, cell: Cell, position: usize) -> Option<Placement> {
        let list = &mut self.cells[cell.index()];
        (position < list.len()).then(|| list.remove(position))
    }

    /// Replaces the placement at `position` within a cell.
    pub fn replace(&mut self, cell: Cell, position: usize, placement: Placement) -> bool {
        match self.cells[cell.index()].get_mut(position) {
            Some(slot) => {
                *slot = placement;
                true
            }
            None => false,
        }
    }

    /// Cell contents as a slice, one entry per grid cell in index order.
    pub fn cells(&self) -> &[Vec<Placement>] {
        &self.cells
    }

    /// Mutable access to the raw cells, for operators that work on whole
    /// cells at once.
    pub(crate) fn cells_mut(&mut self) -> &mut [Vec<Placement>] {
        &mut self.cells
    }

    /// Iterates over every placement with its cell, in cell order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &Placement)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(i, list)| list.iter().map(move |p| (Cell::from_index(i), p)))
    }

    /// Total number of placements.
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Whether no cell holds a placement.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// Resolves every placement to names, sorted by (day, slot).
    pub fn entries(&self, problem: &Problem) -> Vec<ScheduleEntry> {
        self.iter()
            .map(|(cell, p)| ScheduleEntry::resolve(problem, cell, p))
            .collect()
    }

    /// Resolved placements matching `filter`, sorted by (day, slot).
    pub fn entries_for(&self, problem: &Problem, filter: &ScheduleFilter) -> Vec<ScheduleEntry> {
        self.iter()
            .filter(|(_, p)| filter.matches(problem, p))
            .map(|(cell, p)| ScheduleEntry::resolve(problem, cell, p))
            .collect()
    }
}

/// A placement resolved to names, as consumed by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleEntry {
    pub day: u8,
    pub slot: u8,
    /// Group or subgroup name (`G1`, `G1.2`).
    pub entity: String,
    pub subject: String,
    pub activity: ActivityType,
    pub lecturer: String,
    pub room: String,
    /// Students attending this placement.
    pub headcount: u32,
}

impl ScheduleEntry {
    fn resolve(problem: &Problem, cell: Cell, p: &Placement) -> Self {
        let entity = problem.entity(p.entity.id);
        Self {
            day: cell.day(),
            slot: cell.slot(),
            entity: entity.name.clone(),
            subject: problem.subject_name(p.subject).to_string(),
            activity: p.activity,
            lecturer: problem.lecturer_name(p.lecturer).to_string(),
            room: problem.room(p.room).name.clone(),
            headcount: entity.headcount,
        }
    }
}

/// Selects the part of a timetable that concerns one group, lecturer or room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleFilter {
    /// A group by name; also matches its subgroups.
    Group(String),
    /// A lecturer by name.
    Lecturer(String),
    /// A room by name.
    Room(String),
}

impl ScheduleFilter {
    fn matches(&self, problem: &Problem, p: &Placement) -> bool {
        match self {
            ScheduleFilter::Group(name) => problem.group(p.entity.group).name == *name,
            ScheduleFilter::Lecturer(name) => problem.lecturer_name(p.lecturer) == name,
            ScheduleFilter::Room(name) => problem.room(p.room).name == *name,
        }
    }
}
