//! Gap accounting per attendance stream.
//!
//! A stream is what one student actually sits through: a subgroup's own
//! sessions plus its parent's whole-group sessions, or simply the group's
//! sessions when it is never split. Each stream keeps a per-cell occupancy
//! count, from which a 4-bit slot mask per day is derived.

use crate::model::{Cell, EntityId, Problem, Timetable, CELL_COUNT, DAYS_PER_WEEK, SLOTS_PER_DAY};

/// Number of idle holes in one day's slot mask.
///
/// Bit `k` set means slot `k + 1` is occupied. Each pair of consecutive
/// occupied slots that are not adjacent is one gap.
///
/// ```
/// use u_timetable::fitness::count_gaps;
///
/// assert_eq!(count_gaps(0b0011), 0);
/// assert_eq!(count_gaps(0b0101), 1);
/// assert_eq!(count_gaps(0b1001), 1);
/// assert_eq!(count_gaps(0b1101), 1);
/// ```
pub fn count_gaps(mask: u8) -> u32 {
    let mut gaps = 0;
    let mut last = None;
    for slot in 0..SLOTS_PER_DAY as u32 {
        if mask & (1 << slot) == 0 {
            continue;
        }
        if let Some(prev) = last {
            if slot - prev > 1 {
                gaps += 1;
            }
        }
        last = Some(slot);
    }
    gaps
}

/// Per-stream cell occupancy counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMasks {
    counts: Vec<u16>,
}

impl StreamMasks {
    /// No stream attends anything.
    pub fn new(problem: &Problem) -> Self {
        Self {
            counts: vec![0; problem.stream_count() * CELL_COUNT],
        }
    }

    pub fn from_timetable(problem: &Problem, timetable: &Timetable) -> Self {
        let mut masks = Self::new(problem);
        for (cell, placement) in timetable.iter() {
            masks.add(problem, placement.entity.id, cell);
        }
        masks
    }

    /// Marks `entity` as attending `cell`.
    pub fn add(&mut self, problem: &Problem, entity: EntityId, cell: Cell) {
        for &stream in problem.streams_of(entity) {
            self.counts[stream * CELL_COUNT + cell.index()] += 1;
        }
    }

    /// Reverts [`StreamMasks::add`].
    pub fn remove(&mut self, problem: &Problem, entity: EntityId, cell: Cell) {
        for &stream in problem.streams_of(entity) {
            let count = &mut self.counts[stream * CELL_COUNT + cell.index()];
            *count = count.saturating_sub(1);
        }
    }

    /// Slot mask of `stream` on day `day_index` (0-based).
    pub fn day_mask(&self, stream: usize, day_index: usize) -> u8 {
        let start = stream * CELL_COUNT + day_index * SLOTS_PER_DAY;
        self.counts[start..start + SLOTS_PER_DAY]
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .fold(0u8, |mask, (slot, _)| mask | (1 << slot))
    }

    /// Gaps over every stream and day.
    pub fn total_gaps(&self) -> u64 {
        let streams = self.counts.len() / CELL_COUNT;
        (0..streams)
            .flat_map(|s| (0..DAYS_PER_WEEK).map(move |d| (s, d)))
            .map(|(s, d)| count_gaps(self.day_mask(s, d)) as u64)
            .sum()
    }

    /// Change in total gaps if `entity` also attended `cell`.
    pub fn gap_delta(&self, problem: &Problem, entity: EntityId, cell: Cell) -> i64 {
        let day = cell.day_index();
        let bit = 1u8 << cell.slot_index();
        problem
            .streams_of(entity)
            .iter()
            .map(|&stream| {
                let before = self.day_mask(stream, day);
                count_gaps(before | bit) as i64 - count_gaps(before) as i64
            })
            .sum()
    }
}
