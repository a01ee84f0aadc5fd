//! Remaining-hours ledger per (group, subject, activity).
//!
//! Each line holds the rounding residue fixed at derivation time and the
//! outstanding balance of weekly sessions, counted in half-sessions: a
//! whole-group session covers 2 halves, a subgroup session 1.
//!
//! Lines are the reporting view. The penalized balance is kept per task, so
//! a second lab for `G.1` never stands in for the missing lab of `G.2`.

use std::collections::BTreeMap;

use super::domain::Placement;
use super::problem::{Problem, ProblemConfig};
use super::timetable::Timetable;
use super::types::{ActivityType, GroupId, SubjectId, TaskId};

/// Identifies a ledger line. Subgroup placements book against their parent
/// group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerKey {
    pub group: GroupId,
    pub subject: SubjectId,
    pub activity: ActivityType,
}

impl LedgerKey {
    /// Ledger line a placement counts toward.
    pub fn of(placement: &Placement) -> Self {
        Self {
            group: placement.entity.group,
            subject: placement.subject,
            activity: placement.activity,
        }
    }
}

/// One ledger line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    pub required_halves: u32,
    pub scheduled_halves: u32,
    /// Term hours lost or gained by rounding to whole weekly sessions.
    pub residue_hours: f64,
}

impl LedgerEntry {
    /// Required minus scheduled, in half-sessions. Negative when overbooked.
    pub fn outstanding_halves(&self) -> i64 {
        self.required_halves as i64 - self.scheduled_halves as i64
    }

    /// Signed term hours still to deliver, residue included.
    pub fn remaining_term_hours(&self, config: &ProblemConfig) -> f64 {
        self.residue_hours
            + self.outstanding_halves() as f64 / 2.0 * config.hours_per_weekly_session()
    }
}

/// Weight of a placement in half-sessions.
pub fn placement_halves(placement: &Placement) -> u32 {
    if placement.entity.is_subgroup() {
        1
    } else {
        2
    }
}

/// Weekly sessions of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskBalance {
    pub required: u32,
    pub placed: u32,
    /// Half-sessions per placement.
    pub weight: u32,
}

impl TaskBalance {
    /// Required minus placed, in half-sessions. Negative when overbooked.
    pub fn outstanding_halves(&self) -> i64 {
        (self.required as i64 - self.placed as i64) * self.weight as i64
    }
}

/// The remaining-hours ledger of one timetable.
#[derive(Debug, Clone, PartialEq)]
pub struct HoursLedger {
    entries: BTreeMap<LedgerKey, LedgerEntry>,
    tasks: Vec<TaskBalance>,
}

impl HoursLedger {
    /// A ledger with nothing scheduled yet.
    pub fn new(problem: &Problem) -> Self {
        let entries = problem
            .requirements()
            .iter()
            .map(|r| {
                (
                    r.key,
                    LedgerEntry {
                        required_halves: r.required_halves,
                        scheduled_halves: 0,
                        residue_hours: r.residue_hours,
                    },
                )
            })
            .collect();
        let tasks = problem
            .tasks()
            .iter()
            .map(|t| TaskBalance {
                required: t.weekly_occurrences,
                placed: 0,
                weight: if t.entity.is_subgroup() { 1 } else { 2 },
            })
            .collect();
        Self { entries, tasks }
    }

    /// Rebuilds the ledger by scanning every cell of `timetable`.
    pub fn from_timetable(problem: &Problem, timetable: &Timetable) -> Self {
        let mut ledger = Self::new(problem);
        for (_, placement) in timetable.iter() {
            ledger.record(placement);
        }
        ledger
    }

    /// Books a placement. Placements without a ledger line are ignored.
    pub fn record(&mut self, placement: &Placement) {
        if let Some(entry) = self.entries.get_mut(&LedgerKey::of(placement)) {
            entry.scheduled_halves += placement_halves(placement);
        }
        if let Some(balance) = self.tasks.get_mut(placement.task.index()) {
            balance.placed += 1;
        }
    }

    /// Reverts [`HoursLedger::record`].
    pub fn unrecord(&mut self, placement: &Placement) {
        if let Some(entry) = self.entries.get_mut(&LedgerKey::of(placement)) {
            entry.scheduled_halves = entry
                .scheduled_halves
                .saturating_sub(placement_halves(placement));
        }
        if let Some(balance) = self.tasks.get_mut(placement.task.index()) {
            balance.placed = balance.placed.saturating_sub(1);
        }
    }

    pub fn entry(&self, key: &LedgerKey) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Lines in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&LedgerKey, &LedgerEntry)> {
        self.entries.iter()
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskBalance> {
        self.tasks.get(id.index())
    }

    /// Sum of `|outstanding|` over all tasks, in half-sessions.
    pub fn total_outstanding(&self) -> u64 {
        self.tasks
            .iter()
            .map(|b| b.outstanding_halves().unsigned_abs())
            .sum()
    }

    /// Whether every task has exactly its weekly occurrences.
    pub fn is_balanced(&self) -> bool {
        self.tasks.iter().all(|b| b.placed == b.required)
    }
}
