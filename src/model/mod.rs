//! Problem model: input records, derived tasks and domains, the timetable
//! grid, and its remaining-hours ledger.

mod domain;
mod input;
mod ledger;
mod problem;
mod timetable;
mod types;

pub use domain::{Assignment, Domain, Placement, Task};
pub use input::{GroupRecord, Institution, QualificationRecord, RoomRecord, SubjectRecord};
pub use ledger::{placement_halves, HoursLedger, LedgerEntry, LedgerKey, TaskBalance};
pub use problem::{Problem, ProblemConfig, Requirement};
pub use timetable::{ScheduleEntry, ScheduleFilter, Timetable};
pub use types::{
    split_headcount, ActivityType, Cell, Entity, EntityId, EntityRef, Group, GroupId, LecturerId,
    Room, RoomId, SubjectId, TaskId, CELL_COUNT, DAYS_PER_WEEK, SLOTS_PER_DAY,
};
