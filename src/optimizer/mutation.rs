//! Cell-level mutation operators.
//!
//! Each operator is a pure function of a timetable and a target cell. A
//! proposal is validated against lecturer qualification, the task table,
//! room capacity and the occupancy of the cell it lands in; a proposal that
//! fails any check is rejected with [`InvalidMutationTarget`] and the caller
//! keeps the timetable unchanged.

use rand::prelude::IndexedRandom;
use rand::Rng;
use thiserror::Error;

use crate::model::{Cell, LecturerId, Placement, Problem, RoomId, TaskId, Timetable};
use crate::occupancy::CellOccupancy;

/// A change applied to one cell of a timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOp {
    /// Teach another subject of the same group in the same slot, one that
    /// is still short of its weekly occurrences.
    ChangeSubject,
    /// Hand a placement to another qualified lecturer.
    ChangeLecturer,
    /// Move a placement to another room that fits.
    ChangeRoom,
    /// Move a placement to another cell.
    Move,
    /// Schedule an occurrence that is still missing.
    Add,
    /// Drop a placement.
    Delete,
}

impl MutationOp {
    pub const ALL: [MutationOp; 6] = [
        MutationOp::ChangeSubject,
        MutationOp::ChangeLecturer,
        MutationOp::ChangeRoom,
        MutationOp::Move,
        MutationOp::Add,
        MutationOp::Delete,
    ];

    /// Uniformly random operator.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Why a proposed mutation was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(super) enum InvalidMutationTarget {
    #[error("cell holds no placement")]
    EmptyCell,
    #[error("group has no other subject with this activity still missing")]
    NoOtherSubject,
    #[error("no other qualified lecturer is free")]
    NoLecturer,
    #[error("no other room fits")]
    NoRoom,
    #[error("no other cell can take the placement")]
    NoCell,
    #[error("every occurrence that fits is already scheduled")]
    NothingMissing,
    #[error("replacement collides with the cell")]
    Occupied,
}

type Outcome = Result<Timetable, InvalidMutationTarget>;

/// Applies `op` to `cell`, returning the mutated copy of `timetable`.
pub(super) fn apply<R: Rng>(
    problem: &Problem,
    timetable: &Timetable,
    cell: Cell,
    op: MutationOp,
    rng: &mut R,
) -> Outcome {
    let cx = Context { problem, timetable };
    match op {
        MutationOp::ChangeSubject => cx.change_subject(cell, rng),
        MutationOp::ChangeLecturer => cx.change_lecturer(cell, rng),
        MutationOp::ChangeRoom => cx.change_room(cell, rng),
        MutationOp::Move => cx.move_placement(cell, rng),
        MutationOp::Add => cx.add(cell, rng),
        MutationOp::Delete => cx.delete(cell, rng),
    }
}

struct Context<'a> {
    problem: &'a Problem,
    timetable: &'a Timetable,
}

impl Context<'_> {
    /// Occupancy of `cell`, leaving out the placement at `skip`.
    fn occupancy(&self, cell: Cell, skip: Option<usize>) -> CellOccupancy {
        let mut occ = CellOccupancy::default();
        for (i, p) in self.timetable.placements(cell).iter().enumerate() {
            if Some(i) != skip {
                occ.commit(p);
            }
        }
        occ
    }

    fn fits(&self, occ: &CellOccupancy, placement: &Placement) -> bool {
        let config = self.problem.config();
        !occ
            .violations(placement, config.subgroup_policy, config.room_sharing)
            .contains(&true)
    }

    fn victim<R: Rng>(
        &self,
        cell: Cell,
        rng: &mut R,
    ) -> Result<(usize, Placement), InvalidMutationTarget> {
        let list = self.timetable.placements(cell);
        if list.is_empty() {
            return Err(InvalidMutationTarget::EmptyCell);
        }
        let pos = rng.random_range(0..list.len());
        Ok((pos, list[pos]))
    }

    fn replaced(&self, cell: Cell, pos: usize, placement: Placement) -> Timetable {
        let mut next = self.timetable.clone();
        next.replace(cell, pos, placement);
        next
    }

    fn free_lecturers(
        &self,
        occ: &CellOccupancy,
        qualified: &[LecturerId],
        except: Option<LecturerId>,
    ) -> Vec<LecturerId> {
        qualified
            .iter()
            .copied()
            .filter(|&l| Some(l) != except && occ.lecturer_free(l))
            .collect()
    }

    /// Rooms free in `occ` that seat everyone attending `placement`.
    fn fitting_rooms(
        &self,
        occ: &CellOccupancy,
        placement: &Placement,
        except: Option<RoomId>,
    ) -> Vec<RoomId> {
        let headcount = self.problem.headcount(placement.entity);
        let sharing = self.problem.config().room_sharing;
        self.problem
            .domain(placement.task)
            .rooms
            .iter()
            .copied()
            .filter(|&r| {
                Some(r) != except
                    && self.problem.room(r).capacity >= headcount
                    && occ.room_available(r, placement.activity, sharing)
            })
            .collect()
    }

    /// Placements per task.
    fn placed_counts(&self) -> Vec<u32> {
        let mut placed = vec![0u32; self.problem.tasks().len()];
        for (_, p) in self.timetable.iter() {
            placed[p.task.index()] += 1;
        }
        placed
    }

    fn change_subject<R: Rng>(&self, cell: Cell, rng: &mut R) -> Outcome {
        let (pos, old) = self.victim(cell, rng)?;
        let placed = self.placed_counts();
        let alternatives: Vec<TaskId> = self
            .problem
            .subjects_of(old.entity.group)
            .iter()
            .filter(|&&s| s != old.subject)
            .filter_map(|&s| self.problem.task_for(old.entity.id, s, old.activity))
            .filter(|id| placed[id.index()] < self.problem.task(*id).weekly_occurrences)
            .collect();
        let id = *alternatives
            .choose(rng)
            .ok_or(InvalidMutationTarget::NoOtherSubject)?;
        let task = self.problem.task(id);

        let occ = self.occupancy(cell, Some(pos));
        let lecturer = if self.problem.is_qualified(old.lecturer, task.subject, task.activity) {
            old.lecturer
        } else {
            let qualified = &self.problem.domain(task.id).lecturers;
            *self
                .free_lecturers(&occ, qualified, None)
                .choose(rng)
                .ok_or(InvalidMutationTarget::NoLecturer)?
        };
        let placement = Placement::new(task, old.room, lecturer);
        if !self.fits(&occ, &placement) {
            return Err(InvalidMutationTarget::Occupied);
        }
        Ok(self.replaced(cell, pos, placement))
    }

    fn change_lecturer<R: Rng>(&self, cell: Cell, rng: &mut R) -> Outcome {
        let (pos, old) = self.victim(cell, rng)?;
        let occ = self.occupancy(cell, Some(pos));
        let qualified = &self.problem.domain(old.task).lecturers;
        let lecturer = *self
            .free_lecturers(&occ, qualified, Some(old.lecturer))
            .choose(rng)
            .ok_or(InvalidMutationTarget::NoLecturer)?;
        let placement = Placement { lecturer, ..old };
        if !self.fits(&occ, &placement) {
            return Err(InvalidMutationTarget::Occupied);
        }
        Ok(self.replaced(cell, pos, placement))
    }

    fn change_room<R: Rng>(&self, cell: Cell, rng: &mut R) -> Outcome {
        let (pos, old) = self.victim(cell, rng)?;
        let occ = self.occupancy(cell, Some(pos));
        let room = *self
            .fitting_rooms(&occ, &old, Some(old.room))
            .choose(rng)
            .ok_or(InvalidMutationTarget::NoRoom)?;
        let placement = Placement { room, ..old };
        if !self.fits(&occ, &placement) {
            return Err(InvalidMutationTarget::Occupied);
        }
        Ok(self.replaced(cell, pos, placement))
    }

    fn move_placement<R: Rng>(&self, cell: Cell, rng: &mut R) -> Outcome {
        let (pos, placement) = self.victim(cell, rng)?;
        let targets: Vec<Cell> = Cell::all()
            .filter(|&c| c != cell && self.fits(&self.occupancy(c, None), &placement))
            .collect();
        let target = *targets.choose(rng).ok_or(InvalidMutationTarget::NoCell)?;
        let mut next = self.timetable.clone();
        next.remove(cell, pos);
        next.add(target, placement);
        Ok(next)
    }

    fn add<R: Rng>(&self, cell: Cell, rng: &mut R) -> Outcome {
        let placed = self.placed_counts();
        let occ = self.occupancy(cell, None);
        let policy = self.problem.config().subgroup_policy;
        let missing: Vec<TaskId> = self
            .problem
            .tasks()
            .iter()
            .filter(|t| {
                placed[t.id.index()] < t.weekly_occurrences && occ.entity_free(t.entity, policy)
            })
            .map(|t| t.id)
            .collect();
        let id = *missing
            .choose(rng)
            .ok_or(InvalidMutationTarget::NothingMissing)?;
        let task = self.problem.task(id);

        let lecturer = *self
            .free_lecturers(&occ, &self.problem.domain(task.id).lecturers, None)
            .choose(rng)
            .ok_or(InvalidMutationTarget::NoLecturer)?;
        // Room is a placeholder until a fitting one is drawn.
        let draft = Placement::new(task, RoomId(0), lecturer);
        let room = *self
            .fitting_rooms(&occ, &draft, None)
            .choose(rng)
            .ok_or(InvalidMutationTarget::NoRoom)?;
        let placement = Placement { room, ..draft };
        if !self.fits(&occ, &placement) {
            return Err(InvalidMutationTarget::Occupied);
        }
        let mut next = self.timetable.clone();
        next.add(cell, placement);
        Ok(next)
    }

    fn delete<R: Rng>(&self, cell: Cell, rng: &mut R) -> Outcome {
        let (pos, _) = self.victim(cell, rng)?;
        let mut next = self.timetable.clone();
        next.remove(cell, pos);
        Ok(next)
    }
}
