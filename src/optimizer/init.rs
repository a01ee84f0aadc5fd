//! Randomized greedy construction of initial timetables.

use std::collections::VecDeque;

use log::trace;
use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Cell, LecturerId, Placement, Problem, RoomId, Task, TaskId, Timetable};
use crate::occupancy::OccupancyIndex;

/// Builds a hard-feasible, possibly incomplete timetable.
///
/// The weekly occurrences of all tasks are shuffled into a queue. Cells are
/// filled in grid order; within a cell every queued occurrence is tried once
/// with a random free qualified lecturer and a random available room, and
/// requeued for a later cell when it does not fit. Occurrences still queued
/// after the last cell stay unplaced and show up in the ledger.
pub fn greedy_timetable<R: Rng>(problem: &Problem, rng: &mut R) -> Timetable {
    let mut occurrences: Vec<TaskId> = problem
        .tasks()
        .iter()
        .flat_map(|t| std::iter::repeat(t.id).take(t.weekly_occurrences as usize))
        .collect();
    occurrences.shuffle(rng);
    let mut queue: VecDeque<TaskId> = occurrences.into();

    let mut index = OccupancyIndex::for_problem(problem);
    let mut timetable = Timetable::new();

    for cell in Cell::all() {
        if queue.is_empty() {
            break;
        }
        for _ in 0..queue.len() {
            let Some(id) = queue.pop_front() else {
                break;
            };
            match pick(problem, &index, cell, problem.task(id), rng) {
                Some(placement) => {
                    index.commit(cell, &placement);
                    timetable.add(cell, placement);
                }
                None => queue.push_back(id),
            }
        }
    }

    if !queue.is_empty() {
        trace!(
            "greedy placement left {} of {} occurrence(s) unplaced",
            queue.len(),
            problem.total_occurrences()
        );
    }
    timetable
}

/// A random legal placement of `task` in `cell`, if one exists.
fn pick<R: Rng>(
    problem: &Problem,
    index: &OccupancyIndex,
    cell: Cell,
    task: &Task,
    rng: &mut R,
) -> Option<Placement> {
    if !index.entity_free(cell, task.entity) {
        return None;
    }
    let domain = problem.domain(task.id);
    let lecturers: Vec<LecturerId> = domain
        .lecturers
        .iter()
        .copied()
        .filter(|&l| index.lecturer_free(cell, l))
        .collect();
    let rooms: Vec<RoomId> = domain
        .rooms
        .iter()
        .copied()
        .filter(|&r| index.room_available(cell, r, task.activity))
        .collect();

    let lecturer = *lecturers.choose(rng)?;
    let room = *rooms.choose(rng)?;
    let placement = Placement::new(task, room, lecturer);
    index.is_legal(cell, &placement).then_some(placement)
}
