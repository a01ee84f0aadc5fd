//! Search variables.

use crate::model::{Problem, TaskId};

/// The `index`-th weekly occurrence of a task.
///
/// Occurrences of one task are interchangeable, so the solver always places
/// them in increasing cell order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub task: TaskId,
    pub index: u32,
}

impl Occurrence {
    /// Every occurrence of every task, in task order.
    pub fn all(problem: &Problem) -> Vec<Occurrence> {
        problem
            .tasks()
            .iter()
            .flat_map(|t| (0..t.weekly_occurrences).map(move |index| Occurrence { task: t.id, index }))
            .collect()
    }
}
