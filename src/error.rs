//! Error taxonomy.
//!
//! Only conditions that stop a run are errors. A search that runs out of
//! budget is a degraded success and is reported through the solver status
//! instead (see [`crate::csp::SolverStatus`] and
//! [`crate::optimizer::OptimizeStatus`]).

use thiserror::Error;

/// Errors raised while building a problem or running a solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    /// Two group records share a name.
    #[error("duplicate group: {0}")]
    DuplicateGroup(String),

    /// Two room records share a name.
    #[error("duplicate room: {0}")]
    DuplicateRoom(String),

    /// A group lists the same subject twice.
    #[error("duplicate subject {subject} for group {group}")]
    DuplicateSubject { group: String, subject: String },

    /// A subject record references a group that does not exist.
    #[error("subject {subject} references unknown group {group}")]
    UnknownGroup { group: String, subject: String },

    /// A record carries a value outside its allowed range.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// One or more tasks have no qualified lecturer, so no assignment exists.
    #[error("no qualified lecturer for {} task(s): {}", tasks.len(), tasks.join(", "))]
    InfeasibleDomain { tasks: Vec<String> },

    /// The backtracking solver proved that no conflict-free timetable exists.
    #[error("search exhausted after {nodes} nodes: no conflict-free timetable exists")]
    SearchExhausted { nodes: u64 },

    /// A solver configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TimetableError>;
