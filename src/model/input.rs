//! Institutional input records.
//!
//! The engine consumes four order-insensitive record streams: groups,
//! subjects, lecturer qualifications, and rooms. Loading them from files is
//! left to the caller; with the `serde` feature the records deserialize from
//! the usual flat-file column names (`GroupName`, `NumStudents`, ...).

use std::collections::HashSet;

use super::types::ActivityType;
use crate::error::{Result, TimetableError};

/// A student group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupRecord {
    #[cfg_attr(feature = "serde", serde(rename = "GroupName"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "NumStudents"))]
    pub students: u32,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>, students: u32) -> Self {
        Self {
            name: name.into(),
            students,
        }
    }
}

/// A subject taught to one group, with its term hours.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct SubjectRecord {
    #[cfg_attr(feature = "serde", serde(rename = "GroupName"))]
    pub group: String,
    pub subject: String,
    pub lecture_hours: u32,
    pub lab_hours: u32,
    /// Whether labs are taught to two half-size subgroups.
    #[cfg_attr(feature = "serde", serde(with = "yes_no"))]
    pub needs_division: bool,
}

impl SubjectRecord {
    pub fn new(
        group: impl Into<String>,
        subject: impl Into<String>,
        lecture_hours: u32,
        lab_hours: u32,
        needs_division: bool,
    ) -> Self {
        Self {
            group: group.into(),
            subject: subject.into(),
            lecture_hours,
            lab_hours,
            needs_division,
        }
    }
}

/// One qualification of a lecturer. A lecturer appears once per
/// (subject, activity) pair they can teach.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct QualificationRecord {
    pub lecturer: String,
    pub subject: String,
    #[cfg_attr(feature = "serde", serde(rename = "ActivityType", alias = "ClassType"))]
    pub activity: ActivityType,
}

impl QualificationRecord {
    pub fn new(
        lecturer: impl Into<String>,
        subject: impl Into<String>,
        activity: ActivityType,
    ) -> Self {
        Self {
            lecturer: lecturer.into(),
            subject: subject.into(),
            activity,
        }
    }
}

/// A room and its seat capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomRecord {
    #[cfg_attr(feature = "serde", serde(rename = "Room"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "Capacity"))]
    pub capacity: u32,
}

impl RoomRecord {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

/// All institutional data a problem is built from.
///
/// # Examples
///
/// ```
/// use u_timetable::model::{ActivityType, Institution};
///
/// let institution = Institution::new()
///     .with_group("G1", 20)
///     .with_subject("G1", "Math", 15, 0, false)
///     .with_qualification("Dr. Smith", "Math", ActivityType::Lecture)
///     .with_room("R1", 30);
/// assert!(institution.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Institution {
    pub groups: Vec<GroupRecord>,
    pub subjects: Vec<SubjectRecord>,
    pub lecturers: Vec<QualificationRecord>,
    pub rooms: Vec<RoomRecord>,
}

impl Institution {
    /// Creates an empty institution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group.
    pub fn with_group(mut self, name: impl Into<String>, students: u32) -> Self {
        self.groups.push(GroupRecord::new(name, students));
        self
    }

    /// Adds a subject row for a group.
    pub fn with_subject(
        mut self,
        group: impl Into<String>,
        subject: impl Into<String>,
        lecture_hours: u32,
        lab_hours: u32,
        needs_division: bool,
    ) -> Self {
        self.subjects.push(SubjectRecord::new(
            group,
            subject,
            lecture_hours,
            lab_hours,
            needs_division,
        ));
        self
    }

    /// Adds a lecturer qualification.
    pub fn with_qualification(
        mut self,
        lecturer: impl Into<String>,
        subject: impl Into<String>,
        activity: ActivityType,
    ) -> Self {
        self.lecturers
            .push(QualificationRecord::new(lecturer, subject, activity));
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, name: impl Into<String>, capacity: u32) -> Self {
        self.rooms.push(RoomRecord::new(name, capacity));
        self
    }

    /// Checks structural integrity of the records.
    ///
    /// Checks, in order:
    /// 1. Group names are unique and every group has at least one student
    /// 2. Room names are unique and every room has at least one seat
    /// 3. Every subject row references an existing group
    /// 4. No group lists the same subject twice
    /// 5. There is at least one room when any subject is listed
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut group_names = HashSet::new();
        for group in &self.groups {
            if !group_names.insert(group.name.as_str()) {
                return Err(TimetableError::DuplicateGroup(group.name.clone()));
            }
            if group.students == 0 {
                return Err(TimetableError::InvalidData(format!(
                    "group {} has no students",
                    group.name
                )));
            }
        }

        let mut room_names = HashSet::new();
        for room in &self.rooms {
            if !room_names.insert(room.name.as_str()) {
                return Err(TimetableError::DuplicateRoom(room.name.clone()));
            }
            if room.capacity == 0 {
                return Err(TimetableError::InvalidData(format!(
                    "room {} has zero capacity",
                    room.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if !group_names.contains(subject.group.as_str()) {
                return Err(TimetableError::UnknownGroup {
                    group: subject.group.clone(),
                    subject: subject.subject.clone(),
                });
            }
            if !seen.insert((subject.group.as_str(), subject.subject.as_str())) {
                return Err(TimetableError::DuplicateSubject {
                    group: subject.group.clone(),
                    subject: subject.subject.clone(),
                });
            }
        }

        if self.rooms.is_empty() && !self.subjects.is_empty() {
            return Err(TimetableError::InvalidData(
                "subjects are listed but there are no rooms".into(),
            ));
        }

        Ok(())
    }
}

/// `NeedsDivision` arrives as `Yes`/`No` in flat files and as a bool in
/// structured formats.
#[cfg(feature = "serde")]
mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" | "1" => Ok(true),
                "no" | "n" | "false" | "0" | "" => Ok(false),
                other => Err(serde::de::Error::custom(format!(
                    "expected Yes/No, got {other:?}"
                ))),
            },
        }
    }
}
