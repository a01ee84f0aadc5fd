//! Problem formulation: tasks and domains derived from institutional data.
//!
//! # Derivation
//!
//! For every subject row of a group:
//! - one Lecture task for the whole group;
//! - if the subject has lab hours: one Lab task per subgroup (`G.1`, `G.2`)
//!   when the subject needs division, otherwise one Lab task for the group.
//!
//! Each task repeats `round(hours / (session_hours × weeks))` times per
//! week. Its domain is every room × every lecturer qualified for the
//! (subject, activity) pair × every cell. A task without a qualified
//! lecturer keeps an empty domain; [`Problem::validate_domains`] reports all
//! of them together.

use std::collections::HashMap;

use log::warn;

use super::domain::{Domain, Task};
use super::input::Institution;
use super::ledger::LedgerKey;
use super::timetable::{ScheduleEntry, ScheduleFilter, Timetable};
use super::types::{
    split_headcount, ActivityType, Entity, EntityId, EntityRef, Group, GroupId, LecturerId, Room,
    RoomId, SubjectId, TaskId,
};
use crate::error::{Result, TimetableError};
use crate::occupancy::{RoomSharing, SubgroupPolicy};

/// Problem-wide parameters.
///
/// # Examples
///
/// ```
/// use u_timetable::model::ProblemConfig;
/// use u_timetable::occupancy::SubgroupPolicy;
///
/// let config = ProblemConfig::default()
///     .with_weeks(16)
///     .with_subgroup_policy(SubgroupPolicy::Exclusive);
/// assert_eq!(config.weeks, 16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemConfig {
    /// Teaching weeks in the term.
    pub weeks: u32,
    /// Academic hours covered by one session (one grid slot).
    pub session_hours: f64,
    /// Whether the two subgroups of a group may be taught at the same time.
    pub subgroup_policy: SubgroupPolicy,
    /// Whether lecture rooms may be shared by simultaneous lectures.
    pub room_sharing: RoomSharing,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            weeks: 14,
            session_hours: 1.5,
            subgroup_policy: SubgroupPolicy::default(),
            room_sharing: RoomSharing::default(),
        }
    }
}

impl ProblemConfig {
    /// Sets the number of teaching weeks.
    pub fn with_weeks(mut self, weeks: u32) -> Self {
        self.weeks = weeks;
        self
    }

    /// Sets the hours per session.
    pub fn with_session_hours(mut self, hours: f64) -> Self {
        self.session_hours = hours;
        self
    }

    /// Sets the subgroup parallelism policy.
    pub fn with_subgroup_policy(mut self, policy: SubgroupPolicy) -> Self {
        self.subgroup_policy = policy;
        self
    }

    /// Sets the room sharing policy.
    pub fn with_room_sharing(mut self, sharing: RoomSharing) -> Self {
        self.room_sharing = sharing;
        self
    }

    /// Term hours delivered by one weekly session.
    pub fn hours_per_weekly_session(&self) -> f64 {
        self.session_hours * self.weeks as f64
    }

    /// Splits term hours into weekly sessions and the signed rounding residue.
    pub fn weekly_occurrences(&self, term_hours: u32) -> (u32, f64) {
        let per_session = self.hours_per_weekly_session();
        let occurrences = (term_hours as f64 / per_session).round() as u32;
        let residue = term_hours as f64 - occurrences as f64 * per_session;
        (occurrences, residue)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.weeks == 0 {
            return Err("weeks must be at least 1".into());
        }
        if !(self.session_hours.is_finite() && self.session_hours > 0.0) {
            return Err("session_hours must be positive".into());
        }
        Ok(())
    }
}

/// Required weekly sessions for one (group, subject, activity) ledger line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requirement {
    pub key: LedgerKey,
    /// Required sessions in half-session units (a whole-group session is 2).
    pub required_halves: u32,
    /// Rounding residue in term hours.
    pub residue_hours: f64,
}

/// A fully derived timetabling problem.
///
/// Immutable after construction; both solvers borrow it.
#[derive(Debug, Clone)]
pub struct Problem {
    config: ProblemConfig,
    groups: Vec<Group>,
    entities: Vec<Entity>,
    subjects: Vec<String>,
    lecturers: Vec<String>,
    rooms: Vec<Room>,
    qualified: HashMap<(SubjectId, ActivityType), Vec<LecturerId>>,
    tasks: Vec<Task>,
    domains: Vec<Domain>,
    task_index: HashMap<(EntityId, SubjectId, ActivityType), TaskId>,
    group_subjects: Vec<Vec<SubjectId>>,
    entity_streams: Vec<Vec<usize>>,
    stream_count: usize,
    requirements: Vec<Requirement>,
}

impl Problem {
    /// Derives tasks and domains from institutional data.
    ///
    /// Fails on invalid input records or configuration. Tasks with empty
    /// domains are allowed here; see [`Problem::validate_domains`].
    pub fn new(institution: &Institution, config: ProblemConfig) -> Result<Self> {
        institution.validate()?;
        config.validate().map_err(TimetableError::InvalidConfig)?;

        let groups: Vec<Group> = institution
            .groups
            .iter()
            .map(|g| Group {
                name: g.name.clone(),
                students: g.students,
            })
            .collect();
        let group_ids: HashMap<&str, GroupId> = institution
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.as_str(), GroupId::from_index(i)))
            .collect();

        let mut subjects = Interner::default();
        for row in &institution.subjects {
            subjects.intern(&row.subject);
        }
        let mut lecturers = Interner::default();
        let mut qualified: HashMap<(SubjectId, ActivityType), Vec<LecturerId>> = HashMap::new();
        for row in &institution.lecturers {
            let subject = SubjectId::from_index(subjects.intern(&row.subject));
            let lecturer = LecturerId::from_index(lecturers.intern(&row.lecturer));
            let list = qualified.entry((subject, row.activity)).or_default();
            if !list.contains(&lecturer) {
                list.push(lecturer);
            }
        }

        let rooms: Vec<Room> = institution
            .rooms
            .iter()
            .map(|r| Room {
                name: r.name.clone(),
                capacity: r.capacity,
            })
            .collect();
        let all_rooms: Vec<RoomId> = (0..rooms.len()).map(RoomId::from_index).collect();

        // Whole-group entities share their group's index.
        let mut entities: Vec<Entity> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| Entity {
                name: g.name.clone(),
                group: GroupId::from_index(i),
                part: None,
                headcount: g.students,
            })
            .collect();
        let mut subgroups: HashMap<GroupId, [EntityId; 2]> = HashMap::new();
        for row in &institution.subjects {
            if !(row.needs_division && row.lab_hours > 0) {
                continue;
            }
            let group = group_ids[row.group.as_str()];
            subgroups.entry(group).or_insert_with(|| {
                let parent = &groups[group.index()];
                let (first, second) = split_headcount(parent.students);
                let mut ids = [EntityId(0); 2];
                for (k, headcount) in [first, second].into_iter().enumerate() {
                    ids[k] = EntityId::from_index(entities.len());
                    entities.push(Entity {
                        name: format!("{}.{}", parent.name, k + 1),
                        group,
                        part: Some(k as u8 + 1),
                        headcount,
                    });
                }
                ids
            });
        }

        let mut tasks = Vec::new();
        let mut domains = Vec::new();
        let mut task_index = HashMap::new();
        let mut group_subjects: Vec<Vec<SubjectId>> = vec![Vec::new(); groups.len()];
        let mut requirements = Vec::new();

        let mut push_task = |entity: EntityId, subject: SubjectId, activity: ActivityType, hours: u32| {
            let (weekly_occurrences, residue_hours) = config.weekly_occurrences(hours);
            let id = TaskId::from_index(tasks.len());
            let lecturers = qualified.get(&(subject, activity)).cloned().unwrap_or_default();
            tasks.push(Task {
                id,
                entity: entities[entity.index()].reference(entity),
                subject,
                activity,
                weekly_occurrences,
                residue_hours,
            });
            domains.push(Domain {
                rooms: all_rooms.clone(),
                lecturers,
            });
            task_index.insert((entity, subject, activity), id);
            (weekly_occurrences, residue_hours)
        };

        for row in &institution.subjects {
            let group = group_ids[row.group.as_str()];
            let whole = EntityId::from_index(group.index());
            let subject = SubjectId::from_index(subjects.intern(&row.subject));
            group_subjects[group.index()].push(subject);

            let (occurrences, residue_hours) =
                push_task(whole, subject, ActivityType::Lecture, row.lecture_hours);
            requirements.push(Requirement {
                key: LedgerKey {
                    group,
                    subject,
                    activity: ActivityType::Lecture,
                },
                required_halves: 2 * occurrences,
                residue_hours,
            });

            if row.lab_hours == 0 {
                continue;
            }
            let lab_key = LedgerKey {
                group,
                subject,
                activity: ActivityType::Lab,
            };
            if row.needs_division {
                let mut lab = (0, 0.0);
                for part in subgroups[&group] {
                    lab = push_task(part, subject, ActivityType::Lab, row.lab_hours);
                }
                // Each subgroup session counts one half toward the group line.
                requirements.push(Requirement {
                    key: lab_key,
                    required_halves: 2 * lab.0,
                    residue_hours: lab.1,
                });
            } else {
                let (occurrences, residue_hours) =
                    push_task(whole, subject, ActivityType::Lab, row.lab_hours);
                requirements.push(Requirement {
                    key: lab_key,
                    required_halves: 2 * occurrences,
                    residue_hours,
                });
            }
        }

        // Attendance streams for gap accounting: each subgroup, or the whole
        // group when it is never split.
        let mut entity_streams: Vec<Vec<usize>> = vec![Vec::new(); entities.len()];
        let mut stream_count = 0;
        for g in 0..groups.len() {
            let group = GroupId::from_index(g);
            match subgroups.get(&group) {
                Some(parts) => {
                    for part in parts {
                        entity_streams[part.index()].push(stream_count);
                        entity_streams[g].push(stream_count);
                        stream_count += 1;
                    }
                }
                None => {
                    entity_streams[g].push(stream_count);
                    stream_count += 1;
                }
            }
        }

        let problem = Self {
            config,
            groups,
            entities,
            subjects: subjects.names,
            lecturers: lecturers.names,
            rooms,
            qualified,
            tasks,
            domains,
            task_index,
            group_subjects,
            entity_streams,
            stream_count,
            requirements,
        };

        let infeasible = problem.infeasible_tasks();
        if !infeasible.is_empty() {
            warn!(
                "{} task(s) have no qualified lecturer and cannot be scheduled",
                infeasible.len()
            );
        }
        Ok(problem)
    }

    /// Problem-wide parameters.
    pub fn config(&self) -> &ProblemConfig {
        &self.config
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    /// Whole groups first (sharing their group's index), then subgroups.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    pub fn subject_name(&self, id: SubjectId) -> &str {
        &self.subjects[id.index()]
    }

    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    pub fn lecturer_name(&self, id: LecturerId) -> &str {
        &self.lecturers[id.index()]
    }

    pub fn lecturer_count(&self) -> usize {
        self.lecturers.len()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.index()]
    }

    /// Scheduling variables, in derivation order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }

    /// Legal assignments of a task before inter-task conflicts.
    pub fn domain(&self, id: TaskId) -> &Domain {
        &self.domains[id.index()]
    }

    /// Lecturers qualified for a (subject, activity) pair.
    pub fn qualified_lecturers(&self, subject: SubjectId, activity: ActivityType) -> &[LecturerId] {
        self.qualified
            .get(&(subject, activity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `lecturer` may teach `activity` of `subject`.
    pub fn is_qualified(
        &self,
        lecturer: LecturerId,
        subject: SubjectId,
        activity: ActivityType,
    ) -> bool {
        self.qualified_lecturers(subject, activity).contains(&lecturer)
    }

    /// The task teaching `subject` as `activity` to `entity`, if one exists.
    pub fn task_for(
        &self,
        entity: EntityId,
        subject: SubjectId,
        activity: ActivityType,
    ) -> Option<TaskId> {
        self.task_index.get(&(entity, subject, activity)).copied()
    }

    /// Subjects taught to a group.
    pub fn subjects_of(&self, group: GroupId) -> &[SubjectId] {
        &self.group_subjects[group.index()]
    }

    /// Attendance streams an entity's sessions count toward.
    pub fn streams_of(&self, entity: EntityId) -> &[usize] {
        &self.entity_streams[entity.index()]
    }

    /// Number of attendance streams.
    pub fn stream_count(&self) -> usize {
        self.stream_count
    }

    /// Ledger lines with their required sessions.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Students attending a placement of `entity`.
    pub fn headcount(&self, entity: EntityRef) -> u32 {
        self.entities[entity.id.index()].headcount
    }

    /// Total weekly occurrences over all tasks.
    pub fn total_occurrences(&self) -> usize {
        self.tasks
            .iter()
            .map(|t| t.weekly_occurrences as usize)
            .sum()
    }

    /// Readable task label, e.g. `G1.2/Physics (Lab)`.
    pub fn task_label(&self, id: TaskId) -> String {
        let task = self.task(id);
        format!(
            "{}/{} ({})",
            self.entity(task.entity.id).name,
            self.subject_name(task.subject),
            task.activity
        )
    }

    /// Resolves every placement of `timetable` to names, sorted by (day, slot).
    pub fn resolve(&self, timetable: &Timetable) -> Vec<ScheduleEntry> {
        timetable.entries(self)
    }

    /// Resolved placements for one group, lecturer or room.
    pub fn resolve_for(&self, timetable: &Timetable, filter: &ScheduleFilter) -> Vec<ScheduleEntry> {
        timetable.entries_for(self, filter)
    }

    /// Tasks with weekly sessions to place but an empty domain.
    pub fn infeasible_tasks(&self) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|t| t.weekly_occurrences > 0 && self.domains[t.id.index()].is_empty())
            .map(|t| t.id)
            .collect()
    }

    /// Fails with [`TimetableError::InfeasibleDomain`] naming every task that
    /// cannot be placed.
    pub fn validate_domains(&self) -> Result<()> {
        let infeasible = self.infeasible_tasks();
        if infeasible.is_empty() {
            Ok(())
        } else {
            Err(TimetableError::InfeasibleDomain {
                tasks: infeasible.into_iter().map(|t| self.task_label(t)).collect(),
            })
        }
    }
}

#[derive(Default)]
struct Interner {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Interner {
    fn intern(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn institution() -> Institution {
        Institution::new()
            .with_group("G1", 40)
            .with_group("G2", 25)
            .with_subject("G1", "Math", 21, 21, true)
            .with_subject("G1", "Physics", 42, 0, false)
            .with_subject("G2", "Math", 21, 21, false)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_qualification("L2", "Math", ActivityType::Lab)
            .with_qualification("L2", "Physics", ActivityType::Lecture)
            .with_room("R1", 30)
            .with_room("R2", 50)
    }

    #[test]
    fn test_task_derivation() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        let labels: Vec<String> = p.tasks().iter().map(|t| p.task_label(t.id)).collect();
        assert_eq!(
            labels,
            vec![
                "G1/Math (Lecture)",
                "G1.1/Math (Lab)",
                "G1.2/Math (Lab)",
                "G1/Physics (Lecture)",
                "G2/Math (Lecture)",
                "G2/Math (Lab)",
            ]
        );
    }

    #[test]
    fn test_subgroups_split_headcount() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        let subs: Vec<&Entity> = p.entities().iter().filter(|e| e.is_subgroup()).collect();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].name, "G1.1");
        assert_eq!(subs[0].headcount, 20);
        assert_eq!(subs[1].headcount, 20);
        assert!(subs.iter().all(|e| e.group == GroupId(0)));
    }

    #[test]
    fn test_lab_omitted_without_hours() {
        let inst = Institution::new()
            .with_group("G1", 20)
            .with_subject("G1", "Math", 21, 0, true)
            .with_qualification("L1", "Math", ActivityType::Lecture)
            .with_room("R1", 30);
        let p = Problem::new(&inst, ProblemConfig::default()).unwrap();
        assert_eq!(p.tasks().len(), 1);
        assert_eq!(p.tasks()[0].activity, ActivityType::Lecture);
        assert_eq!(p.entities().len(), 1, "no subgroups without lab hours");
    }

    #[test]
    fn test_weekly_occurrences_and_residue() {
        let config = ProblemConfig::default();
        assert_eq!(config.hours_per_weekly_session(), 21.0);

        let (n, residue) = config.weekly_occurrences(15);
        assert_eq!(n, 1);
        assert!((residue - (-6.0)).abs() < 1e-9);

        let (n, residue) = config.weekly_occurrences(50);
        assert_eq!(n, 2);
        assert!((residue - 8.0).abs() < 1e-9);

        let (n, residue) = config.weekly_occurrences(5);
        assert_eq!(n, 0);
        assert!((residue - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_domain_is_rooms_times_qualified() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        let lecture = &p.tasks()[0];
        let domain = p.domain(lecture.id);
        assert_eq!(domain.rooms.len(), 2);
        assert_eq!(domain.lecturers.len(), 1);
        assert_eq!(p.lecturer_name(domain.lecturers[0]), "L1");
        assert_eq!(domain.len(), 2 * 20);
    }

    #[test]
    fn test_infeasible_domains_reported_together() {
        let inst = institution()
            .with_subject("G2", "Chemistry", 21, 21, true)
            .with_subject("G2", "Biology", 21, 0, false);
        let p = Problem::new(&inst, ProblemConfig::default()).unwrap();
        assert_eq!(p.infeasible_tasks().len(), 4);
        match p.validate_domains() {
            Err(TimetableError::InfeasibleDomain { tasks }) => {
                assert!(tasks.contains(&"G2/Chemistry (Lecture)".to_string()));
                assert!(tasks.contains(&"G2.1/Chemistry (Lab)".to_string()));
                assert!(tasks.contains(&"G2.2/Chemistry (Lab)".to_string()));
                assert!(tasks.contains(&"G2/Biology (Lecture)".to_string()));
            }
            other => panic!("expected InfeasibleDomain, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_domains_ok() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        assert!(p.validate_domains().is_ok());
    }

    #[test]
    fn test_requirements_use_half_sessions() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        let divided_lab = p
            .requirements()
            .iter()
            .find(|r| r.key.group == GroupId(0) && r.key.activity == ActivityType::Lab)
            .unwrap();
        assert_eq!(divided_lab.required_halves, 2);

        let physics = p
            .requirements()
            .iter()
            .find(|r| p.subject_name(r.key.subject) == "Physics")
            .unwrap();
        assert_eq!(physics.required_halves, 4);
    }

    #[test]
    fn test_streams() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        // G1 is split: two streams; G2 is not: one stream.
        assert_eq!(p.stream_count(), 3);
        assert_eq!(p.streams_of(EntityId(0)), &[0, 1]);
        assert_eq!(p.streams_of(EntityId(1)), &[2]);
        let g1_1 = p.entities().iter().position(|e| e.name == "G1.1").unwrap();
        assert_eq!(p.streams_of(EntityId::from_index(g1_1)), &[0]);
    }

    #[test]
    fn test_task_lookup() {
        let p = Problem::new(&institution(), ProblemConfig::default()).unwrap();
        let math = p.tasks()[0].subject;
        assert!(p.task_for(EntityId(0), math, ActivityType::Lecture).is_some());
        // G1 labs are divided, so the whole group has no Math lab task.
        assert!(p.task_for(EntityId(0), math, ActivityType::Lab).is_none());
        assert_eq!(p.subjects_of(GroupId(0)).len(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ProblemConfig::default().with_weeks(0);
        assert!(matches!(
            Problem::new(&institution(), config),
            Err(TimetableError::InvalidConfig(_))
        ));
    }
}
