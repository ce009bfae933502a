use crate::validate::ValidationError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

// Type aliases for clarity
pub type FacultyId = u32;
pub type ClassroomId = u32;
pub type SubjectId = u32;
pub type BatchId = u32;

/// One cell of the weekly grid, ordered by day then period.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
pub struct TimeSlot {
    pub day: u8,
    pub period: u8,
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}p{}", self.day, self.period)
    }
}

/// A faculty member with their teaching constraints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
    pub department: String,
    /// Slots this faculty member can teach in. Empty means unrestricted.
    #[serde(default)]
    pub availability: Vec<TimeSlot>,
    /// Maximum sessions per week.
    #[serde(default = "Faculty::default_max_load")]
    pub max_load: u32,
}

impl Faculty {
    pub const DEFAULT_MAX_LOAD: u32 = 18;

    fn default_max_load() -> u32 {
        Self::DEFAULT_MAX_LOAD
    }

    pub fn is_available(&self, slot: TimeSlot) -> bool {
        self.availability.is_empty() || self.availability.contains(&slot)
    }
}

/// A physical classroom with a given capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: ClassroomId,
    pub name: String,
    pub capacity: u32,
    /// Category tag, e.g. lab or lecture.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A subject with its required weekly session count.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub department: String,
    pub credits: u32,
    pub weekly_classes: u32,
}

/// A student batch; its size drives the classroom capacity constraint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    pub program: String,
    pub semester: u32,
    pub students: u32,
}

/// The complete entity snapshot for one generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    pub faculties: Vec<Faculty>,
    pub classrooms: Vec<Classroom>,
    pub subjects: Vec<Subject>,
    pub batches: Vec<Batch>,
    /// The declared slot grid.
    pub slots: Vec<TimeSlot>,
}

impl SchedulingInput {
    /// The grid in canonical order: sorted, duplicates removed.
    pub fn canonical_slots(&self) -> Vec<TimeSlot> {
        let mut slots = self.slots.clone();
        slots.sort();
        slots.dedup();
        slots
    }
}

/// A single scheduled session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub batch_id: BatchId,
    pub subject_id: SubjectId,
    pub faculty_id: FacultyId,
    pub classroom_id: ClassroomId,
    pub slot: TimeSlot,
}

/// The generated timetable: one run's sessions in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub sessions: Vec<Session>,
}

impl Timetable {
    pub fn from_sessions(mut sessions: Vec<Session>) -> Self {
        sessions.sort();
        Self { sessions }
    }

    /// Checks the exclusivity invariants: no batch, faculty, or classroom
    /// may hold two sessions in the same slot. A failure here is an engine
    /// bug, not a data problem.
    pub fn verify(&self) -> Result<(), ScheduleError> {
        self.check_exclusive(|s| s.batch_id, "batch")?;
        self.check_exclusive(|s| s.faculty_id, "faculty")?;
        self.check_exclusive(|s| s.classroom_id, "classroom")?;
        Ok(())
    }

    fn check_exclusive<K, F>(&self, key: F, resource: &str) -> Result<(), ScheduleError>
    where
        K: Eq + Hash + fmt::Display + Copy,
        F: Fn(&Session) -> K,
    {
        let occupied = self
            .sessions
            .iter()
            .map(|s| ((key(s), s.slot), s))
            .into_group_map();
        for ((id, slot), sessions) in occupied {
            if sessions.len() > 1 {
                return Err(ScheduleError::InvariantViolation(format!(
                    "{resource} {id} is double-booked at {slot}"
                )));
            }
        }
        Ok(())
    }
}

/// The constraint classes a placement can fail against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintClass {
    Coverage,
    BatchExclusivity,
    FacultyExclusivity,
    ClassroomExclusivity,
    Capacity,
    Availability,
    LoadCap,
}

impl fmt::Display for ConstraintClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintClass::Coverage => "coverage",
            ConstraintClass::BatchExclusivity => "batch exclusivity",
            ConstraintClass::FacultyExclusivity => "faculty exclusivity",
            ConstraintClass::ClassroomExclusivity => "classroom exclusivity",
            ConstraintClass::Capacity => "capacity",
            ConstraintClass::Availability => "availability",
            ConstraintClass::LoadCap => "load cap",
        };
        write!(f, "{name}")
    }
}

/// A (batch, subject) pair needing weekly coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairKey {
    pub batch_id: BatchId,
    pub subject_id: SubjectId,
}

/// A pair the engine could not cover, with the constraint class that
/// blocked its last failed placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetPair {
    pub batch_id: BatchId,
    pub subject_id: SubjectId,
    pub required: u32,
    pub reason: ConstraintClass,
}

impl fmt::Display for UnmetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] batch {} subject {}: {} weekly session(s) unplaced",
            self.reason, self.batch_id, self.subject_id, self.required
        )
    }
}

/// Terminal classification of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SolveOutcome {
    Feasible {
        timetable: Timetable,
    },
    PartiallyFeasible {
        timetable: Timetable,
        unmet: Vec<UnmetPair>,
    },
    Infeasible {
        unmet: Vec<UnmetPair>,
    },
    /// The external deadline cut the search short. Not an infeasibility
    /// proof; must never be persisted as one.
    Aborted {
        pending: Vec<PairKey>,
    },
}

/// Search effort counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub pairs: usize,
    pub variables: usize,
    pub placements: u64,
    pub backtracks: u64,
    pub elapsed_ms: u64,
}

/// The final output of the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub stats: SolveStats,
}

/// Result type used across the engine.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Fatal engine error. Solver non-success outcomes are not errors; they are
/// reported as [`SolveOutcome`] data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Input rows collide on ids or reference unknown slots. Detected
    /// before any search cost is paid.
    #[error("invalid entity references: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    InvalidReferences(Vec<ValidationError>),

    /// The materialized timetable broke an exclusivity invariant.
    #[error("timetable invariant violated: {0}")]
    InvariantViolation(String),
}
