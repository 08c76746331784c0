use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Hard cap on how many classes one teacher may be assigned per week.
pub const MAX_CLASSES_PER_TEACHER: u32 = 3;

/// One of the three fixed daily periods. Ordered A < B < C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
    C,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::A, Slot::B, Slot::C];

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
            Slot::C => 2,
        }
    }

    /// Display label shown to operators.
    pub fn label(self) -> &'static str {
        match self {
            Slot::A => "First period",
            Slot::B => "Second period",
            Slot::C => "Third period",
        }
    }
}

/// The three recurring subjects of the weekly cycle. Ordered by declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Taks,
    Al7an,
    Coptic,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Taks, Subject::Al7an, Subject::Coptic];
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subject::Taks => "taks",
            Subject::Al7an => "al7an",
            Subject::Coptic => "coptic",
        };
        write!(f, "{name}")
    }
}

/// A class as seen by the engine; owned by the class-management collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRef {
    pub id: String,
    /// Position in the globally ordered class list; drives the rotation only.
    pub ordinal_index: usize,
    pub location: String,
    #[serde(default)]
    pub level: Option<String>,
}

/// A teacher as seen by the engine; owned by the teacher-directory collaborator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRef {
    pub id: String,
    pub name: String,
    /// When absent, specialty checks are skipped for this teacher.
    #[serde(default)]
    pub specialty: Option<Subject>,
}

/// A class's slot-to-subject permutation. Bijective by construction,
/// recomputed from the ordinal index on every read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationMap([Subject; 3]);

impl RotationMap {
    pub fn new(subjects: [Subject; 3]) -> Self {
        Self(subjects)
    }

    pub fn subject_at(self, slot: Slot) -> Subject {
        self.0[slot.index()]
    }

    /// The slot this rotation places `subject` in.
    pub fn slot_of(self, subject: Subject) -> Slot {
        // total over both sides, so the position always exists
        let pos = self.0.iter().position(|s| *s == subject).unwrap_or(0);
        Slot::ALL[pos]
    }

    pub fn subjects(self) -> [Subject; 3] {
        self.0
    }
}

/// One (subject, teacher) pairing in a class's week. An unmet cell
/// carries `teacher_id = None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub subject: Subject,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

/// One class plus its three cells, keyed by slot.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub class_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub level: Option<String>,
    pub cells: BTreeMap<Slot, Cell>,
}

impl ScheduleRow {
    pub fn cell(&self, slot: Slot) -> Option<&Cell> {
        self.cells.get(&slot)
    }
}

/// The persisted subject-to-teacher mapping for one class. At most one
/// record per class ever exists; slot positions are re-derived from the
/// rotation and deliberately not stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub class_id: String,
    #[serde(default)]
    pub taks: Option<String>,
    #[serde(default)]
    pub al7an: Option<String>,
    #[serde(default)]
    pub coptic: Option<String>,
}

impl AssignmentRecord {
    pub fn empty(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            taks: None,
            al7an: None,
            coptic: None,
        }
    }

    pub fn teacher_for(&self, subject: Subject) -> Option<&String> {
        match subject {
            Subject::Taks => self.taks.as_ref(),
            Subject::Al7an => self.al7an.as_ref(),
            Subject::Coptic => self.coptic.as_ref(),
        }
    }

    pub fn set_teacher(&mut self, subject: Subject, teacher_id: Option<String>) {
        match subject {
            Subject::Taks => self.taks = teacher_id,
            Subject::Al7an => self.al7an = teacher_id,
            Subject::Coptic => self.coptic = teacher_id,
        }
    }
}

/// A (class, slot) cell the greedy pass could not fill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetCell {
    pub class_id: String,
    pub slot: Slot,
    pub subject: Subject,
    pub reason: String,
}

impl fmt::Display for UnmetCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {}, {} ({}): {}",
            self.class_id,
            self.slot.label(),
            self.subject,
            self.reason
        )
    }
}

/// Categories of schedule conflicts the validator can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    MissingClassInfo,
    DuplicateSubjects,
    UnknownTeacher,
    SubjectMismatch,
    SlotConflict,
    TeacherOverload,
}

/// A single constraint violation with enough context to display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub class_id: Option<String>,
    pub slot: Option<Slot>,
    pub teacher_id: Option<String>,
    pub message: String,
}

impl Conflict {
    pub fn new(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            class_id: None,
            slot: None,
            teacher_id: None,
            message: message.into(),
        }
    }

    pub fn with_class(mut self, class_id: impl Into<String>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn with_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.teacher_id = Some(teacher_id.into());
        self
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

/// Input for schedule generation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Optional restriction to a subset of class ids.
    #[serde(default)]
    pub class_ids: Option<Vec<String>>,
    /// Optional explicit teacher pools, overriding specialty lookup.
    #[serde(default)]
    pub pools: Option<HashMap<Subject, Vec<String>>>,
}

/// Output of schedule generation: best-effort rows plus unfillable cells.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub rows: Vec<ScheduleRow>,
    pub unmet: Vec<UnmetCell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub rows: Vec<ScheduleRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub valid: bool,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub rows: Vec<ScheduleRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Number of class records written.
    pub saved: usize,
}

/// Edits one subject of one class's record, leaving the others untouched.
/// `teacherId = null` clears that subject's assignment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub class_id: String,
    pub subject: Subject,
    #[serde(default)]
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub rows: Vec<ScheduleRow>,
}
