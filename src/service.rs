use crate::data::{
    AssignmentRecord, Cell, CheckResponse, GenerateRequest, GenerateResponse, RotationMap,
    SaveResponse, ScheduleResponse, ScheduleRow, Slot, TeacherRef, UpdateAssignmentRequest,
};
use crate::rotation::rotation_for;
use crate::solver;
use crate::store::{ScheduleStore, StoreError};
use crate::validator;
use log::info;
use std::collections::HashMap;
use std::fmt;

/// Failures of the boundary operations. Domain conflicts and unmet cells
/// are returned as data, not through this type; it only covers rejected
/// input shapes, the pre-save conflict gate, and storage failures.
#[derive(Debug)]
pub enum EngineError {
    InvalidInput(String),
    Conflict(String),
    Store(StoreError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::Conflict(msg) => write!(f, "schedule conflict: {msg}"),
            EngineError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err)
    }
}

/// Generates a draft schedule: rotations from each class's ordinal index,
/// then the greedy teacher assignment. Always succeeds with a best-effort
/// result; cells that could not be filled come back in `unmet`. Nothing is
/// persisted.
pub async fn generate<S: ScheduleStore>(
    store: &S,
    request: GenerateRequest,
) -> Result<GenerateResponse, EngineError> {
    let mut classes = store.list_classes().await?;
    if let Some(selected) = &request.class_ids {
        classes.retain(|c| selected.contains(&c.id));
    }

    let rotations: HashMap<String, RotationMap> = classes
        .iter()
        .map(|c| (c.id.clone(), rotation_for(c.ordinal_index)))
        .collect();
    let pools = solver::resolve_pools(store, request.pools.as_ref()).await?;

    let (rows, unmet) = solver::assign(&classes, &rotations, &pools);
    info!(
        "Generated schedule for {} class(es), {} unmet cell(s)",
        rows.len(),
        unmet.len()
    );
    Ok(GenerateResponse { rows, unmet })
}

/// Read-only constraint check. Returns the full conflict list; never
/// writes anything.
pub async fn check_schedule<S: ScheduleStore>(
    store: &S,
    rows: &[ScheduleRow],
) -> Result<CheckResponse, EngineError> {
    if rows.is_empty() {
        return Err(EngineError::InvalidInput("no schedule rows supplied".to_string()));
    }
    let directory = teacher_directory(store).await?;
    let conflicts = validator::validate(rows, &directory);
    Ok(CheckResponse {
        valid: conflicts.is_empty(),
        conflicts,
    })
}

/// Validates and commits a schedule. Any conflict fails the whole save
/// with the first conflict's message and nothing is written; callers who
/// need the full list check first. After the gate passes, one record per
/// class is upserted independently, overwriting all three subject fields.
pub async fn save_schedule<S: ScheduleStore>(
    store: &S,
    rows: &[ScheduleRow],
) -> Result<SaveResponse, EngineError> {
    if rows.is_empty() {
        return Err(EngineError::InvalidInput("no schedule rows supplied".to_string()));
    }

    let directory = teacher_directory(store).await?;
    let conflicts = validator::validate(rows, &directory);
    if let Some(first) = conflicts.first() {
        return Err(EngineError::Conflict(first.message.clone()));
    }

    for row in rows {
        let mut record = AssignmentRecord::empty(&row.class_id);
        for cell in row.cells.values() {
            record.set_teacher(cell.subject, cell.teacher_id.clone());
        }
        store.upsert_record(record).await?;
    }
    info!("Saved assignments for {} class(es)", rows.len());
    Ok(SaveResponse { saved: rows.len() })
}

/// Edits one subject of one class's persisted record. Unlike save, this
/// merges field by field: subjects not named stay untouched.
pub async fn update_assignment<S: ScheduleStore>(
    store: &S,
    request: UpdateAssignmentRequest,
) -> Result<(), EngineError> {
    if request.class_id.trim().is_empty() {
        return Err(EngineError::InvalidInput("classId is required".to_string()));
    }
    store
        .patch_record(&request.class_id, request.subject, request.teacher_id)
        .await?;
    Ok(())
}

/// Reconstructs the committed schedule: stored class order, recomputed
/// rotations, teacher ids joined in from each class's record. Deliberately
/// unvalidated so the view always reflects what was last persisted.
pub async fn current_schedule<S: ScheduleStore>(
    store: &S,
) -> Result<ScheduleResponse, EngineError> {
    let classes = store.list_classes().await?;
    let mut rows = Vec::with_capacity(classes.len());

    for class in classes {
        let rotation = rotation_for(class.ordinal_index);
        let record = store.find_record(&class.id).await?;
        let cells = Slot::ALL
            .into_iter()
            .map(|slot| {
                let subject = rotation.subject_at(slot);
                let teacher_id = record
                    .as_ref()
                    .and_then(|r| r.teacher_for(subject))
                    .cloned();
                (slot, Cell { subject, teacher_id })
            })
            .collect();
        rows.push(ScheduleRow {
            class_id: class.id,
            location: class.location,
            level: class.level,
            cells,
        });
    }
    Ok(ScheduleResponse { rows })
}

/// Snapshot of the first conflict-free teacher directory view, keyed by id.
async fn teacher_directory<S: ScheduleStore>(
    store: &S,
) -> Result<HashMap<String, TeacherRef>, EngineError> {
    let teachers = store.list_teachers().await?;
    Ok(teachers.into_iter().map(|t| (t.id.clone(), t)).collect())
}
