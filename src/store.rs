use crate::data::{AssignmentRecord, ClassRef, Subject, TeacherRef};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// A storage-layer failure, carrying the backend's message.
#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// The engine's view of its external collaborators: the class list, the
/// teacher directory, and the per-class assignment records. Classes come
/// back in the deterministic order their ordinal indices were derived
/// from. `upsert_record` must be atomic per class id; the engine does no
/// locking of its own. Records are never deleted through this trait.
#[allow(async_fn_in_trait)]
pub trait ScheduleStore {
    async fn list_classes(&self) -> Result<Vec<ClassRef>, StoreError>;
    async fn list_teachers(&self) -> Result<Vec<TeacherRef>, StoreError>;
    /// Instructional staff whose specialty equals `subject`, directory order.
    async fn teachers_by_specialty(&self, subject: Subject) -> Result<Vec<String>, StoreError>;
    async fn find_record(&self, class_id: &str) -> Result<Option<AssignmentRecord>, StoreError>;
    /// Find-or-create followed by an unconditional overwrite of all three
    /// subject fields.
    async fn upsert_record(&self, record: AssignmentRecord) -> Result<(), StoreError>;
    /// Field-level merge: sets one subject's teacher, leaves the rest alone.
    async fn patch_record(
        &self,
        class_id: &str,
        subject: Subject,
        teacher_id: Option<String>,
    ) -> Result<(), StoreError>;
}

/// Seed data for the in-memory backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub classes: Vec<ClassRef>,
    pub teachers: Vec<TeacherRef>,
}

#[derive(Debug, Default)]
struct Inner {
    classes: Vec<ClassRef>,
    teachers: Vec<TeacherRef>,
    records: HashMap<String, AssignmentRecord>,
}

/// In-memory backend. Classes keep insertion order; record upserts take a
/// single write lock, which makes them atomic per class id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn from_fixture(fixture: Fixture) -> Self {
        Self {
            inner: RwLock::new(Inner {
                classes: fixture.classes,
                teachers: fixture.teachers,
                records: HashMap::new(),
            }),
        }
    }

    /// Small built-in roster for running the server without a fixture file.
    pub fn demo() -> Self {
        let classes = (0..4)
            .map(|i| ClassRef {
                id: format!("class-{i}"),
                ordinal_index: i,
                location: format!("Room {}", i + 1),
                level: Some(format!("Grade {}", i + 1)),
            })
            .collect();
        let teachers = Subject::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, &subject)| {
                (0..2).map(move |j| TeacherRef {
                    id: format!("t-{subject}-{j}"),
                    name: format!("Teacher {}", i * 2 + j + 1),
                    specialty: Some(subject),
                })
            })
            .collect();
        Self::from_fixture(Fixture { classes, teachers })
    }
}

impl ScheduleStore for InMemoryStore {
    async fn list_classes(&self) -> Result<Vec<ClassRef>, StoreError> {
        Ok(self.inner.read().await.classes.clone())
    }

    async fn list_teachers(&self) -> Result<Vec<TeacherRef>, StoreError> {
        Ok(self.inner.read().await.teachers.clone())
    }

    async fn teachers_by_specialty(&self, subject: Subject) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .teachers
            .iter()
            .filter(|t| t.specialty == Some(subject))
            .map(|t| t.id.clone())
            .collect())
    }

    async fn find_record(&self, class_id: &str) -> Result<Option<AssignmentRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(class_id).cloned())
    }

    async fn upsert_record(&self, record: AssignmentRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.records.insert(record.class_id.clone(), record);
        Ok(())
    }

    async fn patch_record(
        &self,
        class_id: &str,
        subject: Subject,
        teacher_id: Option<String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .entry(class_id.to_string())
            .or_insert_with(|| AssignmentRecord::empty(class_id));
        record.set_teacher(subject, teacher_id);
        Ok(())
    }
}
