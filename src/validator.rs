use crate::data::{
    Conflict, ConflictKind, MAX_CLASSES_PER_TEACHER, ScheduleRow, Slot, Subject, TeacherRef,
};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Checks a proposed schedule against every constraint and returns all
/// violations found. This single implementation backs both the read-only
/// check operation and the pre-save gate, so a previewed schedule and a
/// committed one can never disagree.
///
/// Unassigned cells are permitted; a row only has to be internally
/// consistent and must not collide with other rows through its teachers.
pub fn validate(rows: &[ScheduleRow], directory: &HashMap<String, TeacherRef>) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    // teachers already holding a given slot earlier in this pass
    let mut slot_holders: HashMap<Slot, HashSet<String>> = HashMap::new();
    let mut teacher_totals: HashMap<String, u32> = HashMap::new();

    for row in rows {
        if row.class_id.trim().is_empty() {
            conflicts.push(Conflict::new(
                ConflictKind::MissingClassInfo,
                "row is missing its class reference",
            ));
            continue;
        }

        let distinct: HashSet<Subject> = row.cells.values().map(|c| c.subject).collect();
        if distinct.len() != Slot::ALL.len() {
            conflicts.push(
                Conflict::new(
                    ConflictKind::DuplicateSubjects,
                    format!(
                        "class {} does not cover all three subjects exactly once",
                        row.class_id
                    ),
                )
                .with_class(&row.class_id),
            );
        }

        for slot in Slot::ALL {
            let Some(cell) = row.cell(slot) else {
                continue;
            };
            let Some(teacher_id) = cell.teacher_id.as_deref() else {
                continue;
            };

            let Some(teacher) = directory.get(teacher_id) else {
                conflicts.push(
                    Conflict::new(
                        ConflictKind::UnknownTeacher,
                        format!("teacher {teacher_id} is not in the directory"),
                    )
                    .with_class(&row.class_id)
                    .with_slot(slot)
                    .with_teacher(teacher_id),
                );
                continue;
            };

            if let Some(specialty) = teacher.specialty {
                if specialty != cell.subject {
                    conflicts.push(
                        Conflict::new(
                            ConflictKind::SubjectMismatch,
                            format!(
                                "teacher {} teaches {specialty} but is assigned {}",
                                teacher.name, cell.subject
                            ),
                        )
                        .with_class(&row.class_id)
                        .with_slot(slot)
                        .with_teacher(teacher_id),
                    );
                }
            }

            let holders = slot_holders.entry(slot).or_default();
            if !holders.insert(teacher_id.to_string()) {
                conflicts.push(
                    Conflict::new(
                        ConflictKind::SlotConflict,
                        format!(
                            "teacher {} is assigned to two classes in slot {:?}",
                            teacher.name, slot
                        ),
                    )
                    .with_class(&row.class_id)
                    .with_slot(slot)
                    .with_teacher(teacher_id),
                );
            }

            let total = teacher_totals.entry(teacher_id.to_string()).or_insert(0);
            *total += 1;
            if *total > MAX_CLASSES_PER_TEACHER {
                conflicts.push(
                    Conflict::new(
                        ConflictKind::TeacherOverload,
                        format!(
                            "teacher {} exceeds the cap of {MAX_CLASSES_PER_TEACHER} classes",
                            teacher.name
                        ),
                    )
                    .with_class(&row.class_id)
                    .with_slot(slot)
                    .with_teacher(teacher_id),
                );
            }
        }
    }

    debug!(
        "Validated {} row(s): {} conflict(s)",
        rows.len(),
        conflicts.len()
    );
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use std::collections::BTreeMap;

    fn directory() -> HashMap<String, TeacherRef> {
        [
            ("t-taks", "Mina", Some(Subject::Taks)),
            ("t-al7an", "Bishoy", Some(Subject::Al7an)),
            ("t-coptic", "Marina", Some(Subject::Coptic)),
            ("t-any", "Karim", None),
        ]
        .into_iter()
        .map(|(id, name, specialty)| {
            (
                id.to_string(),
                TeacherRef {
                    id: id.to_string(),
                    name: name.to_string(),
                    specialty,
                },
            )
        })
        .collect()
    }

    fn row(class_id: &str, cells: [(Slot, Subject, Option<&str>); 3]) -> ScheduleRow {
        let cells: BTreeMap<Slot, Cell> = cells
            .into_iter()
            .map(|(slot, subject, teacher)| {
                (
                    slot,
                    Cell {
                        subject,
                        teacher_id: teacher.map(str::to_string),
                    },
                )
            })
            .collect();
        ScheduleRow {
            class_id: class_id.to_string(),
            location: String::new(),
            level: None,
            cells,
        }
    }

    fn kinds(conflicts: &[Conflict]) -> Vec<ConflictKind> {
        conflicts.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn clean_schedule_has_no_conflicts() {
        let rows = vec![
            row(
                "c1",
                [
                    (Slot::A, Subject::Taks, Some("t-taks")),
                    (Slot::B, Subject::Al7an, Some("t-al7an")),
                    (Slot::C, Subject::Coptic, Some("t-coptic")),
                ],
            ),
            row(
                "c2",
                [
                    (Slot::A, Subject::Al7an, Some("t-al7an")),
                    (Slot::B, Subject::Coptic, Some("t-coptic")),
                    (Slot::C, Subject::Taks, Some("t-taks")),
                ],
            ),
        ];
        assert!(validate(&rows, &directory()).is_empty());
    }

    #[test]
    fn same_teacher_twice_in_one_slot_is_exactly_one_slot_conflict() {
        let rows = vec![
            row(
                "c1",
                [
                    (Slot::A, Subject::Taks, Some("t-taks")),
                    (Slot::B, Subject::Al7an, None),
                    (Slot::C, Subject::Coptic, None),
                ],
            ),
            row(
                "c2",
                [
                    (Slot::A, Subject::Taks, Some("t-taks")),
                    (Slot::B, Subject::Coptic, None),
                    (Slot::C, Subject::Al7an, None),
                ],
            ),
        ];
        let conflicts = validate(&rows, &directory());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::SlotConflict]);
        assert_eq!(conflicts[0].teacher_id.as_deref(), Some("t-taks"));
        assert_eq!(conflicts[0].slot, Some(Slot::A));
    }

    #[test]
    fn repeated_subject_is_exactly_one_duplicate_subjects_conflict() {
        let rows = vec![row(
            "c1",
            [
                (Slot::A, Subject::Taks, None),
                (Slot::B, Subject::Taks, None),
                (Slot::C, Subject::Coptic, None),
            ],
        )];
        let conflicts = validate(&rows, &directory());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::DuplicateSubjects]);
        assert_eq!(conflicts[0].class_id.as_deref(), Some("c1"));
    }

    #[test]
    fn unknown_teacher_skips_that_cells_other_checks() {
        let rows = vec![row(
            "c1",
            [
                (Slot::A, Subject::Taks, Some("ghost")),
                (Slot::B, Subject::Al7an, None),
                (Slot::C, Subject::Coptic, None),
            ],
        )];
        let conflicts = validate(&rows, &directory());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::UnknownTeacher]);
    }

    #[test]
    fn specialty_mismatch_is_reported_and_missing_specialty_is_not() {
        let rows = vec![row(
            "c1",
            [
                (Slot::A, Subject::Taks, Some("t-coptic")),
                (Slot::B, Subject::Al7an, Some("t-any")),
                (Slot::C, Subject::Coptic, None),
            ],
        )];
        let conflicts = validate(&rows, &directory());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::SubjectMismatch]);
        assert_eq!(conflicts[0].teacher_id.as_deref(), Some("t-coptic"));
    }

    #[test]
    fn overload_fires_on_every_cell_past_the_cap() {
        // t-any holds all three slots of c1, then two more cells elsewhere
        let rows = vec![
            row(
                "c1",
                [
                    (Slot::A, Subject::Taks, Some("t-any")),
                    (Slot::B, Subject::Al7an, Some("t-any")),
                    (Slot::C, Subject::Coptic, Some("t-any")),
                ],
            ),
            row(
                "c2",
                [
                    (Slot::A, Subject::Al7an, Some("t-any")),
                    (Slot::B, Subject::Coptic, Some("t-any")),
                    (Slot::C, Subject::Taks, None),
                ],
            ),
        ];
        let conflicts = validate(&rows, &directory());
        let overloads = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::TeacherOverload)
            .count();
        assert_eq!(overloads, 2, "4th and 5th assignments both overload");
        // the c2 cells also collide with c1's slots
        let slot_conflicts = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::SlotConflict)
            .count();
        assert_eq!(slot_conflicts, 2);
    }

    #[test]
    fn missing_class_reference_skips_the_rest_of_the_row() {
        let rows = vec![row(
            "",
            [
                (Slot::A, Subject::Taks, Some("ghost")),
                (Slot::B, Subject::Taks, Some("ghost")),
                (Slot::C, Subject::Coptic, None),
            ],
        )];
        let conflicts = validate(&rows, &directory());
        assert_eq!(kinds(&conflicts), vec![ConflictKind::MissingClassInfo]);
    }

    #[test]
    fn validation_is_idempotent() {
        let rows = vec![
            row(
                "c1",
                [
                    (Slot::A, Subject::Taks, Some("t-taks")),
                    (Slot::B, Subject::Al7an, Some("t-coptic")),
                    (Slot::C, Subject::Coptic, None),
                ],
            ),
            row(
                "c2",
                [
                    (Slot::A, Subject::Al7an, Some("t-taks")),
                    (Slot::B, Subject::Coptic, None),
                    (Slot::C, Subject::Taks, Some("t-taks")),
                ],
            ),
        ];
        let dir = directory();
        let first = validate(&rows, &dir);
        let second = validate(&rows, &dir);
        assert_eq!(kinds(&first), kinds(&second));
        assert_eq!(first.len(), second.len());
    }
}
