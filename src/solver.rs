use crate::data::{
    Cell, ClassRef, MAX_CLASSES_PER_TEACHER, RotationMap, ScheduleRow, Slot, Subject, UnmetCell,
};
use crate::store::{ScheduleStore, StoreError};
use itertools::Itertools;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-run load tracking for one teacher. Allocated fresh on every
/// assignment run and discarded afterwards.
#[derive(Debug, Default)]
struct TeacherUsage {
    total_assigned: u32,
    occupied_slots: HashSet<Slot>,
}

/// Resolves the teacher pool for each subject.
///
/// If the caller supplied at least one non-empty pool, every subject uses
/// exactly what was supplied (missing subjects get an empty pool, never a
/// specialty fallback, so explicit and implicit intents never mix).
/// Otherwise each subject's pool comes from the teacher directory:
/// instructional staff whose specialty equals the subject, in directory
/// order. An empty pool is not an error; it surfaces later as unmet cells.
pub async fn resolve_pools<S: ScheduleStore>(
    store: &S,
    explicit: Option<&HashMap<Subject, Vec<String>>>,
) -> Result<HashMap<Subject, Vec<String>>, StoreError> {
    if let Some(supplied) = explicit {
        if supplied.values().any(|pool| !pool.is_empty()) {
            let pools = Subject::ALL
                .into_iter()
                .map(|subject| (subject, supplied.get(&subject).cloned().unwrap_or_default()))
                .collect();
            return Ok(pools);
        }
    }

    let mut pools = HashMap::new();
    for subject in Subject::ALL {
        let pool = store.teachers_by_specialty(subject).await?;
        debug!("Resolved {} candidate teacher(s) for {subject}", pool.len());
        pools.insert(subject, pool);
    }
    Ok(pools)
}

/// Greedily assigns teachers to every (class, slot) cell.
///
/// Traversal is subject-major, slot-minor: one subject's full demand is
/// placed before the next subject is considered, so the least-loaded
/// tie-break only ever compares loads within one subject's pool. For each
/// cell the pool is re-sorted ascending by current load (ties keep the
/// pool's original order) and the first teacher under the class cap whose
/// slots do not already include this one is taken. A cell with no eligible
/// teacher is reported as unmet and the run continues; this is a first-fit
/// heuristic, not a matching solver, and it never backtracks.
pub fn assign(
    classes: &[ClassRef],
    rotations: &HashMap<String, RotationMap>,
    pools: &HashMap<Subject, Vec<String>>,
) -> (Vec<ScheduleRow>, Vec<UnmetCell>) {
    info!(
        "Assigning teachers for {} classes over {} slots...",
        classes.len(),
        Slot::ALL.len()
    );

    // one row per class, all cells unassigned, slot order fixed
    let mut rows: Vec<ScheduleRow> = Vec::with_capacity(classes.len());
    let mut row_index: HashMap<&str, usize> = HashMap::new();
    for class in classes {
        let Some(rotation) = rotations.get(&class.id) else {
            continue;
        };
        let cells: BTreeMap<Slot, Cell> = Slot::ALL
            .into_iter()
            .zip(rotation.subjects())
            .map(|(slot, subject)| {
                (
                    slot,
                    Cell {
                        subject,
                        teacher_id: None,
                    },
                )
            })
            .collect();
        row_index.insert(class.id.as_str(), rows.len());
        rows.push(ScheduleRow {
            class_id: class.id.clone(),
            location: class.location.clone(),
            level: class.level.clone(),
            cells,
        });
    }

    let mut usage: HashMap<&str, TeacherUsage> = HashMap::new();
    let mut unmet = Vec::new();

    for subject in Subject::ALL {
        let pool = pools.get(&subject).map(Vec::as_slice).unwrap_or_default();

        // demand for this subject, grouped by the slot each rotation puts it in
        let demand: HashMap<Slot, Vec<&ClassRef>> = classes
            .iter()
            .filter_map(|class| {
                rotations
                    .get(&class.id)
                    .map(|rotation| (rotation.slot_of(subject), class))
            })
            .into_group_map();

        for slot in Slot::ALL {
            let Some(needing) = demand.get(&slot) else {
                continue;
            };
            for class in needing {
                match pick_teacher(pool, slot, &usage) {
                    Some(teacher_id) => {
                        let entry = usage.entry(teacher_id).or_default();
                        entry.total_assigned += 1;
                        entry.occupied_slots.insert(slot);
                        if let Some(&idx) = row_index.get(class.id.as_str()) {
                            if let Some(cell) = rows[idx].cells.get_mut(&slot) {
                                cell.teacher_id = Some(teacher_id.to_string());
                            }
                        }
                    }
                    None => {
                        debug!(
                            "No eligible teacher for class {} in slot {:?} ({subject})",
                            class.id, slot
                        );
                        unmet.push(UnmetCell {
                            class_id: class.id.clone(),
                            slot,
                            subject,
                            reason: "no available teacher (capacity/slot conflict)".to_string(),
                        });
                    }
                }
            }
        }
    }

    info!(
        "Assignment finished: {} rows, {} unmet cell(s)",
        rows.len(),
        unmet.len()
    );
    (rows, unmet)
}

/// First eligible teacher in the pool, least-loaded first with the pool's
/// original order breaking ties.
fn pick_teacher<'a>(
    pool: &'a [String],
    slot: Slot,
    usage: &HashMap<&str, TeacherUsage>,
) -> Option<&'a str> {
    let load = |id: &str| usage.get(id).map_or(0, |u| u.total_assigned);

    pool.iter()
        .enumerate()
        .sorted_by_key(|(original, id)| (load(id), *original))
        .map(|(_, id)| id.as_str())
        .find(|id| {
            load(id) < MAX_CLASSES_PER_TEACHER
                && usage.get(id).is_none_or(|u| !u.occupied_slots.contains(&slot))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::rotation_for;

    fn sample_classes(count: usize) -> Vec<ClassRef> {
        (0..count)
            .map(|i| ClassRef {
                id: format!("class-{i}"),
                ordinal_index: i,
                location: format!("Room {}", i + 1),
                level: None,
            })
            .collect()
    }

    fn sample_rotations(classes: &[ClassRef]) -> HashMap<String, RotationMap> {
        classes
            .iter()
            .map(|c| (c.id.clone(), rotation_for(c.ordinal_index)))
            .collect()
    }

    fn one_teacher_per_subject() -> HashMap<Subject, Vec<String>> {
        Subject::ALL
            .into_iter()
            .map(|s| (s, vec![format!("t-{s}")]))
            .collect()
    }

    #[test]
    fn three_classes_three_teachers_fills_every_cell() {
        let classes = sample_classes(3);
        let rotations = sample_rotations(&classes);
        let pools = one_teacher_per_subject();

        let (rows, unmet) = assign(&classes, &rotations, &pools);

        assert!(unmet.is_empty());
        assert_eq!(rows.len(), 3);
        let mut per_teacher: HashMap<&str, u32> = HashMap::new();
        for row in &rows {
            for cell in row.cells.values() {
                let id = cell.teacher_id.as_deref().expect("cell left unfilled");
                *per_teacher.entry(id).or_default() += 1;
            }
        }
        assert_eq!(per_teacher.len(), 3);
        assert!(per_teacher.values().all(|&n| n == 3));
    }

    #[test]
    fn fourth_class_exhausts_single_teacher_pools() {
        let classes = sample_classes(4);
        let rotations = sample_rotations(&classes);
        let pools = one_teacher_per_subject();

        let (rows, unmet) = assign(&classes, &rotations, &pools);

        assert_eq!(rows.len(), 4);
        assert!(!unmet.is_empty());
        assert!(unmet.iter().all(|u| u.class_id == "class-3"));
        assert!(unmet.iter().all(|u| u.reason.contains("no available teacher")));
    }

    #[test]
    fn teacher_never_exceeds_cap_or_doubles_a_slot() {
        let classes = sample_classes(6);
        let rotations = sample_rotations(&classes);
        let pools: HashMap<Subject, Vec<String>> = Subject::ALL
            .into_iter()
            .map(|s| (s, vec![format!("t-{s}-1"), format!("t-{s}-2")]))
            .collect();

        let (rows, unmet) = assign(&classes, &rotations, &pools);
        assert!(unmet.is_empty());

        let mut totals: HashMap<&str, u32> = HashMap::new();
        let mut seen: HashSet<(Slot, &str)> = HashSet::new();
        for row in &rows {
            for (slot, cell) in &row.cells {
                let id = cell.teacher_id.as_deref().expect("cell left unfilled");
                *totals.entry(id).or_default() += 1;
                assert!(seen.insert((*slot, id)), "{id} double-booked in {slot:?}");
            }
        }
        assert!(totals.values().all(|&n| n <= MAX_CLASSES_PER_TEACHER));
    }

    #[test]
    fn generated_rows_never_repeat_a_subject() {
        let classes = sample_classes(5);
        let rotations = sample_rotations(&classes);
        let (rows, _) = assign(&classes, &rotations, &one_teacher_per_subject());

        for row in &rows {
            let distinct: HashSet<Subject> = row.cells.values().map(|c| c.subject).collect();
            assert_eq!(distinct.len(), 3, "class {} repeats a subject", row.class_id);
        }
    }

    #[test]
    fn least_loaded_wins_and_ties_keep_pool_order() {
        // class-0 places taks in slot A, class-1 in slot C
        let classes = sample_classes(2);
        let rotations = sample_rotations(&classes);
        let mut pools = HashMap::new();
        pools.insert(Subject::Taks, vec!["t1".to_string(), "t2".to_string()]);

        let (rows, _) = assign(&classes, &rotations, &pools);

        let first = rows[0].cell(Slot::A).and_then(|c| c.teacher_id.as_deref());
        let second = rows[1].cell(Slot::C).and_then(|c| c.teacher_id.as_deref());
        assert_eq!(first, Some("t1"), "tie should keep pool order");
        assert_eq!(second, Some("t2"), "second pick should be the less loaded teacher");
    }

    #[test]
    fn missing_pool_leaves_subject_unmet_everywhere() {
        let classes = sample_classes(2);
        let rotations = sample_rotations(&classes);
        let mut pools = one_teacher_per_subject();
        pools.remove(&Subject::Coptic);

        let (rows, unmet) = assign(&classes, &rotations, &pools);

        assert_eq!(unmet.len(), 2);
        assert!(unmet.iter().all(|u| u.subject == Subject::Coptic));
        for row in &rows {
            for cell in row.cells.values() {
                if cell.subject == Subject::Coptic {
                    assert!(cell.teacher_id.is_none());
                }
            }
        }
    }
}
