use crate::data::{RotationMap, Subject};

/// Derives a class's slot-to-subject rotation from its ordinal position.
///
/// Slot at position `s` teaches the subject at `(s + ordinal_index % 3) % 3`
/// in declared subject order, so every class gets a full permutation and
/// consecutive classes are offset by one position. The offset spreads one
/// slot's demand across different subjects as the class list grows, which
/// keeps a single subject's teacher pool from becoming the bottleneck for
/// slot A.
pub fn rotation_for(ordinal_index: usize) -> RotationMap {
    let offset = ordinal_index % 3;
    let subjects = [
        Subject::ALL[offset % 3],
        Subject::ALL[(1 + offset) % 3],
        Subject::ALL[(2 + offset) % 3],
    ];
    RotationMap::new(subjects)
}
