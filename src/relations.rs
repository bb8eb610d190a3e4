// WHY: TLink labels are always reported as "focal relative to candidate"
// When the candidate precedes the focal mention in the text the classifier's label is flipped

use std::borrow::Cow;

/// Label the modality classifier assigns to realized occurrences
pub const ACTUAL_MODALITY: &str = "ACTUAL";

/// Symmetric inversion table; every pair appears in both directions
const INVERSIONS: &[(&str, &str)] = &[
    ("BEFORE", "AFTER"),
    ("AFTER", "BEFORE"),
    ("BEGINS-ON", "ENDS-ON"),
    ("ENDS-ON", "BEGINS-ON"),
    ("CONTAINS", "CONTAINS-1"),
    ("CONTAINS-1", "CONTAINS"),
    ("OVERLAP", "OVERLAP"),
    ("NONE", "NONE"),
];

/// Temporal inverse of a TLink label; labels outside the table pass through unchanged
pub fn invert_label(label: &str) -> Cow<'_, str> {
    INVERSIONS
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(label))
        .map_or(Cow::Borrowed(label), |(_, to)| Cow::Borrowed(*to))
}

/// All labels the inversion table knows about
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    INVERSIONS.iter().map(|(from, _)| *from)
}

/// Express `label` as focal-relative-to-candidate given the two begin offsets
///
/// The result is always upper-case so one table never mixes `before` and `AFTER`.
pub fn canonicalize(label: &str, focal_begin: usize, candidate_begin: usize) -> String {
    let label = label.trim().to_ascii_uppercase();
    if candidate_begin < focal_begin {
        invert_label(&label).into_owned()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inversion_is_an_involution() {
        for label in known_labels() {
            let once = invert_label(label);
            assert_eq!(invert_label(&once), label, "label {label}");
        }
    }

    #[test]
    fn test_unknown_label_passes_through() {
        assert_eq!(invert_label("SIMULTANEOUS"), "SIMULTANEOUS");
    }

    #[test]
    fn test_canonicalize_only_flips_preceding_candidates() {
        assert_eq!(canonicalize("BEFORE", 50, 10), "AFTER");
        assert_eq!(canonicalize("BEFORE", 10, 50), "BEFORE");
        assert_eq!(canonicalize("contains", 50, 10), "CONTAINS-1");
        assert_eq!(canonicalize("OVERLAP", 50, 10), "OVERLAP");
    }

    #[test]
    fn test_canonicalize_case_is_uniform() {
        assert_eq!(canonicalize("before", 10, 50), "BEFORE");
        assert_eq!(canonicalize("before", 50, 10), "AFTER");
        assert_eq!(canonicalize("Overlap", 10, 50), "OVERLAP");
        assert_eq!(canonicalize("simultaneous", 50, 10), "SIMULTANEOUS");
    }
}
