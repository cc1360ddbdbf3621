//! Byte-range replacements against an unmodified buffer.
//!
//! Every replacement of one pass is computed against the same original
//! text. Applying them from the highest start offset down keeps the stored
//! offsets of the remaining edits valid.

use std::ops::Range;

use crate::error::ApplyError;

/// One edit: replace `start..end` of the original buffer with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
    /// For logs and diagnostics only.
    pub description: String,
}

impl Replacement {
    pub fn new(
        range: Range<usize>,
        new_text: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            start: range.start,
            end: range.end,
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    /// Zero-width insertion at `offset`.
    pub fn insert(offset: usize, new_text: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(offset..offset, new_text, description)
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_insert(&self) -> bool {
        self.start == self.end
    }
}

/// Check that replacements are in bounds, on char boundaries, and disjoint.
pub fn validate_replacements(original: &str, replacements: &[Replacement]) -> Result<(), ApplyError> {
    for r in replacements {
        if r.start > r.end || r.end > original.len() {
            return Err(ApplyError::OutOfBounds {
                start: r.start,
                end: r.end,
                len: original.len(),
            });
        }
        for offset in [r.start, r.end] {
            if !original.is_char_boundary(offset) {
                return Err(ApplyError::NotCharBoundary(offset));
            }
        }
    }

    let mut sorted: Vec<&Replacement> = replacements.iter().collect();
    sorted.sort_by_key(|r| (r.start, r.end));
    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if first.end > second.start {
            return Err(ApplyError::Overlap {
                first: (first.start, first.end),
                second: (second.start, second.end),
            });
        }
    }
    Ok(())
}

/// Apply an unordered set of non-overlapping replacements in one pass.
pub fn apply_replacements(original: &str, replacements: &[Replacement]) -> Result<String, ApplyError> {
    validate_replacements(original, replacements)?;

    let mut sorted: Vec<&Replacement> = replacements.iter().collect();
    // Descending start; at equal starts the wider edit goes first so an
    // insertion at the same offset lands in front of it.
    sorted.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut text = original.to_string();
    for r in sorted {
        text.replace_range(r.range(), &r.new_text);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_single() {
        let result = apply_replacements(
            "Hello World",
            &[Replacement::new(6..11, "Universe", "greeting")],
        )
        .unwrap();
        assert_eq!(result, "Hello Universe");
    }

    #[test]
    fn test_apply_order_independent() {
        let a = Replacement::new(0..1, "AA", "a");
        let b = Replacement::new(2..3, "CC", "c");
        let c = Replacement::insert(4, "!", "bang");
        let forward = apply_replacements("abcd", &[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = apply_replacements("abcd", &[c, b, a]).unwrap();
        assert_eq!(forward, "AAbCCd!");
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_insert_before_replacement_at_same_offset() {
        let result = apply_replacements(
            "abc",
            &[
                Replacement::insert(1, ",", "comma"),
                Replacement::new(1..2, "X", "x"),
            ],
        )
        .unwrap();
        assert_eq!(result, "a,Xc");
    }

    #[test]
    fn test_overlap_rejected() {
        let err = apply_replacements(
            "abcdef",
            &[
                Replacement::new(0..3, "x", "a"),
                Replacement::new(2..4, "y", "b"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ApplyError::Overlap { .. }));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let err = apply_replacements("abc", &[Replacement::new(2..9, "x", "a")]).unwrap_err();
        assert_eq!(err, ApplyError::OutOfBounds { start: 2, end: 9, len: 3 });
    }

    #[test]
    fn test_char_boundary_rejected() {
        let err = apply_replacements("é", &[Replacement::insert(1, "x", "a")]).unwrap_err();
        assert_eq!(err, ApplyError::NotCharBoundary(1));
    }

    #[test]
    fn test_empty_list_is_identity() {
        assert_eq!(apply_replacements("same", &[]).unwrap(), "same");
    }
}
