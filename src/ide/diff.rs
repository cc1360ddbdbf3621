//! Unified diff rendering for previews and dry runs.

use similar::TextDiff;

/// Lines of context around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// `--- a/<path>` / `+++ b/<path>` unified diff of two buffers.
///
/// Returns an empty string when the buffers are identical.
pub fn unified_diff(path: &str, original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("a/{}", path), &format!("b/{}", path))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_buffers() {
        assert_eq!(unified_diff("top.sv", "a\n", "a\n"), "");
    }

    #[test]
    fn test_added_line() {
        let diff = unified_diff("top.sv", "a\nc\n", "a\nb\nc\n");
        assert!(diff.starts_with("--- a/top.sv\n+++ b/top.sv\n"));
        assert!(diff.contains("\n+b\n"));
        assert!(diff.contains("@@"));
    }
}
