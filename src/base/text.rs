//! Text manipulation utilities for working with source code.

/// Check if a character can continue a SystemVerilog simple identifier.
#[inline]
pub fn is_word_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Check whether `text` is a plain SystemVerilog identifier (`[A-Za-z_][A-Za-z0-9_$]*`).
///
/// # Example
/// ```
/// use svauto::base::text::is_identifier;
///
/// assert!(is_identifier("data_in"));
/// assert!(!is_identifier("data[3:0]"));
/// assert!(!is_identifier("8'hFF"));
/// ```
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(is_word_character),
        _ => false,
    }
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .rfind('\n')
        .map(|pos| pos + 1)
        .unwrap_or(0)
}

/// Leading whitespace of the line containing `offset`.
///
/// # Example
/// ```
/// use svauto::base::text::line_indent;
///
/// let src = "module m;\n    sub u (/*AUTOINST*/);\nendmodule";
/// let at = src.find("u (").unwrap();
/// assert_eq!(line_indent(src, at), "    ");
/// ```
pub fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..];
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
