//! Delimiter-safe field cleaning.

/// Separates top-level fields of the wire payload and the device blob.
pub const RECORD_SEPARATOR: char = '\u{1E}';

/// Separates keys and values inside the argument block.
pub const UNIT_SEPARATOR: char = '\u{1F}';

/// Which delimiter rules apply to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordinary field: neither separator may appear.
    Plain,
    /// The serialized argument block, where unit separators are structural.
    ArgumentBlock,
}

/// Strip reserved separators from `value` and trim surrounding whitespace.
///
/// Information separators (U+001C..U+001F) count as whitespace when trimming,
/// so a dangling unit separator left by truncation never reaches the wire.
pub fn sanitize(value: &str, kind: FieldKind) -> String {
    let cleaned: String = value
        .chars()
        .filter(|&c| match kind {
            FieldKind::Plain => c != RECORD_SEPARATOR && c != UNIT_SEPARATOR,
            FieldKind::ArgumentBlock => c != RECORD_SEPARATOR,
        })
        .collect();

    cleaned.trim_matches(is_trimmable).to_string()
}

fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || ('\u{1C}'..='\u{1F}').contains(&c)
}

/// Number of characters in `value`.
pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Prefix of `value` holding at most `max` characters.
pub(crate) fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
