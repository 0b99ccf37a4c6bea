//! Change set model: one line-range text mutation.

/// What a change does to its line range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Splice lines in at `start` without removing anything
    Insert,
    /// Remove `[start, end)` and splice the replacement lines in
    Replace,
    /// Remove `[start, end)` with no replacement
    Delete,
}

/// A single text mutation: an operation kind, a half-open line range in
/// 0-based coordinates of the *current* file content, and replacement
/// lines for Insert/Replace.
///
/// Invariant: `start <= end`; `end == start` only for pure insertion.
/// Validity of the range against the target file is checked at
/// application time by the text editor, not at construction.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub kind: ChangeKind,
    pub start: usize,
    pub end: usize,
    /// Physical replacement lines (no embedded newlines)
    pub lines: Vec<String>,
}

impl ChangeSet {
    /// Replace `[start, end)` with the given text block.
    ///
    /// The block is split into physical lines; a trailing newline does
    /// not produce a phantom empty line, but an intentional blank line
    /// before it does.
    pub fn replace(start: usize, end: usize, text: &str) -> Self {
        Self {
            kind: ChangeKind::Replace,
            start,
            end,
            lines: split_block(text),
        }
    }

    /// Insert the given text block before line `start`.
    pub fn insert(start: usize, text: &str) -> Self {
        Self {
            kind: ChangeKind::Insert,
            start,
            end: start,
            lines: split_block(text),
        }
    }

    /// Delete lines `[start, end)`.
    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            kind: ChangeKind::Delete,
            start,
            end,
            lines: Vec::new(),
        }
    }
}

/// Split a text block into physical lines.
///
/// A single trailing `\n` is the block terminator, not an extra empty
/// line: `"a\nb\n"` is two lines, `"a\nb\n\n"` is two lines plus one
/// blank separator line.
fn split_block(text: &str) -> Vec<String> {
    let trimmed = text.strip_suffix('\n').unwrap_or(text);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}
