//! Single-entry replacement orchestration.
//!
//! Validates replacement text, infers the entry's current line range
//! from a fresh parse, and applies one Replace change through the text
//! editor. Nothing touches the disk until validation and boundary
//! inference both succeed; the save itself is atomic.

use super::changeset::ChangeSet;
use super::locator;
use super::text_editor::TextEditor;
use crate::error::LedgerError;
use crate::ledger::{Entry, parse_file, parse_string, render};

/// Replaces entries in place, one at a time.
///
/// The caller is responsible for serializing concurrent edits: at most
/// one structural edit may be in flight per file, because line ranges
/// are computed from a re-parse taken at edit time.
pub struct EntryEditor;

impl EntryEditor {
    /// Replace an entry with a new entry object.
    ///
    /// The object is rendered through the canonical serializer, so
    /// syntax validation is skipped.
    pub fn replace_entry(old_entry: &Entry, new_entry: &Entry) -> Result<(), LedgerError> {
        let text = render(new_entry);
        Self::replace_entry_with_string(old_entry, &text, false)
    }

    /// Replace an entry with raw ledger text.
    ///
    /// 1. If `validate_syntax`, parse the text in isolation; any parse
    ///    error rejects the edit with the parser's error list, file
    ///    untouched.
    /// 2. Re-parse the entry's file; this fresh parse is authoritative
    ///    and reflects any edits made since `old_entry` was obtained.
    ///    A stale view (no entry at the recorded start line) is
    ///    rejected as boundary drift.
    /// 3. Normalize the replacement to end with exactly one blank line
    ///    so entry separation in the file stays consistent.
    /// 4. Apply a single Replace change set and save atomically.
    pub fn replace_entry_with_string(
        old_entry: &Entry,
        new_text: &str,
        validate_syntax: bool,
    ) -> Result<(), LedgerError> {
        if validate_syntax {
            let parsed = parse_string(new_text);
            if !parsed.errors.is_empty() {
                return Err(LedgerError::Validation(parsed.errors));
            }
        }

        let fresh = parse_file(&old_entry.meta.filename)?;
        let range = locator::locate(old_entry, &fresh.entries);
        if range.drifted {
            return Err(LedgerError::BoundaryDrift {
                file: old_entry.meta.filename.clone(),
                line: old_entry.meta.lineno,
            });
        }

        let text = normalize_trailing_blank(new_text);

        let mut editor = TextEditor::new(&old_entry.meta.filename);
        let end = match range.end {
            Some(end) => end,
            None => editor.line_count()?,
        };
        editor.edit(&ChangeSet::replace(range.start, end, &text))?;
        editor.save_changes()
    }
}

/// Normalize replacement text to end with exactly one blank line
/// (`"\n\n"`), regardless of how many trailing newlines the caller
/// supplied. Leading and embedded content passes through unchanged.
fn normalize_trailing_blank(text: &str) -> String {
    let mut normalized = text.trim_end_matches('\n').to_string();
    normalized.push_str("\n\n");
    normalized
}
