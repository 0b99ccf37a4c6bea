//! In-memory line buffer editor with atomic save.
//!
//! Opens a file's contents lazily into a line buffer, applies change
//! sets against it in call order, and writes the result back with
//! temp-file-plus-rename so a crash mid-write cannot leave a
//! half-written ledger.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::changeset::{ChangeKind, ChangeSet};
use crate::error::LedgerError;

/// Line-based editor for one file.
///
/// Multiple `edit` calls compose against the evolving buffer; ranges
/// from an earlier call are not re-validated for later calls, so
/// composing overlapping ranges across calls is the caller's
/// responsibility.
pub struct TextEditor {
    path: PathBuf,
    /// Physical lines, loaded on first edit. The file's trailing
    /// newline is implicit: save always terminates with exactly one.
    lines: Option<Vec<String>>,
}

impl TextEditor {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: None,
        }
    }

    /// Apply a single change to the in-memory buffer.
    ///
    /// Fails if the range does not lie within `[0, line_count]` of the
    /// current buffer. The file on disk is untouched until
    /// `save_changes`.
    pub fn edit(&mut self, change: &ChangeSet) -> Result<(), LedgerError> {
        let count = self.line_count()?;
        if change.start > change.end || change.end > count {
            return Err(LedgerError::Io(
                self.path.clone(),
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "line range {}..{} out of bounds for {count} lines",
                        change.start, change.end
                    ),
                ),
            ));
        }

        // Already loaded by the bounds check
        let lines = self.load()?;
        match change.kind {
            ChangeKind::Replace => {
                lines.splice(change.start..change.end, change.lines.iter().cloned());
            }
            ChangeKind::Insert => {
                lines.splice(change.start..change.start, change.lines.iter().cloned());
            }
            ChangeKind::Delete => {
                lines.drain(change.start..change.end);
            }
        }

        Ok(())
    }

    /// Line count of the current buffer (loads the file if needed).
    pub fn line_count(&mut self) -> Result<usize, LedgerError> {
        Ok(self.load()?.len())
    }

    /// Write the buffer back to the file path atomically: the write
    /// succeeds entirely or the file is left in its prior state.
    ///
    /// No-op if no edit ever loaded the buffer.
    pub fn save_changes(self) -> Result<(), LedgerError> {
        let Some(lines) = self.lines else {
            return Ok(());
        };

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        let dir = self.path.parent().unwrap_or(Path::new("."));
        let io_err = |e| LedgerError::Io(self.path.clone(), e);

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        temp.write_all(content.as_bytes()).map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(&self.path)
            .map_err(|e| LedgerError::Io(self.path.clone(), e.error))?;

        Ok(())
    }

    fn load(&mut self) -> Result<&mut Vec<String>, LedgerError> {
        if self.lines.is_none() {
            let content = fs::read_to_string(&self.path)
                .map_err(|e| LedgerError::Io(self.path.clone(), e))?;
            self.lines = Some(split_lines(&content));
        }
        // Just populated above
        Ok(self.lines.as_mut().unwrap())
    }
}

/// Split file content into physical lines, treating a final newline as
/// the terminator of the last line rather than the start of an empty one.
fn split_lines(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    let trimmed = content.strip_suffix('\n').unwrap_or(content);
    trimmed.split('\n').map(str::to_string).collect()
}
