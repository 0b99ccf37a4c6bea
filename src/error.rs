//! Ledger error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::ledger::ParseError;

/// Errors surfaced by ledger operations.
///
/// Validation and lookup failures are always reported before any disk
/// write; only `Io` during a save can leave the target in an ambiguous
/// state, and that ambiguity is bounded by atomic-write semantics
/// (full old file or full new file, never a mix).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Replacement or submitted text failed an isolated parse.
    /// The target file is untouched.
    #[error("text failed to parse ({})", format_errors(.0))]
    Validation(Vec<ParseError>),

    /// No entry in the current snapshot matches the given identifier.
    #[error("no transaction with id `{0}` in the current snapshot")]
    NotFound(String),

    /// File unreadable, unwritable, or disappeared between open and save.
    #[error("I/O error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// The fresh re-parse used for locating no longer contains an entry
    /// at the expected start line: the file changed since the caller's
    /// view was taken. The edit is rejected before any write.
    #[error("entry boundary drifted: no entry at {file}:{line} in fresh parse")]
    BoundaryDrift { file: PathBuf, line: u32 },

    /// Query string could not be parsed or executed.
    #[error("query error: {0}")]
    Query(String),
}

/// One-line summary of a diagnostic list, for error messages and the
/// watch status line.
pub fn format_errors(errors: &[ParseError]) -> String {
    match errors {
        [] => String::new(),
        [only] => only.to_string(),
        [first, ..] => format!("{} errors, first: {}", errors.len(), first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = LedgerError::Validation(vec![ParseError {
            file: PathBuf::from("main.bean"),
            line: 3,
            message: "unrecognized directive".into(),
        }]);
        let display = format!("{err}");
        assert!(display.contains("main.bean:3"));
        assert!(display.contains("unrecognized directive"));
    }

    #[test]
    fn test_boundary_drift_display() {
        let err = LedgerError::BoundaryDrift {
            file: PathBuf::from("txs/2025.bean"),
            line: 42,
        };
        assert!(format!("{err}").contains("txs/2025.bean:42"));
    }
}
