//! Entry boundary inference.
//!
//! An entry records only the file and 1-based line it starts at; its
//! end boundary is re-derived from the start lines of all entries in a
//! fresh parse of its file. This keeps the parser free of explicit
//! end-of-entry bookkeeping, at the cost of the known limitation that
//! trailing comments or blank lines logically belonging to an entry are
//! attributed to the gap before its successor.

use crate::ledger::Entry;

/// A located entry range in 0-based line coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    /// Exclusive end; `None` means the entry is the last one and the
    /// range extends to the end of the file.
    pub end: Option<usize>,
    /// True when the fresh parse holds no entry at the searched start
    /// line: the file changed since the caller's view was taken. The
    /// range is still computed from the caller-supplied start line and
    /// must not be applied without surfacing the drift.
    pub drifted: bool,
}

/// Compute the line range `entry` currently occupies, given a fresh
/// parse of its file.
///
/// The end boundary is the smallest start line strictly greater than
/// the entry's own, taken across *all* entries in the fresh parse; if
/// none exists the entry is the last one and the range runs to file
/// end. Both boundaries are shifted down by one into 0-based
/// coordinates.
pub fn locate(entry: &Entry, fresh_entries: &[Entry]) -> LineRange {
    let start_lineno = entry.meta.lineno;

    let mut end_lineno: Option<u32> = None;
    let mut found = false;

    for fresh in fresh_entries {
        if fresh.meta.lineno == start_lineno && fresh.meta.filename == entry.meta.filename {
            found = true;
        }
        if fresh.meta.lineno > start_lineno
            && end_lineno.is_none_or(|end| fresh.meta.lineno < end)
        {
            end_lineno = Some(fresh.meta.lineno);
        }
    }

    LineRange {
        start: start_lineno.saturating_sub(1) as usize,
        end: end_lineno.map(|end| (end - 1) as usize),
        drifted: !found,
    }
}
