//! Line-range text patch engine.
//!
//! Entries are replaced in place by line range, not by syntax tree:
//! the locator derives an entry's current range from the start lines of
//! all entries in a fresh parse, and the text editor splices the
//! replacement into the file's line buffer and saves atomically.
//!
//! Pipeline:
//! ```text
//! EntryEditor: validate -> locate (fresh parse) -> ChangeSet -> TextEditor -> save
//! ```

mod changeset;
mod editor;
mod locator;
mod text_editor;

pub use editor::EntryEditor;
