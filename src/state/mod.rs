//! Authoritative ledger snapshot with atomic reload.
//!
//! Uses `arc-swap` for lock-free reads and wholesale snapshot
//! replacement: readers observe either the fully-old or fully-new
//! snapshot, never a partially updated one. The context is an explicit
//! object passed to every operation, so tests can run multiple ledgers
//! per process.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::debug;
use crate::edit::EntryEditor;
use crate::error::LedgerError;
use crate::ledger::{Entry, EntryKind, ParseError, parse_file, parse_string, render};
use crate::log;

/// The complete parsed state of the ledger at one point in time.
///
/// Replaced wholesale on every reload, never mutated in place.
#[derive(Debug)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub errors: Vec<ParseError>,
    pub options: FxHashMap<String, String>,
    /// All accounts opened or referenced by postings, sorted
    pub accounts: BTreeSet<String>,
    /// Monotonically increasing reload counter
    pub generation: u64,
    pub loaded_at: SystemTime,
}

/// A transaction looked up by identifier: its canonical text plus the
/// source location it was parsed from.
#[derive(Debug, serde::Serialize)]
pub struct TransactionView {
    pub transaction: String,
    pub location: Location,
}

#[derive(Debug, serde::Serialize)]
pub struct Location {
    pub filename: PathBuf,
    pub lineno: u32,
}

/// Process-wide ledger state owner.
///
/// Holds the entrypoint path and the current snapshot; edits and the
/// file watcher both funnel through `reload` to publish new snapshots.
pub struct LedgerContext {
    config: Config,
    snapshot: ArcSwap<Snapshot>,
    generation: AtomicU64,
}

impl LedgerContext {
    /// Parse the entrypoint file and build the initial snapshot.
    pub fn open(config: Config) -> Result<Self, LedgerError> {
        let ledger = parse_file(&config.ledger)?;
        let snapshot = build_snapshot(ledger, 1);
        log_snapshot(&snapshot);

        Ok(Self {
            config,
            snapshot: ArcSwap::from_pointee(snapshot),
            generation: AtomicU64::new(1),
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Current snapshot reference. Callers hold the `Arc` for the
    /// duration of one operation and never cache it across reloads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Re-parse the entrypoint and replace the snapshot wholesale.
    ///
    /// Parse diagnostics are retained inside the new snapshot, not
    /// fatal. A hard I/O failure (entrypoint missing or unreadable)
    /// surfaces to the caller and leaves the previous snapshot in
    /// place, so readers keep serving the last good state.
    pub fn reload(&self) -> Result<Arc<Snapshot>, LedgerError> {
        let ledger = parse_file(&self.config.ledger)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(build_snapshot(ledger, generation));
        log_snapshot(&snapshot);

        self.snapshot.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// All ledger files under the entrypoint's directory tree, relative
    /// to it, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let root = self.config.root();
        let mut files: Vec<PathBuf> = jwalk::WalkDir::new(&root)
            .skip_hidden(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|p| self.config.matches_suffix(p))
            .filter_map(|p| p.strip_prefix(&root).map(Path::to_path_buf).ok())
            .collect();
        files.sort();
        files
    }

    /// Look up a transaction by its content-derived identifier.
    pub fn get_transaction(&self, id: &str) -> Result<TransactionView, LedgerError> {
        let snapshot = self.snapshot();
        let entry = find_transaction(&snapshot, id)?;

        Ok(TransactionView {
            transaction: render(entry),
            location: Location {
                filename: entry.meta.filename.clone(),
                lineno: entry.meta.lineno,
            },
        })
    }

    /// Append a transaction to a ledger file and reload.
    ///
    /// The text is validated in isolation before the file is touched.
    /// With no explicit file, the entrypoint receives the append;
    /// otherwise the path is resolved relative to the ledger root and
    /// must already exist.
    pub fn submit_transaction(
        &self,
        text: &str,
        file: Option<&Path>,
    ) -> Result<(), LedgerError> {
        let parsed = parse_string(text);
        if !parsed.errors.is_empty() {
            return Err(LedgerError::Validation(parsed.errors));
        }

        let target = match file {
            None => self.config.ledger.clone(),
            Some(rel) => {
                let path = self.config.root().join(rel);
                if !path.is_file() {
                    return Err(LedgerError::Io(
                        path.clone(),
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "submit target does not exist",
                        ),
                    ));
                }
                path
            }
        };

        // Leading newline separates the appended entry from whatever
        // the file currently ends with.
        let block = format!("\n{}\n", text.trim_end_matches('\n'));
        let io_err = |e| LedgerError::Io(target.clone(), e);
        let mut handle = fs::OpenOptions::new()
            .append(true)
            .open(&target)
            .map_err(io_err)?;
        handle.write_all(block.as_bytes()).map_err(io_err)?;

        debug!("edit"; "appended {} bytes to {}", block.len(), target.display());
        self.reload()?;
        Ok(())
    }

    /// Replace the transaction with the given identifier by new ledger
    /// text, then reload.
    pub fn replace_transaction(&self, id: &str, text: &str) -> Result<(), LedgerError> {
        let snapshot = self.snapshot();
        let old_entry = find_transaction(&snapshot, id)?.clone();

        EntryEditor::replace_entry_with_string(&old_entry, text, true)?;
        self.reload()?;
        Ok(())
    }
}

fn find_transaction<'a>(snapshot: &'a Snapshot, id: &str) -> Result<&'a Entry, LedgerError> {
    snapshot
        .entries
        .iter()
        .filter(|e| matches!(e.kind, EntryKind::Transaction(_)))
        .find(|e| e.id() == id)
        .ok_or_else(|| LedgerError::NotFound(id.to_string()))
}

fn build_snapshot(ledger: crate::ledger::Ledger, generation: u64) -> Snapshot {
    let mut accounts = BTreeSet::new();
    for entry in &ledger.entries {
        match &entry.kind {
            EntryKind::Transaction(txn) => {
                for posting in &txn.postings {
                    accounts.insert(posting.account.clone());
                }
            }
            EntryKind::Open { account, .. }
            | EntryKind::Close { account }
            | EntryKind::Balance { account, .. }
            | EntryKind::Note { account, .. } => {
                accounts.insert(account.clone());
            }
            EntryKind::Price { .. } | EntryKind::Event { .. } => {}
        }
    }

    Snapshot {
        entries: ledger.entries,
        errors: ledger.errors,
        options: ledger.options,
        accounts,
        generation,
        loaded_at: SystemTime::now(),
    }
}

fn log_snapshot(snapshot: &Snapshot) {
    if snapshot.errors.is_empty() {
        debug!("load"; "parsed {} entries (generation {})", snapshot.entries.len(), snapshot.generation);
    } else {
        log!("load"; "parsed {} entries, {} error(s)", snapshot.entries.len(), snapshot.errors.len());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEDGER: &str = "\
2025-01-01 open Assets:Bank:Checking USD
2025-01-01 open Expenses:Groceries

2025-01-02 * \"Grocery Store\" \"Groceries\"
    Assets:Bank:Checking -42.50 USD
    Expenses:Groceries 42.50 USD
";

    fn make_context(content: &str) -> (TempDir, LedgerContext) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.bean");
        fs::write(&path, content).unwrap();
        let config = Config::for_ledger(&path);
        (temp, LedgerContext::open(config).unwrap())
    }

    #[test]
    fn test_open_builds_account_index() {
        let (_temp, ctx) = make_context(LEDGER);
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.entries.len(), 3);
        assert!(snapshot.accounts.contains("Assets:Bank:Checking"));
        assert!(snapshot.accounts.contains("Expenses:Groceries"));
        assert_eq!(snapshot.generation, 1);
    }

    #[test]
    fn test_reload_replaces_snapshot_wholesale() {
        let (temp, ctx) = make_context(LEDGER);
        let before = ctx.snapshot();

        fs::write(
            temp.path().join("main.bean"),
            format!("{LEDGER}\n2025-01-03 * \"more\"\n    Expenses:Groceries 1.00 USD\n    Assets:Bank:Checking -1.00 USD\n"),
        )
        .unwrap();

        let after = ctx.reload().unwrap();
        assert_eq!(after.entries.len(), 4);
        assert_eq!(after.generation, 2);
        // The old reference still sees the old state
        assert_eq!(before.entries.len(), 3);
    }

    #[test]
    fn test_reload_failure_keeps_previous_snapshot() {
        let (temp, ctx) = make_context(LEDGER);
        fs::remove_file(temp.path().join("main.bean")).unwrap();

        let err = ctx.reload().unwrap_err();
        assert!(matches!(err, LedgerError::Io(..)));
        // Stale-but-good snapshot still served
        assert_eq!(ctx.snapshot().entries.len(), 3);
        assert_eq!(ctx.snapshot().generation, 1);
    }

    #[test]
    fn test_parse_errors_are_retained_not_fatal() {
        let (_temp, ctx) = make_context("2025-01-01 bogus\n2025-01-02 * \"fine\"\n");
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.entries.len(), 1);
    }

    #[test]
    fn test_get_transaction_by_id() {
        let (_temp, ctx) = make_context(LEDGER);
        let snapshot = ctx.snapshot();
        let id = snapshot.entries[2].id();

        let view = ctx.get_transaction(&id).unwrap();
        assert!(view.transaction.contains("Grocery Store"));
        assert_eq!(view.location.lineno, 4);
    }

    #[test]
    fn test_get_transaction_unknown_id() {
        let (_temp, ctx) = make_context(LEDGER);
        let err = ctx.get_transaction("deadbeefdeadbeef").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn test_submit_appends_after_existing_entries() {
        let (_temp, ctx) = make_context(LEDGER);
        let before = ctx.snapshot().entries.len();

        ctx.submit_transaction(
            "2025-01-04 * \"Lunch\"\n    Expenses:Groceries 12.00 USD\n    Assets:Bank:Checking -12.00 USD\n",
            None,
        )
        .unwrap();

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.entries.len(), before + 1);
        // New entry sits after the originals in file order
        let last = snapshot.entries.last().unwrap();
        assert_eq!(last.as_transaction().unwrap().narration, "Lunch");
        assert!(last.meta.lineno > snapshot.entries[before - 1].meta.lineno);
    }

    #[test]
    fn test_submit_invalid_text_rejected_before_write() {
        let (temp, ctx) = make_context(LEDGER);
        let before = fs::read_to_string(temp.path().join("main.bean")).unwrap();

        let err = ctx.submit_transaction("2025-01-04 nonsense\n", None).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(
            fs::read_to_string(temp.path().join("main.bean")).unwrap(),
            before
        );
    }

    #[test]
    fn test_submit_to_missing_file_fails() {
        let (_temp, ctx) = make_context(LEDGER);
        let err = ctx
            .submit_transaction("2025-01-04 * \"x\"\n", Some(Path::new("gone.bean")))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Io(..)));
    }

    #[test]
    fn test_replace_transaction_end_to_end() {
        let (_temp, ctx) = make_context(LEDGER);
        let old_id = ctx.snapshot().entries[2].id();

        ctx.replace_transaction(
            &old_id,
            "2025-01-02 * \"Grocery Store\" \"Weekly shop\"\n    Assets:Bank:Checking -45.00 USD\n    Expenses:Groceries 45.00 USD\n",
        )
        .unwrap();

        let snapshot = ctx.snapshot();
        let ids: Vec<_> = snapshot.entries.iter().map(Entry::id).collect();
        assert!(!ids.contains(&old_id));
        assert!(
            snapshot
                .entries
                .iter()
                .any(|e| e.as_transaction().is_some_and(|t| t.narration == "Weekly shop"))
        );
    }

    #[test]
    fn test_files_lists_ledger_files_relative_to_root() {
        let (temp, ctx) = make_context(LEDGER);
        fs::create_dir(temp.path().join("txs")).unwrap();
        fs::write(temp.path().join("txs/2025.bean"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let files = ctx.files();
        assert_eq!(
            files,
            vec![PathBuf::from("main.bean"), PathBuf::from("txs/2025.bean")]
        );
    }
}
