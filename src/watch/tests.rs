use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use super::{Reconciler, is_relevant, is_temp_file};
use crate::config::Config;
use crate::state::LedgerContext;

const LEDGER: &str = "\
2025-01-01 open Assets:Bank:Checking USD

2025-01-02 * \"Grocery Store\" \"Groceries\"
    Assets:Bank:Checking -42.50 USD
    Assets:Bank:Checking 42.50 USD
";

fn make_context(content: &str) -> (TempDir, Arc<LedgerContext>) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("main.bean");
    std::fs::write(&path, content).unwrap();
    let ctx = LedgerContext::open(Config::for_ledger(&path)).unwrap();
    (temp, Arc::new(ctx))
}

fn make_event(paths: Vec<PathBuf>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths,
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::Any,
    ))
}

#[test]
fn test_relevant_requires_ledger_suffix() {
    let (temp, ctx) = make_context(LEDGER);
    let config = ctx.config();

    let bean = temp.path().join("txs.bean");
    std::fs::write(&bean, "").unwrap();
    assert!(is_relevant(&make_event(vec![bean], modify_kind()), config));

    let txt = temp.path().join("notes.txt");
    std::fs::write(&txt, "").unwrap();
    assert!(!is_relevant(&make_event(vec![txt], modify_kind()), config));
}

#[test]
fn test_directory_events_ignored() {
    let (temp, ctx) = make_context(LEDGER);

    let dir = temp.path().join("archive.bean");
    std::fs::create_dir(&dir).unwrap();
    assert!(!is_relevant(
        &make_event(vec![dir], modify_kind()),
        ctx.config()
    ));
}

#[test]
fn test_metadata_events_ignored() {
    let (temp, ctx) = make_context(LEDGER);
    let path = temp.path().join("main.bean");
    assert!(!is_relevant(
        &make_event(vec![path], metadata_kind()),
        ctx.config()
    ));
}

#[test]
fn test_removed_file_is_still_relevant() {
    // The path no longer exists, so the non-directory check must not
    // require it to.
    let (temp, ctx) = make_context(LEDGER);
    let gone = temp.path().join("deleted.bean");
    assert!(is_relevant(
        &make_event(vec![gone], notify::EventKind::Remove(notify::event::RemoveKind::File)),
        ctx.config()
    ));
}

#[test]
fn test_temp_files() {
    assert!(is_temp_file(&PathBuf::from("/x/main.bean.swp")));
    assert!(is_temp_file(&PathBuf::from("/x/main.bean~")));
    assert!(is_temp_file(&PathBuf::from("/x/.main.bean")));
    assert!(!is_temp_file(&PathBuf::from("/x/main.bean")));
}

#[test]
fn test_burst_of_events_reloads_once() {
    let (temp, ctx) = make_context(LEDGER);
    let path = temp.path().join("main.bean");
    let mut reconciler = Reconciler::new(Arc::clone(&ctx)).unwrap();

    let before = ctx.snapshot().generation;
    let event = make_event(vec![path], modify_kind());

    // An editor save typically produces several notifications
    reconciler.handle(&event);
    reconciler.handle(&event);
    reconciler.handle(&event);

    assert_eq!(ctx.snapshot().generation, before + 1);
}

#[test]
fn test_irrelevant_event_does_not_reload() {
    let (temp, ctx) = make_context(LEDGER);
    let txt = temp.path().join("notes.txt");
    std::fs::write(&txt, "").unwrap();
    let mut reconciler = Reconciler::new(Arc::clone(&ctx)).unwrap();

    let before = ctx.snapshot().generation;
    reconciler.handle(&make_event(vec![txt], modify_kind()));

    assert_eq!(ctx.snapshot().generation, before);
}

#[test]
fn test_reload_failure_keeps_serving_old_snapshot() {
    let (temp, ctx) = make_context(LEDGER);
    let path = temp.path().join("main.bean");
    let mut reconciler = Reconciler::new(Arc::clone(&ctx)).unwrap();

    std::fs::remove_file(&path).unwrap();
    reconciler.handle(&make_event(
        vec![path],
        notify::EventKind::Remove(notify::event::RemoveKind::File),
    ));

    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.entries.len(), 2);
}
