//! File watcher and reload reconciler.
//!
//! Watches the ledger root recursively and reconciles on-disk changes
//! into fresh snapshots:
//!
//! ```text
//! notify -> filter (ledger files only) -> cooldown -> reload
//! ```
//!
//! The filter and the cooldown are deliberately separate layers: the
//! filter decides whether a notification concerns the ledger at all,
//! the cooldown decides whether this burst already paid for a reload.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, RecvTimeoutError, unbounded};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::Config;
use crate::error::format_errors;
use crate::logger::{status_error, status_success, status_warning};
use crate::state::LedgerContext;
use crate::{debug, log};

mod cooldown;

#[cfg(test)]
mod tests;

use cooldown::Cooldown;

/// How often the event loop wakes up to check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Watches the ledger tree and keeps the context's snapshot current.
pub struct Reconciler {
    ctx: Arc<LedgerContext>,
    /// Watcher handle (must be kept alive for events to flow)
    _watcher: RecommendedWatcher,
    notify_rx: Receiver<notify::Result<notify::Event>>,
    cooldown: Cooldown,
}

impl Reconciler {
    /// Start watching the ledger root. Events begin buffering in the
    /// channel immediately, before `run` is entered.
    pub fn new(ctx: Arc<LedgerContext>) -> Result<Self> {
        let (notify_tx, notify_rx) = unbounded();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .context("cannot create file watcher")?;

        let root = ctx.config().root();
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("cannot watch `{}`", root.display()))?;

        log!("watch"; "watching {} for *{} changes", root.display(), ctx.config().suffix);

        let cooldown = Cooldown::new(Duration::from_secs(ctx.config().watch.cooldown_secs));

        Ok(Self {
            ctx,
            _watcher: watcher,
            notify_rx,
            cooldown,
        })
    }

    /// Run the reconcile loop until `shutdown` is set.
    pub fn run(mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::SeqCst) {
            match self.notify_rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => self.handle(&event),
                Ok(Err(e)) => log!("watch"; "notify error: {e}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn handle(&mut self, event: &notify::Event) {
        if !is_relevant(event, self.ctx.config()) {
            return;
        }

        debug!("watch"; "change: {:?} {:?}", event.kind, event.paths);

        if !self.cooldown.accept() {
            debug!("watch"; "within cooldown, skipped");
            return;
        }

        self.reconcile();
    }

    /// Reload the ledger and report the outcome on the status line.
    /// A failed reload leaves the previous snapshot serving.
    fn reconcile(&self) {
        match self.ctx.reload() {
            Ok(snapshot) => {
                if snapshot.errors.is_empty() {
                    status_success(&format!(
                        "reloaded: {} entries",
                        snapshot.entries.len()
                    ));
                } else {
                    status_warning(&format!(
                        "reloaded with {} error(s)\n{}",
                        snapshot.errors.len(),
                        format_errors(&snapshot.errors)
                    ));
                }
            }
            Err(e) => status_error("reload failed, keeping previous snapshot", &e.to_string()),
        }
    }
}

/// Whether a notification should count toward a reload: a data change
/// to a non-directory path carrying the ledger suffix, and not an
/// editor artifact.
fn is_relevant(event: &notify::Event, config: &Config) -> bool {
    use notify::EventKind;

    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => {}
        EventKind::Modify(modify) => {
            // mtime/atime/chmod noise would echo our own reloads
            if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                return false;
            }
        }
        _ => return false,
    }

    event
        .paths
        .iter()
        .any(|path| !path.is_dir() && !is_temp_file(path) && config.matches_suffix(path))
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
