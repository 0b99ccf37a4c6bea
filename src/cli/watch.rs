//! Watch command: run the reload reconciler until Ctrl-C.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use crate::log;
use crate::state::LedgerContext;
use crate::watch::Reconciler;

pub fn run_watch(ctx: LedgerContext) -> Result<()> {
    let ctx = Arc::new(ctx);
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("cannot install Ctrl-C handler")?;
    }

    let reconciler = Reconciler::new(Arc::clone(&ctx))?;
    log!("watch"; "press Ctrl-C to stop");
    reconciler.run(&shutdown);
    log!("watch"; "stopped");
    Ok(())
}
