//! Transaction lookup and editing commands.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::query::print_json;
use crate::log;
use crate::state::LedgerContext;

/// Print the transaction with the given identifier as JSON: canonical
/// text plus source location.
pub fn get_transaction(ctx: &LedgerContext, id: &str, pretty: bool) -> Result<()> {
    let view = ctx.get_transaction(id)?;
    print_json(&view, pretty)
}

/// Validate and append a transaction, then report where it landed.
pub fn submit_transaction(
    ctx: &LedgerContext,
    file: Option<&Path>,
    text: Option<&str>,
) -> Result<()> {
    let text = resolve_text(text)?;
    ctx.submit_transaction(&text, file)?;

    let target = file.map_or_else(
        || ctx.config().ledger.display().to_string(),
        |f| f.display().to_string(),
    );
    log!("edit"; "appended transaction to {target}");
    Ok(())
}

/// Replace the transaction with the given identifier in place.
pub fn replace_transaction(ctx: &LedgerContext, id: &str, text: Option<&str>) -> Result<()> {
    let text = resolve_text(text)?;
    ctx.replace_transaction(id, &text)?;

    log!("edit"; "replaced transaction {id}");
    Ok(())
}

/// Transaction text from the argument, or stdin when omitted.
fn resolve_text(text: Option<&str>) -> Result<String> {
    let text = match text {
        Some(t) => t.to_string(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("cannot read transaction text from stdin")?;
            buffer
        }
    };
    if text.trim().is_empty() {
        bail!("no transaction text given");
    }
    Ok(text)
}
