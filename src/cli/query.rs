//! Query and listing commands.
//!
//! All three commands emit JSON on stdout so output can be piped into
//! other tooling; `--pretty` switches to indented form.

use anyhow::Result;
use serde::Serialize;

use crate::debug;
use crate::query;
use crate::state::LedgerContext;

/// Execute a query and print its result.
pub fn run_query(ctx: &LedgerContext, query_str: &str, pretty: bool) -> Result<()> {
    let snapshot = ctx.snapshot();
    let result = query::run_query(&snapshot, query_str, ctx.config().query.max_rows)?;

    debug!("query"; "{} row(s)", result.rows.len());
    print_json(&result, pretty)
}

/// Print every account the current snapshot mentions, sorted.
pub fn list_accounts(ctx: &LedgerContext, pretty: bool) -> Result<()> {
    let snapshot = ctx.snapshot();
    let accounts: Vec<&String> = snapshot.accounts.iter().collect();
    print_json(&accounts, pretty)
}

/// Print ledger files under the root, relative to it, sorted.
pub fn list_files(ctx: &LedgerContext, pretty: bool) -> Result<()> {
    print_json(&ctx.files(), pretty)
}

pub(super) fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let formatted = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{formatted}");
    Ok(())
}
