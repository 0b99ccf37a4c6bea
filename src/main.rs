//! Beanpatch - query and line-safe in-place editing for plain-text ledgers.

mod cli;
mod config;
mod edit;
mod error;
mod ledger;
mod logger;
mod query;
mod state;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;
use state::LedgerContext;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    logger::set_verbose(cli.verbose);

    if matches!(cli.command, Commands::Today) {
        // No ledger needed for the date helper
        println!("{}", ledger::Date::today());
        return Ok(());
    }

    let config = Config::load(&cli)?;
    let ctx = LedgerContext::open(config)?;

    match &cli.command {
        Commands::Query { query, pretty } => cli::query::run_query(&ctx, query, *pretty),
        Commands::Accounts { pretty } => cli::query::list_accounts(&ctx, *pretty),
        Commands::Files { pretty } => cli::query::list_files(&ctx, *pretty),
        Commands::Get { id, pretty } => cli::edit::get_transaction(&ctx, id, *pretty),
        Commands::Submit { file, text } => {
            cli::edit::submit_transaction(&ctx, file.as_deref(), text.as_deref())
        }
        Commands::Replace { id, text } => cli::edit::replace_transaction(&ctx, id, text.as_deref()),
        Commands::Watch => cli::watch::run_watch(ctx),
        Commands::Today => unreachable!("handled above"),
    }
}
