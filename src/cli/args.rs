//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Beanpatch plain-text ledger toolkit
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: beanpatch.toml)
    #[arg(short = 'C', long, default_value = "beanpatch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Ledger entrypoint file (overrides the config file)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub ledger: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a query over the ledger (SELECT ... [WHERE ...] [LIMIT n])
    #[command(visible_alias = "q")]
    Query {
        /// Query string
        query: String,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List every account the ledger mentions
    #[command(visible_alias = "a")]
    Accounts {
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List ledger files under the entrypoint's directory tree
    #[command(visible_alias = "f")]
    Files {
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print a transaction by its content identifier
    #[command(visible_alias = "g")]
    Get {
        /// Transaction identifier (from the `id` query column)
        id: String,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate and append a transaction to a ledger file
    #[command(visible_alias = "s")]
    Submit {
        /// Target file relative to the ledger root (default: the entrypoint)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        file: Option<PathBuf>,

        /// Transaction text. Reads stdin when omitted.
        text: Option<String>,
    },

    /// Replace a transaction in place by its content identifier
    #[command(visible_alias = "r")]
    Replace {
        /// Transaction identifier of the entry to replace
        id: String,

        /// Replacement text. Reads stdin when omitted.
        text: Option<String>,
    },

    /// Watch ledger files and reload snapshots on change
    #[command(visible_alias = "w")]
    Watch,

    /// Print today's date in ledger form (YYYY-MM-DD)
    Today,
}
