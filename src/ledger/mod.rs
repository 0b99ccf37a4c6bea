//! Ledger data model and text boundary.
//!
//! The ledger is one or more plain-text files of dated directives in
//! beancount-style syntax. This module owns the semantic model (`Entry`
//! and friends), the parser, the canonical serializer, and the
//! content-derived entry identifier.

mod date;
mod hash;
mod parse;
mod render;

pub use date::Date;
pub use hash::content_hash;
pub use parse::{parse_file, parse_string};
pub use render::render;

use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

/// Source location of an entry: the file it was parsed from and its
/// 1-based start line. This is the sole linkage the locator needs to
/// re-derive a line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub filename: PathBuf,
    pub lineno: u32,
}

/// Transaction flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// `*` - confirmed
    Cleared,
    /// `!` - needs attention
    Pending,
}

impl Flag {
    pub const fn symbol(self) -> char {
        match self {
            Self::Cleared => '*',
            Self::Pending => '!',
        }
    }
}

/// A currency amount, with the decimal kept as parsed text so rendering
/// never reformats what the user wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub number: String,
    pub currency: String,
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}

/// One leg of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    /// None means the amount is elided (balanced against the other legs)
    pub amount: Option<Amount>,
}

/// A dated transaction with its postings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub flag: Flag,
    pub payee: Option<String>,
    pub narration: String,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub postings: Vec<Posting>,
}

/// Directive-specific payload of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Transaction(Transaction),
    Open {
        account: String,
        currencies: Vec<String>,
    },
    Close {
        account: String,
    },
    Balance {
        account: String,
        amount: Amount,
    },
    Note {
        account: String,
        comment: String,
    },
    Price {
        currency: String,
        amount: Amount,
    },
    Event {
        name: String,
        value: String,
    },
}

/// One semantic ledger record: a dated directive parsed from ledger text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub date: Date,
    pub kind: EntryKind,
    pub meta: Meta,
}

impl Entry {
    /// Content-derived identifier, stable across re-parses as long as
    /// the canonical content is unchanged.
    pub fn id(&self) -> String {
        content_hash(self)
    }

    pub const fn as_transaction(&self) -> Option<&Transaction> {
        match &self.kind {
            EntryKind::Transaction(txn) => Some(txn),
            _ => None,
        }
    }
}

/// A parse diagnostic tied to a source location. Parse errors are
/// retained and served, never fatal: a ledger with some malformed
/// entries still answers queries over the entries that did parse.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParseError {
    pub file: PathBuf,
    pub line: u32,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.file.display(), self.line, self.message)
    }
}

/// Result of parsing a ledger: entries in file order, diagnostics, and
/// the option map from `option` directives.
#[derive(Debug, Default)]
pub struct Ledger {
    pub entries: Vec<Entry>,
    pub errors: Vec<ParseError>,
    pub options: FxHashMap<String, String>,
}
