//! Canonical entry serializer.
//!
//! Renders a single entry back into ledger text, terminated by exactly
//! one newline. The output is the canonical form: re-parsing it and
//! rendering again is textually stable.

use std::fmt::Write;

use super::{Entry, EntryKind, Transaction};

/// Posting indent, matching the conventional beancount layout.
const INDENT: &str = "    ";

/// Render a single entry as canonical ledger text.
pub fn render(entry: &Entry) -> String {
    let mut out = String::new();

    match &entry.kind {
        EntryKind::Transaction(txn) => render_transaction(&mut out, entry, txn),
        EntryKind::Open {
            account,
            currencies,
        } => {
            let _ = write!(out, "{} open {account}", entry.date);
            if !currencies.is_empty() {
                let _ = write!(out, " {}", currencies.join(","));
            }
        }
        EntryKind::Close { account } => {
            let _ = write!(out, "{} close {account}", entry.date);
        }
        EntryKind::Balance { account, amount } => {
            let _ = write!(out, "{} balance {account} {amount}", entry.date);
        }
        EntryKind::Note { account, comment } => {
            let _ = write!(out, "{} note {account} \"{}\"", entry.date, escape(comment));
        }
        EntryKind::Price { currency, amount } => {
            let _ = write!(out, "{} price {currency} {amount}", entry.date);
        }
        EntryKind::Event { name, value } => {
            let _ = write!(
                out,
                "{} event \"{}\" \"{}\"",
                entry.date,
                escape(name),
                escape(value)
            );
        }
    }

    out.push('\n');
    out
}

fn render_transaction(out: &mut String, entry: &Entry, txn: &Transaction) {
    let _ = write!(out, "{} {}", entry.date, txn.flag.symbol());

    if let Some(payee) = &txn.payee {
        let _ = write!(out, " \"{}\"", escape(payee));
    }
    let _ = write!(out, " \"{}\"", escape(&txn.narration));

    for tag in &txn.tags {
        let _ = write!(out, " #{tag}");
    }
    for link in &txn.links {
        let _ = write!(out, " ^{link}");
    }

    for posting in &txn.postings {
        let _ = write!(out, "\n{INDENT}{}", posting.account);
        if let Some(amount) = &posting.amount {
            let _ = write!(out, " {amount}");
        }
    }
}

fn escape(s: &str) -> String {
    if s.contains('"') || s.contains('\\') {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    } else {
        s.to_string()
    }
}
