//! Ledger text parser.
//!
//! Parses a practical beancount-style subset: dated directives
//! (`txn`/`*`/`!`, `open`, `close`, `balance`, `note`, `price`, `event`)
//! with indented posting continuation lines, plus undated `option`,
//! `include` and `plugin` lines and `;` comments.
//!
//! Malformed lines become `ParseError` diagnostics, never a panic, and
//! never abort the parse: the entries that did parse are still returned.
//! Every entry records its originating file and 1-based start line.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::{Amount, Date, Entry, EntryKind, Flag, Ledger, Meta, ParseError, Posting, Transaction};
use crate::error::LedgerError;

/// Parse a ledger file, resolving `include` directives recursively
/// relative to the including file. Include cycles are broken silently.
///
/// A hard I/O failure on the entrypoint itself is fatal; unreadable
/// included files degrade to parse diagnostics.
pub fn parse_file(path: &Path) -> Result<Ledger, LedgerError> {
    let text =
        fs::read_to_string(path).map_err(|e| LedgerError::Io(path.to_path_buf(), e))?;

    let mut ledger = Ledger::default();
    let mut visited = FxHashSet::default();
    visited.insert(normalize(path));

    parse_into(&text, path, &mut ledger, &mut visited, true);
    Ok(ledger)
}

/// Parse ledger text in isolation (validation-only use).
///
/// `include` directives are skipped: there is no governing file to
/// resolve them against. Entries carry the `<string>` pseudo-filename.
pub fn parse_string(text: &str) -> Ledger {
    let mut ledger = Ledger::default();
    let mut visited = FxHashSet::default();
    parse_into(text, Path::new("<string>"), &mut ledger, &mut visited, false);
    ledger
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Parse one file's text into the shared ledger, recursing into includes.
fn parse_into(
    text: &str,
    file: &Path,
    ledger: &mut Ledger,
    visited: &mut FxHashSet<PathBuf>,
    resolve_includes: bool,
) {
    // Index of the entry currently accepting continuation lines
    let mut current: Option<usize> = None;

    for (idx, line) in text.lines().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let lineno = (idx + 1) as u32;

        let trimmed = line.trim_end();
        if trimmed.trim_start().is_empty() {
            current = None;
            continue;
        }

        // Full-line comment closes the current directive
        if trimmed.starts_with(';') {
            current = None;
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            parse_continuation(trimmed, file, lineno, current, ledger);
            continue;
        }

        // Column-0 content starts a new context
        current = None;

        let tokens = match tokenize(trimmed) {
            Ok(tokens) => tokens,
            Err(message) => {
                ledger.errors.push(error(file, lineno, message));
                continue;
            }
        };
        let Some(first) = tokens.first() else {
            continue;
        };

        if let Tok::Word(word) = first
            && let Some(date) = Date::parse(word)
        {
            match parse_directive(date, &tokens[1..]) {
                Ok(kind) => {
                    ledger.entries.push(Entry {
                        date,
                        kind,
                        meta: Meta {
                            filename: file.to_path_buf(),
                            lineno,
                        },
                    });
                    // Every dated directive accepts continuation lines;
                    // only transactions attach semantics to them.
                    current = Some(ledger.entries.len() - 1);
                }
                Err(message) => ledger.errors.push(error(file, lineno, message)),
            }
            continue;
        }

        parse_undated(&tokens, file, lineno, ledger, visited, resolve_includes);
    }
}

/// Parse an indented continuation line (posting or metadata).
fn parse_continuation(
    line: &str,
    file: &Path,
    lineno: u32,
    current: Option<usize>,
    ledger: &mut Ledger,
) {
    let Some(idx) = current else {
        ledger
            .errors
            .push(error(file, lineno, "indented line outside a directive".into()));
        return;
    };

    let EntryKind::Transaction(txn) = &mut ledger.entries[idx].kind else {
        // Metadata lines under non-transaction directives are ignored
        return;
    };

    let body = line.trim_start();
    if body.starts_with(';') {
        return;
    }

    let tokens = match tokenize(body) {
        Ok(tokens) => tokens,
        Err(message) => {
            ledger.errors.push(error(file, lineno, message));
            return;
        }
    };

    // `key: "value"` metadata lines attach no semantics in this subset
    if let Some(Tok::Word(word)) = tokens.first()
        && word.ends_with(':')
    {
        return;
    }

    match parse_posting(&tokens) {
        Ok(posting) => txn.postings.push(posting),
        Err(message) => ledger.errors.push(error(file, lineno, message)),
    }
}

/// Parse an undated column-0 directive: option / include / plugin.
fn parse_undated(
    tokens: &[Tok],
    file: &Path,
    lineno: u32,
    ledger: &mut Ledger,
    visited: &mut FxHashSet<PathBuf>,
    resolve_includes: bool,
) {
    let Tok::Word(keyword) = &tokens[0] else {
        ledger
            .errors
            .push(error(file, lineno, "unrecognized directive".into()));
        return;
    };

    match keyword.as_str() {
        "option" => match (tokens.get(1), tokens.get(2)) {
            (Some(Tok::Quoted(key)), Some(Tok::Quoted(value))) => {
                ledger.options.insert(key.clone(), value.clone());
            }
            _ => ledger.errors.push(error(
                file,
                lineno,
                "option expects two quoted strings".into(),
            )),
        },
        "include" => {
            let Some(Tok::Quoted(rel)) = tokens.get(1) else {
                ledger
                    .errors
                    .push(error(file, lineno, "include expects a quoted path".into()));
                return;
            };
            if !resolve_includes {
                return;
            }

            let target = file.parent().unwrap_or(Path::new(".")).join(rel);
            let key = normalize(&target);
            if !visited.insert(key) {
                return; // Include cycle
            }

            match fs::read_to_string(&target) {
                Ok(text) => parse_into(&text, &target, ledger, visited, true),
                Err(e) => ledger.errors.push(error(
                    file,
                    lineno,
                    format!("cannot read include `{}`: {e}", target.display()),
                )),
            }
        }
        "plugin" => {} // Accepted and ignored
        _ => ledger
            .errors
            .push(error(file, lineno, format!("unrecognized directive `{keyword}`"))),
    }
}

/// Parse the token tail of a dated directive.
fn parse_directive(_date: Date, tokens: &[Tok]) -> Result<EntryKind, String> {
    let Some(Tok::Word(keyword)) = tokens.first() else {
        return Err("expected a directive keyword or flag after the date".into());
    };

    match keyword.as_str() {
        "*" | "!" | "txn" => parse_transaction(keyword, &tokens[1..]),
        "open" => {
            let account = expect_account(tokens.get(1))?;
            let currencies = match tokens.get(2) {
                Some(Tok::Word(list)) => list.split(',').map(str::to_string).collect(),
                Some(Tok::Quoted(_)) => return Err("open currencies must be bare words".into()),
                None => Vec::new(),
            };
            Ok(EntryKind::Open {
                account,
                currencies,
            })
        }
        "close" => Ok(EntryKind::Close {
            account: expect_account(tokens.get(1))?,
        }),
        "balance" => Ok(EntryKind::Balance {
            account: expect_account(tokens.get(1))?,
            amount: expect_amount(tokens.get(2), tokens.get(3))?,
        }),
        "note" => Ok(EntryKind::Note {
            account: expect_account(tokens.get(1))?,
            comment: expect_quoted(tokens.get(2), "note comment")?,
        }),
        "price" => {
            let Some(Tok::Word(currency)) = tokens.get(1) else {
                return Err("price expects a currency".into());
            };
            Ok(EntryKind::Price {
                currency: currency.clone(),
                amount: expect_amount(tokens.get(2), tokens.get(3))?,
            })
        }
        "event" => Ok(EntryKind::Event {
            name: expect_quoted(tokens.get(1), "event name")?,
            value: expect_quoted(tokens.get(2), "event value")?,
        }),
        other => Err(format!("unsupported directive `{other}`")),
    }
}

fn parse_transaction(flag_word: &str, tokens: &[Tok]) -> Result<EntryKind, String> {
    let flag = match flag_word {
        "!" => Flag::Pending,
        _ => Flag::Cleared, // `*` and bare `txn`
    };

    let mut strings = Vec::new();
    let mut tags = Vec::new();
    let mut links = Vec::new();

    for token in tokens {
        match token {
            Tok::Quoted(s) => strings.push(s.clone()),
            Tok::Word(word) if word.starts_with('#') => tags.push(word[1..].to_string()),
            Tok::Word(word) if word.starts_with('^') => links.push(word[1..].to_string()),
            Tok::Word(word) => {
                return Err(format!("unexpected token `{word}` in transaction header"));
            }
        }
    }

    let (payee, narration) = match strings.len() {
        0 => (None, String::new()),
        1 => (None, strings.remove(0)),
        2 => {
            let narration = strings.remove(1);
            (Some(strings.remove(0)), narration)
        }
        n => return Err(format!("transaction header has {n} strings, expected at most 2")),
    };

    Ok(EntryKind::Transaction(Transaction {
        flag,
        payee,
        narration,
        tags,
        links,
        postings: Vec::new(),
    }))
}

fn parse_posting(tokens: &[Tok]) -> Result<Posting, String> {
    let account = expect_account(tokens.first())?;

    let amount = match (tokens.get(1), tokens.get(2)) {
        (None, _) => None,
        (Some(number), Some(currency)) => Some(amount_from(number, currency)?),
        (Some(_), None) => return Err("posting amount is missing a currency".into()),
    };

    if tokens.len() > 3 {
        return Err("unsupported posting syntax after the amount".into());
    }

    Ok(Posting { account, amount })
}

// ============================================================================
// Token helpers
// ============================================================================

fn expect_account(token: Option<&Tok>) -> Result<String, String> {
    match token {
        Some(Tok::Word(word)) if is_account(word) => Ok(word.clone()),
        Some(Tok::Word(word)) => Err(format!("`{word}` is not a valid account name")),
        _ => Err("expected an account name".into()),
    }
}

fn expect_quoted(token: Option<&Tok>, what: &str) -> Result<String, String> {
    match token {
        Some(Tok::Quoted(s)) => Ok(s.clone()),
        _ => Err(format!("expected a quoted {what}")),
    }
}

fn expect_amount(number: Option<&Tok>, currency: Option<&Tok>) -> Result<Amount, String> {
    match (number, currency) {
        (Some(number), Some(currency)) => amount_from(number, currency),
        _ => Err("expected `<number> <currency>`".into()),
    }
}

fn amount_from(number: &Tok, currency: &Tok) -> Result<Amount, String> {
    let (Tok::Word(number), Tok::Word(currency)) = (number, currency) else {
        return Err("amounts must be bare words".into());
    };
    if !is_number(number) {
        return Err(format!("`{number}` is not a valid amount"));
    }
    Ok(Amount {
        number: number.clone(),
        currency: currency.clone(),
    })
}

/// Account names look like `Assets:Bank:Checking`: capitalized segments
/// joined by colons.
fn is_account(word: &str) -> bool {
    word.contains(':')
        && word
            .split(':')
            .all(|seg| seg.chars().next().is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit()))
}

fn is_number(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
        && word
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Word(String),
    Quoted(String),
}

/// Split a line into bare words and quoted strings. Inline `;` comments
/// terminate the token stream.
fn tokenize(line: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == ';' {
            break;
        }

        if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err("unterminated string".into());
            }
            tokens.push(Tok::Quoted(value));
            continue;
        }

        let mut end = start;
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_whitespace() || c == '"' || c == ';' {
                break;
            }
            end = idx + c.len_utf8();
            chars.next();
        }
        tokens.push(Tok::Word(line[start..end].to_string()));
    }

    Ok(tokens)
}

fn error(file: &Path, line: u32, message: String) -> ParseError {
    ParseError {
        file: file.to_path_buf(),
        line,
        message,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
2025-01-01 open Assets:Bank:Checking USD
2025-01-02 * \"Grocery Store\" \"Groceries\" #food
    Assets:Bank:Checking -42.50 USD
    Expenses:Groceries 42.50 USD

2025-01-03 ! \"Pending refund\"
    Assets:Bank:Checking
    Income:Refunds -10.00 USD
";

    #[test]
    fn test_parse_sample() {
        let ledger = parse_string(SAMPLE);
        assert!(ledger.errors.is_empty(), "{:?}", ledger.errors);
        assert_eq!(ledger.entries.len(), 3);

        let txn = ledger.entries[1].as_transaction().unwrap();
        assert_eq!(txn.payee.as_deref(), Some("Grocery Store"));
        assert_eq!(txn.narration, "Groceries");
        assert_eq!(txn.tags, vec!["food"]);
        assert_eq!(txn.postings.len(), 2);
        assert_eq!(txn.postings[0].account, "Assets:Bank:Checking");
        assert_eq!(
            txn.postings[0].amount.as_ref().unwrap().to_string(),
            "-42.50 USD"
        );
        assert!(txn.postings[1].amount.is_some());

        // Elided amount
        let pending = ledger.entries[2].as_transaction().unwrap();
        assert_eq!(pending.flag, Flag::Pending);
        assert!(pending.postings[0].amount.is_none());
    }

    #[test]
    fn test_lineno_is_one_based_start_line() {
        let ledger = parse_string(SAMPLE);
        assert_eq!(ledger.entries[0].meta.lineno, 1);
        assert_eq!(ledger.entries[1].meta.lineno, 2);
        assert_eq!(ledger.entries[2].meta.lineno, 6);
    }

    #[test]
    fn test_options_and_comments() {
        let ledger = parse_string(
            "option \"title\" \"My Ledger\"\n; a comment\nplugin \"whatever\"\n",
        );
        assert!(ledger.errors.is_empty());
        assert_eq!(ledger.options.get("title").map(String::as_str), Some("My Ledger"));
        assert!(ledger.entries.is_empty());
    }

    #[test]
    fn test_malformed_lines_become_errors_not_panics() {
        let ledger = parse_string(
            "2025-01-01 frobnicate Assets:Cash\nnot a directive\n2025-01-02 * \"ok\"\n",
        );
        assert_eq!(ledger.errors.len(), 2);
        assert_eq!(ledger.errors[0].line, 1);
        assert_eq!(ledger.errors[1].line, 2);
        // The well-formed entry still parses
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.entries[0].meta.lineno, 3);
    }

    #[test]
    fn test_metadata_under_non_transaction_is_ignored() {
        let ledger = parse_string(
            "2025-01-01 open Assets:Bank:Checking\n    note: \"imported\"\n\
             2025-01-02 balance Assets:Bank:Checking 0.00 USD\n    source: \"statement\"\n",
        );
        assert!(ledger.errors.is_empty(), "{:?}", ledger.errors);
        assert_eq!(ledger.entries.len(), 2);
    }

    #[test]
    fn test_indented_line_without_directive_is_error() {
        let ledger = parse_string("    Assets:Cash:Wallet 1.00 USD\n");
        assert_eq!(ledger.errors.len(), 1);
        assert!(ledger.errors[0].message.contains("outside a directive"));

        // A blank line closes the context; the next indented line is orphaned
        let ledger = parse_string(
            "2025-01-01 * \"x\"\n    Expenses:Misc 1.00 USD\n\n    Assets:Cash:Wallet -1.00 USD\n",
        );
        assert_eq!(ledger.errors.len(), 1);
        assert_eq!(ledger.errors[0].line, 4);
    }

    #[test]
    fn test_bad_posting_is_error_but_entry_survives() {
        let ledger = parse_string(
            "2025-01-01 * \"x\"\n    Assets:Cash 1.00\n    Expenses:Misc -1.00 USD\n",
        );
        assert_eq!(ledger.errors.len(), 1);
        assert!(ledger.errors[0].message.contains("currency"));
        let txn = ledger.entries[0].as_transaction().unwrap();
        assert_eq!(txn.postings.len(), 1);
    }

    #[test]
    fn test_directive_kinds() {
        let ledger = parse_string(
            "2025-01-01 close Assets:Old\n\
             2025-01-02 balance Assets:Bank:Checking 100.00 USD\n\
             2025-01-03 note Assets:Bank:Checking \"called the bank\"\n\
             2025-01-04 price BTC 64000.00 USD\n\
             2025-01-05 event \"location\" \"home\"\n",
        );
        assert!(ledger.errors.is_empty(), "{:?}", ledger.errors);
        assert_eq!(ledger.entries.len(), 5);
        assert!(matches!(ledger.entries[0].kind, EntryKind::Close { .. }));
        assert!(matches!(ledger.entries[1].kind, EntryKind::Balance { .. }));
        assert!(matches!(ledger.entries[2].kind, EntryKind::Note { .. }));
        assert!(matches!(ledger.entries[3].kind, EntryKind::Price { .. }));
        assert!(matches!(ledger.entries[4].kind, EntryKind::Event { .. }));
    }

    #[test]
    fn test_parse_file_resolves_includes() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("main.bean");
        let txs = temp.path().join("txs.bean");
        std::fs::write(
            &main,
            "option \"title\" \"t\"\ninclude \"txs.bean\"\n2025-02-01 * \"after include\"\n",
        )
        .unwrap();
        std::fs::write(&txs, "2025-01-15 * \"included\"\n    Expenses:Misc 1.00 USD\n    Assets:Cash -1.00 USD\n").unwrap();

        let ledger = parse_file(&main).unwrap();
        assert!(ledger.errors.is_empty(), "{:?}", ledger.errors);
        assert_eq!(ledger.entries.len(), 2);
        // Included entries keep their own filename and lineno
        assert_eq!(ledger.entries[0].meta.filename, txs);
        assert_eq!(ledger.entries[0].meta.lineno, 1);
        assert_eq!(ledger.entries[1].meta.filename, main);
        assert_eq!(ledger.entries[1].meta.lineno, 3);
    }

    #[test]
    fn test_include_cycle_is_broken() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.bean");
        let b = temp.path().join("b.bean");
        std::fs::write(&a, "include \"b.bean\"\n2025-01-01 * \"a\"\n").unwrap();
        std::fs::write(&b, "include \"a.bean\"\n2025-01-02 * \"b\"\n").unwrap();

        let ledger = parse_file(&a).unwrap();
        assert_eq!(ledger.entries.len(), 2);
    }

    #[test]
    fn test_missing_include_is_diagnostic_not_fatal() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("main.bean");
        std::fs::write(&main, "include \"gone.bean\"\n2025-01-01 * \"still here\"\n").unwrap();

        let ledger = parse_file(&main).unwrap();
        assert_eq!(ledger.errors.len(), 1);
        assert_eq!(ledger.entries.len(), 1);
    }

    #[test]
    fn test_missing_entrypoint_is_fatal() {
        let err = parse_file(Path::new("/nonexistent/ledger.bean")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(..)));
    }

    #[test]
    fn test_tokenize_quotes_and_comments() {
        let tokens = tokenize("* \"Caf\\\"e\" #tag ; trailing").unwrap();
        assert_eq!(
            tokens,
            vec![
                Tok::Word("*".into()),
                Tok::Quoted("Caf\"e".into()),
                Tok::Word("#tag".into()),
            ]
        );
        assert!(tokenize("\"unterminated").is_err());
    }
}
