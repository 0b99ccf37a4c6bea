//! Query string normalization and parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::{Column, Cond, Op, Query};
use crate::error::LedgerError;

/// `'2025-04-01'` or `"2025-04-01"` written where a bare date belongs
static QUOTED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"](\d{4}-\d{2}-\d{2})['"]"#).unwrap());

/// SQL-style `FROM transactions`, which the grammar does not have
static FROM_TRANSACTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)FROM transactions?").unwrap());

/// Normalize caller-supplied query text before parsing.
///
/// Automated callers tend to write SQL: dates in quotes and a FROM
/// clause. Both are rewritten to the forms the grammar accepts.
pub fn preprocess(query: &str) -> String {
    let query = QUOTED_DATE.replace_all(query, "$1");
    FROM_TRANSACTIONS.replace_all(&query, "").into_owned()
}

/// Parse a normalized query string.
pub fn parse_query(query: &str) -> Result<Query, LedgerError> {
    let tokens = tokenize(query)?;
    let mut cursor = Cursor { tokens, pos: 0 };

    cursor.expect_keyword("SELECT")?;

    let mut columns = Vec::new();
    loop {
        let name = cursor.expect_word("a column name")?;
        let column = Column::parse(&name)
            .ok_or_else(|| LedgerError::Query(format!("unknown column `{name}`")))?;
        columns.push(column);

        if !cursor.eat(&QueryTok::Comma) {
            break;
        }
    }

    let mut conds = Vec::new();
    if cursor.eat_keyword("WHERE") {
        loop {
            conds.push(parse_cond(&mut cursor)?);
            if !cursor.eat_keyword("AND") {
                break;
            }
        }
    }

    let mut limit = None;
    if cursor.eat_keyword("LIMIT") {
        let word = cursor.expect_word("a row limit")?;
        limit = Some(
            word.parse::<usize>()
                .map_err(|_| LedgerError::Query(format!("invalid LIMIT `{word}`")))?,
        );
    }

    if let Some(token) = cursor.peek() {
        return Err(LedgerError::Query(format!(
            "unexpected trailing token `{token}`"
        )));
    }

    Ok(Query {
        columns,
        conds,
        limit,
    })
}

fn parse_cond(cursor: &mut Cursor) -> Result<Cond, LedgerError> {
    let name = cursor.expect_word("a column name")?;
    let column = Column::parse(&name)
        .ok_or_else(|| LedgerError::Query(format!("unknown column `{name}`")))?;

    let op = match cursor.next() {
        Some(QueryTok::Op(op)) => op,
        other => {
            return Err(LedgerError::Query(format!(
                "expected an operator, got {}",
                describe(other.as_ref())
            )));
        }
    };

    let value = match cursor.next() {
        Some(QueryTok::Word(word)) => word,
        Some(QueryTok::Str(s)) => s,
        other => {
            return Err(LedgerError::Query(format!(
                "expected a value, got {}",
                describe(other.as_ref())
            )));
        }
    };

    Ok(Cond { column, op, value })
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryTok {
    Word(String),
    Str(String),
    Op(Op),
    Comma,
}

impl std::fmt::Display for QueryTok {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Word(word) => write!(f, "{word}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Op(_) => write!(f, "<operator>"),
            Self::Comma => write!(f, ","),
        }
    }
}

fn describe(token: Option<&QueryTok>) -> String {
    token.map_or_else(|| "end of query".to_string(), |t| format!("`{t}`"))
}

struct Cursor {
    tokens: Vec<QueryTok>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&QueryTok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<QueryTok> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &QueryTok) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if let Some(QueryTok::Word(word)) = self.peek()
            && word.eq_ignore_ascii_case(keyword)
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), LedgerError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(LedgerError::Query(format!(
                "expected `{keyword}`, got {}",
                describe(self.peek())
            )))
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<String, LedgerError> {
        match self.next() {
            Some(QueryTok::Word(word)) => Ok(word),
            other => Err(LedgerError::Query(format!(
                "expected {what}, got {}",
                describe(other.as_ref())
            ))),
        }
    }
}

fn tokenize(query: &str) -> Result<Vec<QueryTok>, LedgerError> {
    let mut tokens = Vec::new();
    let mut chars = query.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ',' => {
                chars.next();
                tokens.push(QueryTok::Comma);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(LedgerError::Query("unterminated string".into()));
                }
                tokens.push(QueryTok::Str(value));
            }
            '=' => {
                chars.next();
                tokens.push(QueryTok::Op(Op::Eq));
            }
            '~' => {
                chars.next();
                tokens.push(QueryTok::Op(Op::Match));
            }
            '!' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, c)| c == '=') {
                    chars.next();
                    tokens.push(QueryTok::Op(Op::Ne));
                } else {
                    return Err(LedgerError::Query("expected `!=`".into()));
                }
            }
            '<' | '>' => {
                chars.next();
                let eq = chars.peek().is_some_and(|&(_, c)| c == '=');
                if eq {
                    chars.next();
                }
                tokens.push(QueryTok::Op(match (c, eq) {
                    ('<', false) => Op::Lt,
                    ('<', true) => Op::Le,
                    ('>', false) => Op::Gt,
                    (_, true) => Op::Ge,
                    _ => unreachable!(),
                }));
            }
            _ => {
                let mut end = start;
                while let Some(&(idx, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ',' | '"' | '\'' | '=' | '~' | '!' | '<' | '>')
                    {
                        break;
                    }
                    end = idx + c.len_utf8();
                    chars.next();
                }
                tokens.push(QueryTok::Word(query[start..end].to_string()));
            }
        }
    }

    Ok(tokens)
}
