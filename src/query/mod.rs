//! Declarative queries over the parsed entry list.
//!
//! Implements a pragmatic subset of the beancount query language:
//! `SELECT <columns> [WHERE <conditions>] [LIMIT n]` evaluated over
//! transaction-posting rows. Incoming query strings are normalized
//! first, because automated callers routinely produce SQL-isms the
//! grammar does not have (quoted dates, `FROM transactions`).

mod exec;
mod parse;

pub use exec::run_query;

use serde::Serialize;

/// A projected column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Flag,
    Payee,
    Narration,
    Account,
    Position,
    Id,
    File,
    Line,
}

impl Column {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "date" => Self::Date,
            "flag" => Self::Flag,
            "payee" => Self::Payee,
            "narration" => Self::Narration,
            "account" => Self::Account,
            "position" | "amount" => Self::Position,
            "id" => Self::Id,
            "file" | "filename" => Self::File,
            "line" | "lineno" => Self::Line,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Flag => "flag",
            Self::Payee => "payee",
            Self::Narration => "narration",
            Self::Account => "account",
            Self::Position => "position",
            Self::Id => "id",
            Self::File => "file",
            Self::Line => "line",
        }
    }

    pub const fn datatype(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Position => "amount",
            Self::Line => "int",
            _ => "str",
        }
    }
}

/// A comparison operator in a WHERE condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    /// `~` - regex match
    Match,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One WHERE condition: `column op value`
#[derive(Debug, Clone)]
pub struct Cond {
    pub column: Column,
    pub op: Op,
    pub value: String,
}

/// A parsed query
#[derive(Debug, Clone)]
pub struct Query {
    pub columns: Vec<Column>,
    pub conds: Vec<Cond>,
    pub limit: Option<usize>,
}

/// Typed column header in a result
#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub datatype: String,
}

/// Query results: typed columns and stringified rows
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<String>>,
}
