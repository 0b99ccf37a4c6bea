//! Query execution over transaction-posting rows.

use regex::Regex;

use super::parse::{parse_query, preprocess};
use super::{Column, ColumnInfo, Cond, Op, QueryResult};
use crate::error::LedgerError;
use crate::ledger::{Date, Entry, Posting, Transaction};
use crate::state::Snapshot;

/// Execute a query string against a snapshot.
///
/// The row count is capped at `max_rows` on top of any explicit LIMIT.
pub fn run_query(
    snapshot: &Snapshot,
    query: &str,
    max_rows: usize,
) -> Result<QueryResult, LedgerError> {
    if query.trim().is_empty() {
        return Err(LedgerError::Query("query string is empty".into()));
    }

    let normalized = preprocess(query);
    let query = parse_query(&normalized)?;
    let filter = RowFilter::compile(&query.conds)?;

    let cap = query.limit.map_or(max_rows, |limit| limit.min(max_rows));

    let mut rows = Vec::new();
    'entries: for entry in &snapshot.entries {
        let Some(txn) = entry.as_transaction() else {
            continue;
        };

        for posting in &txn.postings {
            let row = Row {
                entry,
                txn,
                posting,
            };
            if !filter.matches(&row) {
                continue;
            }
            if rows.len() >= cap {
                break 'entries;
            }
            rows.push(query.columns.iter().map(|c| row.value(*c)).collect());
        }
    }

    Ok(QueryResult {
        columns: query
            .columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name().to_string(),
                datatype: c.datatype().to_string(),
            })
            .collect(),
        rows,
    })
}

/// One result row: a posting in its transaction context
struct Row<'a> {
    entry: &'a Entry,
    txn: &'a Transaction,
    posting: &'a Posting,
}

impl Row<'_> {
    fn value(&self, column: Column) -> String {
        match column {
            Column::Date => self.entry.date.to_string(),
            Column::Flag => self.txn.flag.symbol().to_string(),
            Column::Payee => self.txn.payee.clone().unwrap_or_default(),
            Column::Narration => self.txn.narration.clone(),
            Column::Account => self.posting.account.clone(),
            Column::Position => self
                .posting
                .amount
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            Column::Id => self.entry.id(),
            Column::File => self.entry.meta.filename.display().to_string(),
            Column::Line => self.entry.meta.lineno.to_string(),
        }
    }
}

/// Compiled WHERE conditions. Regexes and dates are validated once,
/// before any row is visited.
struct RowFilter {
    conds: Vec<CompiledCond>,
}

enum CompiledCond {
    Text {
        column: Column,
        op: Op,
        value: String,
    },
    Pattern {
        column: Column,
        regex: Regex,
    },
    Date {
        op: Op,
        value: Date,
    },
}

impl RowFilter {
    fn compile(conds: &[Cond]) -> Result<Self, LedgerError> {
        let compiled = conds.iter().map(compile_cond).collect::<Result<_, _>>()?;
        Ok(Self { conds: compiled })
    }

    fn matches(&self, row: &Row) -> bool {
        for cond in &self.conds {
            let pass = match cond {
                CompiledCond::Text { column, op, value } => {
                    let actual = row.value(*column);
                    match op {
                        Op::Eq => actual == *value,
                        Op::Ne => actual != *value,
                        // Compile rejects the rest for text columns
                        _ => false,
                    }
                }
                CompiledCond::Pattern { column, regex } => regex.is_match(&row.value(*column)),
                CompiledCond::Date { op, value } => {
                    let date = row.entry.date;
                    match op {
                        Op::Eq => date == *value,
                        Op::Ne => date != *value,
                        Op::Lt => date < *value,
                        Op::Le => date <= *value,
                        Op::Gt => date > *value,
                        Op::Ge => date >= *value,
                        Op::Match => false,
                    }
                }
            };
            if !pass {
                return false;
            }
        }
        true
    }
}

fn compile_cond(cond: &Cond) -> Result<CompiledCond, LedgerError> {
    if cond.column == Column::Date {
        if cond.op == Op::Match {
            return Err(LedgerError::Query("`~` is not defined for dates".into()));
        }
        let value = Date::parse(&cond.value)
            .ok_or_else(|| LedgerError::Query(format!("invalid date `{}`", cond.value)))?;
        return Ok(CompiledCond::Date { op: cond.op, value });
    }

    match cond.op {
        Op::Match => {
            let regex = Regex::new(&cond.value)
                .map_err(|e| LedgerError::Query(format!("invalid pattern: {e}")))?;
            Ok(CompiledCond::Pattern {
                column: cond.column,
                regex,
            })
        }
        Op::Eq | Op::Ne => Ok(CompiledCond::Text {
            column: cond.column,
            op: cond.op,
            value: cond.value.clone(),
        }),
        _ => Err(LedgerError::Query(format!(
            "ordering comparisons are only defined for dates, not `{}`",
            cond.column.name()
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::LedgerContext;
    use tempfile::TempDir;

    const LEDGER: &str = "\
2025-01-02 * \"Grocery Store\" \"Groceries\"
    Assets:Bank:Checking -42.50 USD
    Expenses:Groceries 42.50 USD

2025-02-10 ! \"Cafe\" \"Lunch\"
    Assets:Bank:Checking -12.00 USD
    Expenses:Food:Lunch 12.00 USD

2025-03-01 * \"Employer\" \"Salary\"
    Assets:Bank:Checking 3000.00 USD
    Income:Salary -3000.00 USD
";

    fn make_snapshot() -> (TempDir, std::sync::Arc<Snapshot>) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("main.bean");
        std::fs::write(&path, LEDGER).unwrap();
        let ctx = LedgerContext::open(Config::for_ledger(&path)).unwrap();
        let snapshot = ctx.snapshot();
        (temp, snapshot)
    }

    #[test]
    fn test_select_all_posting_rows() {
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(&snapshot, "SELECT date, account, position", 200).unwrap();
        assert_eq!(result.rows.len(), 6);
        assert_eq!(result.columns.len(), 3);
        assert_eq!(result.columns[0].name, "date");
        assert_eq!(result.columns[0].datatype, "date");
        assert_eq!(result.rows[0], vec!["2025-01-02", "Assets:Bank:Checking", "-42.50 USD"]);
    }

    #[test]
    fn test_where_regex_on_account() {
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(
            &snapshot,
            "SELECT narration WHERE account ~ \"Expenses:.*\"",
            200,
        )
        .unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0][0], "Groceries");
        assert_eq!(result.rows[1][0], "Lunch");
    }

    #[test]
    fn test_where_date_range() {
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(
            &snapshot,
            "SELECT narration WHERE date >= 2025-02-01 AND date < 2025-03-01",
            200,
        )
        .unwrap();
        assert!(result.rows.iter().all(|r| r[0] == "Lunch"));
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_sqlish_query_is_normalized() {
        // Quoted date and FROM clause, as an automated caller would write
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(
            &snapshot,
            "SELECT narration FROM transactions WHERE date > '2025-02-15'",
            200,
        )
        .unwrap();
        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|r| r[0] == "Salary"));
    }

    #[test]
    fn test_limit_and_row_cap() {
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(&snapshot, "SELECT account LIMIT 2", 200).unwrap();
        assert_eq!(result.rows.len(), 2);

        // The configured cap wins over a larger LIMIT
        let result = run_query(&snapshot, "SELECT account LIMIT 100", 3).unwrap();
        assert_eq!(result.rows.len(), 3);
    }

    #[test]
    fn test_zero_limit_returns_no_rows() {
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(&snapshot, "SELECT account LIMIT 0", 200).unwrap();
        assert!(result.rows.is_empty());

        let result = run_query(&snapshot, "SELECT account", 0).unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_flag_filter() {
        let (_temp, snapshot) = make_snapshot();
        let result = run_query(&snapshot, "SELECT narration WHERE flag = \"!\"", 200).unwrap();
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0][0], "Lunch");
    }

    #[test]
    fn test_empty_query_rejected() {
        let (_temp, snapshot) = make_snapshot();
        assert!(matches!(
            run_query(&snapshot, "   ", 200),
            Err(LedgerError::Query(_))
        ));
    }

    #[test]
    fn test_bad_regex_rejected_before_rows() {
        let (_temp, snapshot) = make_snapshot();
        assert!(matches!(
            run_query(&snapshot, "SELECT account WHERE account ~ \"[\"", 200),
            Err(LedgerError::Query(_))
        ));
    }

    #[test]
    fn test_ordering_on_text_column_rejected() {
        let (_temp, snapshot) = make_snapshot();
        assert!(matches!(
            run_query(&snapshot, "SELECT account WHERE account > \"A\"", 200),
            Err(LedgerError::Query(_))
        ));
    }
}
