//! Parsers that turn bot output files into canonical transactions.
//!
//! Each parser is a pure function of the file contents. It returns a `Parsed` holding the
//! transactions it produced, the data-quality issues it raised and its counters. Parsers know
//! nothing about each other; their results are merged into a `Ledger` afterwards.
//!
//! Record-level problems (an unrelated action, a malformed line, an unknown token) are recorded
//! and parsing continues. Only file-level problems and corrupt prices return `Err`.

pub mod pool;
mod schema;
pub mod trading_log;
pub mod withdrawals;

use crate::model::{Amount, Issue, IssueKind, Origin, Source, SourceStats, Transaction};
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::str::Utf8Error;

pub use schema::{PoolColumn, PoolSchema};

/// The output of one parser.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub transactions: Vec<Transaction>,
    pub issues: Vec<Issue>,
    pub stats: SourceStats,
}

impl Parsed {
    pub fn new(source: Source) -> Self {
        Self {
            transactions: Vec::new(),
            issues: Vec::new(),
            stats: SourceStats::new(source),
        }
    }

    pub fn source(&self) -> Source {
        self.stats.source
    }

    pub(crate) fn row(&mut self) {
        self.stats.rows += 1;
    }

    pub(crate) fn skip(&mut self) {
        self.stats.skipped += 1;
    }

    pub(crate) fn push(&mut self, transaction: Transaction) {
        self.stats.records += 1;
        self.transactions.push(transaction);
    }

    pub(crate) fn raise(&mut self, issue: Issue) {
        self.stats.issues += 1;
        self.issues.push(issue);
    }
}

/// A JSON value the bot sometimes writes as a string and sometimes as a number, such as a
/// timestamp or a counter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Returns `amount` unchanged when it is non-negative. Otherwise raises a `NegativeAmount` issue
/// and returns the absolute value.
pub(crate) fn non_negative(
    parsed: &mut Parsed,
    origin: Origin,
    field: &str,
    amount: Amount,
) -> Amount {
    if amount.is_negative() {
        parsed.raise(Issue::at(
            IssueKind::NegativeAmount,
            origin,
            format!("{field} {amount} is negative, using {}", amount.abs()),
        ));
        amount.abs()
    } else {
        amount
    }
}

/// Iterates over the non-blank lines of newline-delimited JSON, yielding 1-based line numbers.
///
/// Each line is decoded on its own, so one line with invalid UTF-8 does not hide the others.
pub(crate) fn json_lines(data: &[u8]) -> impl Iterator<Item = (u64, Result<&str, Utf8Error>)> {
    data.split(|b| *b == b'\n')
        .enumerate()
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
        .map(|(ix, line)| (ix as u64 + 1, std::str::from_utf8(line).map(str::trim)))
}

/// Returns the decoded line, or raises a `MalformedLine` issue when it is not valid UTF-8.
pub(crate) fn decoded<'a>(
    parsed: &mut Parsed,
    origin: Origin,
    line: Result<&'a str, Utf8Error>,
) -> Option<&'a str> {
    match line {
        Ok(line) => Some(line),
        Err(e) => {
            parsed.raise(Issue::at(
                IssueKind::MalformedLine,
                origin,
                format!("The line is not valid UTF-8: {e}"),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_scalar_display() {
        let s: Scalar = serde_json::from_str("4").unwrap();
        assert_eq!(s.to_string(), "4");
        let s: Scalar = serde_json::from_str("\"2024-01-01T00:00:00Z\"").unwrap();
        assert_eq!(s.to_string(), "2024-01-01T00:00:00Z");
        let s: Scalar = serde_json::from_str("1.5").unwrap();
        assert_eq!(s.to_string(), "1.5");
    }

    #[test]
    fn test_non_negative() {
        let mut parsed = Parsed::new(Source::PoolTransactions);
        let origin = Origin::new(Source::PoolTransactions, 2);
        let fixed = non_negative(&mut parsed, origin, "amount", Amount::from_str("-3").unwrap());
        assert_eq!(fixed.to_string(), "3");
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind(), IssueKind::NegativeAmount);

        let same = non_negative(&mut parsed, origin, "amount", Amount::from_str("3").unwrap());
        assert_eq!(same.to_string(), "3");
        assert_eq!(parsed.stats.issues, 1);
    }

    #[test]
    fn test_json_lines_skips_blank_lines() {
        let lines: Vec<(u64, &str)> = json_lines(b"{}\r\n\n  \n{\"a\":1}\n")
            .map(|(n, line)| (n, line.unwrap()))
            .collect();
        assert_eq!(lines, vec![(1, "{}"), (4, "{\"a\":1}")]);
    }

    #[test]
    fn test_json_lines_decodes_each_line() {
        let lines: Vec<(u64, bool)> = json_lines(b"{}\n{\"note\":\"\xff\"}\n{}\n")
            .map(|(n, line)| (n, line.is_ok()))
            .collect();
        assert_eq!(lines, vec![(1, true), (2, false), (3, true)]);

        let mut parsed = Parsed::new(Source::Withdrawals);
        let origin = Origin::new(Source::Withdrawals, 2);
        let bad = std::str::from_utf8(b"\xff");
        assert_eq!(decoded(&mut parsed, origin, bad), None);
        assert_eq!(parsed.issues[0].kind(), IssueKind::MalformedLine);
        assert_eq!(parsed.issues[0].line(), Some(2));
        assert_eq!(decoded(&mut parsed, origin, Ok("{}")), Some("{}"));
        assert_eq!(parsed.stats.issues, 1);
    }
}
