//! Data-quality issues found while parsing or reviewing the ledger.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The input file a record or issue came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    PoolTransactions,
    TradingLog,
    Withdrawals,
    /// Issues computed from the finished ledger rather than from one input line.
    Ledger,
}

serde_plain::derive_display_from_serialize!(Source);
serde_plain::derive_fromstr_from_deserialize!(Source);

/// Where a record came from: the input file and its 1-based line number.
///
/// For the pool transactions CSV the line number is the CSV record's line, so the header is line 1.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub source: Source,
    pub line: u64,
}

impl Origin {
    pub fn new(source: Source, line: u64) -> Self {
        Self { source, line }
    }
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} line {}", self.source, self.line)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A trading-log buy whose mint is not in the token registry.
    UnresolvedToken,
    /// A transaction whose fee is zero.
    MissingFee,
    /// A trade group with a buy but no sell, or a sell but no buy.
    IncompleteTrade,
    /// A line that could not be decoded, or a record missing required keys.
    MalformedLine,
    /// An amount that was empty or not a number and was treated as zero.
    InvalidAmount,
    /// A negative amount that was replaced by its absolute value.
    NegativeAmount,
    /// A pool row without a trade number.
    MissingTradeNumber,
}

serde_plain::derive_display_from_serialize!(IssueKind);
serde_plain::derive_fromstr_from_deserialize!(IssueKind);

/// One data-quality finding. Issues are informational and never block an export.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    kind: IssueKind,
    source: Source,
    line: Option<u64>,
    trade_group: Option<String>,
    date: Option<String>,
    detail: String,
}

impl Issue {
    /// Creates an issue attached to a line of an input file.
    pub fn at(kind: IssueKind, origin: Origin, detail: impl Into<String>) -> Self {
        Self {
            kind,
            source: origin.source,
            line: Some(origin.line),
            trade_group: None,
            date: None,
            detail: detail.into(),
        }
    }

    /// Creates an issue about the ledger as a whole, e.g. an unpaired trade group.
    pub fn ledger(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            source: Source::Ledger,
            line: None,
            trade_group: None,
            date: None,
            detail: detail.into(),
        }
    }

    pub fn with_trade_group(mut self, trade_group: impl Into<String>) -> Self {
        self.trade_group = Some(trade_group.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn trade_group(&self) -> Option<&str> {
        self.trade_group.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}
