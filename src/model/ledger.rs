use crate::model::{Issue, Source, Transaction};
use crate::parse::Parsed;
use serde::{Deserialize, Serialize};

/// Counters describing how one input file was consumed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceStats {
    pub source: Source,
    /// Data rows or non-blank lines read.
    pub rows: u64,
    /// Canonical transactions produced.
    pub records: u64,
    /// Rows deliberately ignored, such as unrelated actions or withdrawal summary lines.
    pub skipped: u64,
    /// Data-quality issues raised.
    pub issues: u64,
}

impl SourceStats {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            rows: 0,
            records: 0,
            skipped: 0,
            issues: 0,
        }
    }
}

/// The canonical transaction store.
///
/// Transactions are kept in the order they were merged, which is processing order and not time
/// order. Parsing issues and per-source counters travel with them so the reporter can surface
/// every skip decision after the fact.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    issues: Vec<Issue>,
    sources: Vec<SourceStats>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the output of one parser.
    pub fn merge(&mut self, parsed: Parsed) {
        let Parsed {
            transactions,
            issues,
            stats,
        } = parsed;
        self.transactions.extend(transactions);
        self.issues.extend(issues);
        self.sources.push(stats);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Issues raised by the parsers, in the order they were found.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn sources(&self) -> &[SourceStats] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
