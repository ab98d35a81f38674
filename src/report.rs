//! Summary statistics and data-quality review of a finished ledger.

use crate::model::{
    timestamp, Amount, Issue, IssueKind, Ledger, SourceStats, Transaction, TransactionKind,
    TRADE_GROUP_PREFIX,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Buy and sell counts for one trade group.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
struct Legs {
    buys: usize,
    sells: usize,
}

impl Legs {
    fn is_complete(&self) -> bool {
        self.buys > 0 && self.sells > 0
    }
}

/// Tallies buys and sells per `Trade_*` group, in order of first appearance.
fn trade_groups(transactions: &[Transaction]) -> Vec<(&str, Legs)> {
    let mut groups: Vec<(&str, Legs)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for tx in transactions {
        let group = tx.trade_group();
        if !group.starts_with(TRADE_GROUP_PREFIX) {
            continue;
        }
        let ix = *index.entry(group).or_insert_with(|| {
            groups.push((group, Legs::default()));
            groups.len() - 1
        });
        let legs = &mut groups[ix].1;
        match tx.kind() {
            TransactionKind::Buy => legs.buys += 1,
            TransactionKind::Sell => legs.sells += 1,
            TransactionKind::Withdrawal => {}
        }
    }
    groups
}

/// Returns every data-quality issue for the ledger: the issues raised while parsing, followed by
/// one `missing_fee` issue per zero-fee transaction and one `incomplete_trade` issue per trade
/// group that lacks a buy or a sell.
pub fn review(ledger: &Ledger) -> Vec<Issue> {
    let mut issues = ledger.issues().to_vec();

    for tx in ledger.transactions().iter().filter(|tx| tx.fee().is_zero()) {
        issues.push(
            Issue::at(
                IssueKind::MissingFee,
                tx.origin(),
                format!(
                    "The {} transaction has no fee recorded ({} 0)",
                    tx.kind(),
                    tx.fee_currency()
                ),
            )
            .with_trade_group(tx.trade_group())
            .with_date(tx.date()),
        );
    }

    for (group, legs) in trade_groups(ledger.transactions()) {
        if legs.is_complete() {
            continue;
        }
        let detail = if legs.buys == 0 {
            format!("{group} has {} sell(s) but no buy", legs.sells)
        } else {
            format!("{group} has {} buy(s) but no sell", legs.buys)
        };
        issues.push(Issue::ledger(IssueKind::IncompleteTrade, detail).with_trade_group(group));
    }

    issues
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DataQuality {
    /// Trade groups with at least one buy and one sell.
    pub complete_trades: usize,
    /// Trading-log buys whose mint was not in the token registry.
    pub missing_token_ids: usize,
    /// Transactions with a zero fee.
    pub missing_fees: usize,
    /// Total rows in the data-quality report.
    pub issues: usize,
}

/// Aggregate counts over a ledger.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub total_transactions: usize,
    pub buy_transactions: usize,
    pub sell_transactions: usize,
    pub withdrawals: usize,
    /// Trade groups missing either a buy or a sell.
    pub incomplete_trades: usize,
    pub total_fees: Amount,
    /// Earliest and latest parseable transaction dates, `None` for an empty ledger.
    pub date_range: Option<DateRange>,
    pub data_quality: DataQuality,
    pub sources: Vec<SourceStats>,
}

impl Summary {
    /// Summarizes `ledger`. `issues` should be the output of `review`.
    pub fn new(ledger: &Ledger, issues: &[Issue]) -> Self {
        let transactions = ledger.transactions();
        let count = |kind: TransactionKind| {
            transactions.iter().filter(|t| t.kind() == kind).count()
        };
        let count_issues = |kind: IssueKind| issues.iter().filter(|i| i.kind() == kind).count();

        let groups = trade_groups(transactions);
        let complete_trades = groups.iter().filter(|(_, legs)| legs.is_complete()).count();

        let total_fees = transactions
            .iter()
            .fold(Amount::ZERO, |sum, tx| Amount::new(sum.value() + tx.fee().value()));

        let mut dates = transactions.iter().filter_map(|tx| tx.timestamp().ok());
        let first = dates.next();
        let date_range = first.map(|first| {
            let (start, end) = dates.fold((first, first), |(lo, hi), dt| {
                (lo.min(dt), hi.max(dt))
            });
            DateRange {
                start: timestamp::format(&start),
                end: timestamp::format(&end),
            }
        });

        Self {
            total_transactions: transactions.len(),
            buy_transactions: count(TransactionKind::Buy),
            sell_transactions: count(TransactionKind::Sell),
            withdrawals: count(TransactionKind::Withdrawal),
            incomplete_trades: groups.len() - complete_trades,
            total_fees,
            date_range,
            data_quality: DataQuality {
                complete_trades,
                missing_token_ids: count_issues(IssueKind::UnresolvedToken),
                missing_fees: count_issues(IssueKind::MissingFee),
                issues: issues.len(),
            },
            sources: ledger.sources().to_vec(),
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== PROCESSING SUMMARY ===")?;
        writeln!(f, "Total transactions processed: {}", self.total_transactions)?;
        writeln!(f, "  - Buy transactions: {}", self.buy_transactions)?;
        writeln!(f, "  - Sell transactions: {}", self.sell_transactions)?;
        writeln!(f, "  - Withdrawals: {}", self.withdrawals)?;
        writeln!(f, "  - Incomplete trades: {}", self.incomplete_trades)?;
        writeln!(f, "Total fees tracked: ${}", self.total_fees.fixed(2))?;
        match &self.date_range {
            Some(range) => writeln!(f, "Date range: {} to {}", range.start, range.end)?,
            None => writeln!(f, "Date range: none")?,
        }
        writeln!(f)?;
        writeln!(f, "=== DATA QUALITY ===")?;
        writeln!(f, "Complete trades: {}", self.data_quality.complete_trades)?;
        writeln!(f, "Missing token IDs: {}", self.data_quality.missing_token_ids)?;
        writeln!(
            f,
            "Transactions with zero fees: {}",
            self.data_quality.missing_fees
        )?;
        writeln!(f, "Issues to review: {}", self.data_quality.issues)?;
        writeln!(f)?;
        writeln!(f, "=== SOURCES ===")?;
        for s in &self.sources {
            writeln!(
                f,
                "{}: {} rows, {} transactions, {} skipped, {} issues",
                s.source, s.rows, s.records, s.skipped, s.issues
            )?;
        }
        Ok(())
    }
}
