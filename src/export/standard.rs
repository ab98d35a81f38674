//! The generic tax-service CSV format.
//!
//! ```text
//! Date,Type,Buy Amount,Buy Currency,Sell Amount,Sell Currency,Fee,Fee Currency,Exchange,Trade Group,Comment
//! 2024-01-01 00:00:00,BUY,50,USD,,,0,SOL,TradingBot,Trade_3,note
//! ```

use crate::export::to_csv;
use crate::model::{timestamp, Amount, Transaction, TransactionKind};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const HEADER: [&str; 11] = [
    "Date",
    "Type",
    "Buy Amount",
    "Buy Currency",
    "Sell Amount",
    "Sell Currency",
    "Fee",
    "Fee Currency",
    "Exchange",
    "Trade Group",
    "Comment",
];

/// One row of the standard CSV.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StandardRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Type")]
    pub kind: TransactionKind,
    #[serde(rename = "Buy Amount")]
    pub buy_amount: Option<Amount>,
    #[serde(rename = "Buy Currency")]
    pub buy_currency: Option<String>,
    #[serde(rename = "Sell Amount")]
    pub sell_amount: Option<Amount>,
    #[serde(rename = "Sell Currency")]
    pub sell_currency: Option<String>,
    #[serde(rename = "Fee")]
    pub fee: Amount,
    #[serde(rename = "Fee Currency")]
    pub fee_currency: String,
    #[serde(rename = "Exchange")]
    pub exchange: String,
    #[serde(rename = "Trade Group")]
    pub trade_group: String,
    #[serde(rename = "Comment")]
    pub comment: String,
}

/// Builds the rows of the standard CSV, sorted by date.
///
/// The sort is stable, so transactions at the same instant keep their ledger order.
///
/// # Errors
/// - Any transaction has a date that cannot be parsed. Without it the rows cannot be ordered, so
///   the whole export fails rather than dropping the row.
pub fn rows(transactions: &[Transaction]) -> Result<Vec<StandardRow>> {
    let mut dated = transactions
        .iter()
        .map(|tx| tx.timestamp().map(|ts| (ts, tx)))
        .collect::<Result<Vec<_>>>()
        .context("Unable to sort transactions for the standard export")?;
    dated.sort_by_key(|(ts, _)| *ts);

    Ok(dated
        .into_iter()
        .map(|(ts, tx)| StandardRow {
            date: timestamp::format(&ts),
            kind: tx.kind(),
            buy_amount: tx.buy_amount(),
            buy_currency: tx.buy_currency().map(String::from),
            sell_amount: tx.sell_amount(),
            sell_currency: tx.sell_currency().map(String::from),
            fee: tx.fee(),
            fee_currency: tx.fee_currency().to_string(),
            exchange: tx.exchange().to_string(),
            trade_group: tx.trade_group().to_string(),
            comment: tx.comment().to_string(),
        })
        .collect())
}

/// Renders the standard CSV.
pub fn render(transactions: &[Transaction]) -> Result<Vec<u8>> {
    to_csv(&HEADER, rows(transactions)?)
}

/// Reads a standard CSV back into rows.
pub fn read(data: &[u8]) -> Result<Vec<StandardRow>> {
    let mut reader = csv::Reader::from_reader(data);
    let headers = reader
        .headers()
        .context("Unable to read the standard CSV header")?;
    anyhow::ensure!(
        headers.iter().eq(HEADER.iter().copied()),
        "Unexpected standard CSV header: {headers:?}"
    );

    let mut rows = Vec::new();
    for (ix, result) in reader.deserialize().enumerate() {
        let row: StandardRow =
            result.with_context(|| format!("Unable to read standard CSV row {}", ix + 1))?;
        rows.push(row);
    }
    Ok(rows)
}
