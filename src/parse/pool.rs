//! Parser for `pool_transactions.csv`, the bot's ledger of pool movements.
//!
//! A `trade_execution` row is money leaving the pool to open a position and becomes a BUY. A
//! `profit_return` or `loss_return` row is the position coming back and becomes a SELL. The pool
//! log only knows dollar amounts, so both sides use the `USD` placeholder currency.

use crate::model::{
    trade_group, Amount, Issue, IssueKind, Leg, Origin, Source, Transaction, USD,
};
use crate::parse::{non_negative, Parsed, PoolColumn, PoolSchema};
use crate::Result;
use anyhow::Context;
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::str::FromStr;
use tracing::debug;

pub const TRADE_EXECUTION: &str = "trade_execution";
pub const PROFIT_RETURN: &str = "profit_return";
pub const LOSS_RETURN: &str = "loss_return";

/// Parses the contents of a pool transactions CSV file.
///
/// # Errors
/// - The header row cannot be read or does not describe the required columns.
pub fn parse(data: &[u8], exchange: &str) -> Result<Parsed> {
    let mut parsed = Parsed::new(Source::PoolTransactions);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .context("Unable to read the header row of the pool transactions file")?
        .clone();
    let schema = PoolSchema::new(headers.iter())
        .context("The pool transactions header is not supported")?;
    debug!("Pool transactions schema: {schema:?}");

    let mut record = ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .context("Unable to read the pool transactions file")?
    {
        parsed.row();
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(parsed.stats.rows + 1);
        let origin = Origin::new(Source::PoolTransactions, line);

        let row = match StringRecord::from_byte_record(record.clone()) {
            Ok(row) => row,
            Err(e) => {
                parsed.raise(Issue::at(
                    IssueKind::MalformedLine,
                    origin,
                    format!("The row is not valid UTF-8: {e}"),
                ));
                continue;
            }
        };

        parse_row(&mut parsed, &schema, &row, origin, exchange);
    }

    debug!(
        "Parsed {} pool transactions from {} rows ({} skipped)",
        parsed.stats.records, parsed.stats.rows, parsed.stats.skipped
    );
    Ok(parsed)
}

fn parse_row(
    parsed: &mut Parsed,
    schema: &PoolSchema,
    row: &StringRecord,
    origin: Origin,
    exchange: &str,
) {
    let action = schema.get(row, PoolColumn::Action).unwrap_or_default();
    let is_buy = match action {
        TRADE_EXECUTION => true,
        PROFIT_RETURN | LOSS_RETURN => false,
        _ => {
            parsed.skip();
            return;
        }
    };

    let date = schema.get(row, PoolColumn::Timestamp).unwrap_or_default();
    let number = schema.get(row, PoolColumn::TradeNumber).unwrap_or_default();
    let group = trade_group(number);
    let comment = schema.get(row, PoolColumn::Comment).unwrap_or_default();

    if number.is_empty() {
        parsed.raise(
            Issue::at(
                IssueKind::MissingTradeNumber,
                origin,
                format!("The {action} row has no trade number"),
            )
            .with_date(date),
        );
    }

    let raw_amount = schema.get(row, PoolColumn::Amount).unwrap_or_default();
    let amount = match Amount::from_str(raw_amount) {
        Ok(amount) if !raw_amount.is_empty() => amount,
        Ok(_) => {
            raise_invalid_amount(parsed, origin, &group, date, "The amount is empty");
            Amount::ZERO
        }
        Err(e) => {
            raise_invalid_amount(
                parsed,
                origin,
                &group,
                date,
                format!("The amount '{raw_amount}' is not a number: {e}"),
            );
            Amount::ZERO
        }
    };

    let transaction = if is_buy {
        // Money leaving the pool is logged as a negative amount.
        Transaction::buy(origin, date, Leg::new(amount.abs(), USD), None)
    } else {
        let amount = non_negative(parsed, origin, "The returned amount", amount);
        Transaction::sell(origin, date, Leg::new(amount, USD))
    };

    parsed.push(
        transaction
            .with_exchange(exchange)
            .with_trade_group(group)
            .with_comment(comment),
    );
}

fn raise_invalid_amount(
    parsed: &mut Parsed,
    origin: Origin,
    group: &str,
    date: &str,
    detail: impl Into<String>,
) {
    parsed.raise(
        Issue::at(IssueKind::InvalidAmount, origin, detail)
            .with_trade_group(group)
            .with_date(date),
    );
}
