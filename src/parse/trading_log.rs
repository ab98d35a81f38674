//! Parser for `trading_log.json`, the bot's newline-delimited log of trading decisions.
//!
//! Only `immediate_buy` entries become transactions. The entry records the dollar amount spent
//! and the entry price, from which the token quantity is derived.

use crate::model::{
    trade_group, Amount, Issue, IssueKind, Leg, Origin, Source, TokenRegistry, Transaction, USD,
};
use crate::parse::{decoded, json_lines, non_negative, Parsed, Scalar};
use crate::Result;
use anyhow::bail;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const IMMEDIATE_BUY: &str = "immediate_buy";

/// The fields of an `immediate_buy` entry. Other keys in the entry are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImmediateBuy {
    token_mint: String,
    amount: Decimal,
    entry_price: Decimal,
    timestamp: Scalar,
    pool_status: PoolStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolStatus {
    total_trades: Scalar,
}

/// Parses the contents of a trading log.
///
/// # Errors
/// - An `immediate_buy` entry has an entry price of zero. The token quantity cannot be derived
///   and the upstream data is corrupt.
pub fn parse(data: &[u8], tokens: &TokenRegistry, exchange: &str) -> Result<Parsed> {
    let mut parsed = Parsed::new(Source::TradingLog);

    for (line, content) in json_lines(data) {
        parsed.row();
        let origin = Origin::new(Source::TradingLog, line);
        let Some(content) = decoded(&mut parsed, origin, content) else {
            continue;
        };

        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                parsed.raise(Issue::at(
                    IssueKind::MalformedLine,
                    origin,
                    format!("The line is not valid JSON: {e}"),
                ));
                continue;
            }
        };

        if !value.is_object() {
            parsed.raise(Issue::at(
                IssueKind::MalformedLine,
                origin,
                "The line is not a JSON object",
            ));
            continue;
        }

        let Some(action) = value.get("action").and_then(Value::as_str) else {
            parsed.raise(Issue::at(
                IssueKind::MalformedLine,
                origin,
                "The entry has no 'action' string",
            ));
            continue;
        };

        if action != IMMEDIATE_BUY {
            parsed.skip();
            continue;
        }

        let entry: ImmediateBuy = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                parsed.raise(Issue::at(
                    IssueKind::MalformedLine,
                    origin,
                    format!("The {IMMEDIATE_BUY} entry is incomplete: {e}"),
                ));
                continue;
            }
        };

        let transaction = convert(&mut parsed, entry, origin, tokens)?;
        parsed.push(transaction.with_exchange(exchange));
    }

    debug!(
        "Parsed {} buys from {} trading log lines ({} skipped)",
        parsed.stats.records, parsed.stats.rows, parsed.stats.skipped
    );
    Ok(parsed)
}

fn convert(
    parsed: &mut Parsed,
    entry: ImmediateBuy,
    origin: Origin,
    tokens: &TokenRegistry,
) -> Result<Transaction> {
    let date = entry.timestamp.to_string();
    let group = trade_group(entry.pool_status.total_trades.to_string());
    let spent = non_negative(parsed, origin, "The amount", Amount::new(entry.amount));
    let entry_price = non_negative(
        parsed,
        origin,
        "The entry price",
        Amount::new(entry.entry_price),
    );

    let quantity = match spent.checked_div(entry_price) {
        Some(quantity) => quantity,
        None if entry_price.is_zero() => bail!(
            "The {IMMEDIATE_BUY} entry at {origin} ({group}) has an entry price of zero"
        ),
        None => bail!(
            "The {IMMEDIATE_BUY} entry at {origin} ({group}) has a token quantity that \
            cannot be represented: {spent} / {entry_price}"
        ),
    };

    let symbol = tokens.symbol(&entry.token_mint);
    if !tokens.is_known(&entry.token_mint) {
        parsed.raise(
            Issue::at(
                IssueKind::UnresolvedToken,
                origin,
                format!(
                    "The token mint '{}' is not in the token registry, using '{symbol}'",
                    entry.token_mint
                ),
            )
            .with_trade_group(group.as_str())
            .with_date(date.as_str()),
        );
    }

    Ok(Transaction::buy(
        origin,
        date,
        Leg::new(quantity, symbol),
        Some(Leg::new(spent, USD)),
    )
    .with_trade_group(group)
    .with_comment(format!("Entry Price: ${}", entry_price.fixed(6))))
}
