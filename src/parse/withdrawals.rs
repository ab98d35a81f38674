//! Parser for `withdrawals.jsonl`.
//!
//! The file mixes withdrawal events with running summary lines. Only a line carrying both a
//! `withdrawalNumber` and a `type` is an event.

use crate::model::{
    withdrawal_group, Amount, Issue, IssueKind, Leg, Origin, Source, Transaction, SOL,
};
use crate::parse::{decoded, json_lines, non_negative, Parsed, Scalar};
use crate::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const WITHDRAWAL_NUMBER: &str = "withdrawalNumber";
const TYPE: &str = "type";

/// Withdrawal type for transfers to the hardware wallet. Every other type is a tax reserve.
pub const HARDWARE: &str = "HARDWARE";
pub const TAX_PAYMENT: &str = "TAX_PAYMENT";

#[derive(Debug, Clone, Deserialize)]
struct WithdrawalEvent {
    #[serde(rename = "withdrawalNumber")]
    number: Scalar,
    #[serde(rename = "type")]
    kind: String,
    timestamp: Scalar,
    #[serde(rename = "amountSOL")]
    amount_sol: Decimal,
    #[serde(rename = "amountUSD")]
    amount_usd: Decimal,
}

/// Parses the contents of a withdrawals file. Malformed lines are recorded as issues and never
/// fail the parse.
pub fn parse(data: &[u8], exchange: &str) -> Result<Parsed> {
    let mut parsed = Parsed::new(Source::Withdrawals);

    for (line, content) in json_lines(data) {
        parsed.row();
        let origin = Origin::new(Source::Withdrawals, line);
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

        let Some(object) = value.as_object() else {
            parsed.raise(Issue::at(
                IssueKind::MalformedLine,
                origin,
                "The line is not a JSON object",
            ));
            continue;
        };

        if !(object.contains_key(WITHDRAWAL_NUMBER) && object.contains_key(TYPE)) {
            // A summary line.
            parsed.skip();
            continue;
        }

        let event: WithdrawalEvent = match serde_json::from_value(value) {
            Ok(event) => event,
            Err(e) => {
                parsed.raise(Issue::at(
                    IssueKind::MalformedLine,
                    origin,
                    format!("The withdrawal is incomplete: {e}"),
                ));
                continue;
            }
        };

        let transaction = convert(&mut parsed, event, origin);
        parsed.push(transaction.with_exchange(exchange));
    }

    debug!(
        "Parsed {} withdrawals from {} lines ({} summary lines skipped)",
        parsed.stats.records, parsed.stats.rows, parsed.stats.skipped
    );
    Ok(parsed)
}

fn convert(parsed: &mut Parsed, event: WithdrawalEvent, origin: Origin) -> Transaction {
    let label = if event.kind == HARDWARE {
        HARDWARE
    } else {
        TAX_PAYMENT
    };
    let sol = non_negative(parsed, origin, "amountSOL", Amount::new(event.amount_sol));
    let usd = non_negative(parsed, origin, "amountUSD", Amount::new(event.amount_usd));

    Transaction::withdrawal(origin, event.timestamp.to_string(), Leg::new(sol, SOL))
        .with_trade_group(withdrawal_group(event.number.to_string()))
        .with_comment(format!("{label}: ${}", usd.fixed(2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TransactionKind, DEFAULT_EXCHANGE};
    use std::str::FromStr;

    fn parse_str(text: &str) -> Parsed {
        parse(text.as_bytes(), DEFAULT_EXCHANGE).unwrap()
    }

    #[test]
    fn test_hardware_withdrawal() {
        let parsed = parse_str(
            r#"{"timestamp":"2025-09-10T12:00:00.000Z","withdrawalNumber":3,"type":"HARDWARE","amountSOL":4.25,"amountUSD":850.5}"#,
        );
        assert_eq!(parsed.transactions.len(), 1);
        let tx = &parsed.transactions[0];
        assert_eq!(tx.kind(), TransactionKind::Withdrawal);
        assert_eq!(tx.sell_amount(), Some(Amount::from_str("4.25").unwrap()));
        assert_eq!(tx.sell_currency(), Some("SOL"));
        assert!(tx.buy_leg().is_none());
        assert_eq!(tx.trade_group(), "Withdrawal_3");
        assert_eq!(tx.comment(), "HARDWARE: $850.50");
        assert_eq!(tx.date(), "2025-09-10T12:00:00.000Z");
    }

    #[test]
    fn test_other_types_are_tax_payments() {
        let parsed = parse_str(
            r#"{"timestamp":"2025-09-10T12:00:00Z","withdrawalNumber":4,"type":"TAX","amountSOL":1,"amountUSD":200.456}"#,
        );
        assert_eq!(parsed.transactions[0].comment(), "TAX_PAYMENT: $200.46");
    }

    #[test]
    fn test_summary_lines_are_skipped() {
        let text = r#"{"timestamp":"2025-09-10T12:00:00Z","withdrawalNumber":1,"type":"HARDWARE","amountSOL":1,"amountUSD":200}
{"timestamp":"2025-09-10T12:00:01Z","totalWithdrawn":200,"amountSOL":1,"amountUSD":200}
{"timestamp":"2025-09-10T12:00:02Z","withdrawalNumber":1,"amountSOL":1,"amountUSD":200}
{"timestamp":"2025-09-10T12:00:03Z","type":"HARDWARE","amountSOL":1,"amountUSD":200}
"#;
        let parsed = parse_str(text);
        assert_eq!(parsed.transactions.len(), 1);
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.stats.rows, 4);
        assert_eq!(parsed.stats.skipped, 3);
    }

    #[test]
    fn test_incomplete_event_is_recorded() {
        let text = r#"{"timestamp":"2025-09-10T12:00:00Z","withdrawalNumber":1,"type":"HARDWARE","amountUSD":200}
not json
{"timestamp":"2025-09-10T12:00:00Z","withdrawalNumber":2,"type":"HARDWARE","amountSOL":"2","amountUSD":"400"}
"#;
        let parsed = parse_str(text);
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].trade_group(), "Withdrawal_2");
        assert_eq!(parsed.issues.len(), 2);
        assert_eq!(parsed.issues[0].line(), Some(1));
        assert!(parsed.issues[0].detail().contains("amountSOL"));
        assert_eq!(parsed.issues[1].line(), Some(2));
    }

    #[test]
    fn test_invalid_utf8_line_is_recorded() {
        let data = b"{\"note\":\"\xff\"}\n{\"timestamp\":\"2025-09-10T12:00:00Z\",\"withdrawalNumber\":5,\"type\":\"HARDWARE\",\"amountSOL\":1,\"amountUSD\":200}\n";
        let parsed = parse(data, DEFAULT_EXCHANGE).unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].trade_group(), "Withdrawal_5");
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind(), IssueKind::MalformedLine);
        assert_eq!(parsed.issues[0].line(), Some(1));
        assert_eq!(parsed.stats.rows, 2);
    }
}
