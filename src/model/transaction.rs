use crate::model::{timestamp, Amount, Origin};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Label written to the `Exchange` column unless configured otherwise.
pub const DEFAULT_EXCHANGE: &str = "TradingBot";

/// Stand-in currency for amounts the bot records in dollars. Pool trades are really SOL
/// denominated but the pool log does not say how much SOL moved.
pub const USD: &str = "USD";

pub const SOL: &str = "SOL";

/// Fees are not tracked by any input. Every transaction carries a zero fee in this currency.
pub const FEE_CURRENCY: &str = SOL;

pub const TRADE_GROUP_PREFIX: &str = "Trade_";
pub const WITHDRAWAL_GROUP_PREFIX: &str = "Withdrawal_";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Withdrawal,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

/// One side of a transaction: an amount of some currency.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    amount: Amount,
    currency: String,
}

impl Leg {
    /// Creates a leg. Amounts are non-negative in canonical form, callers coerce before building.
    pub fn new(amount: Amount, currency: impl Into<String>) -> Self {
        debug_assert!(!amount.is_negative(), "negative leg amount {amount}");
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// The canonical transaction record produced by every parser and consumed by every exporter.
///
/// Construct with `Transaction::buy`, `Transaction::sell` or `Transaction::withdrawal`, which
/// guarantee the right legs are populated for the kind:
/// - `Buy` always has a buy leg. The trading log also records what was paid as the sell leg.
/// - `Sell` has only a sell leg.
/// - `Withdrawal` has only a sell leg, holding the withdrawn quantity.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The timestamp exactly as it appeared in the input.
    date: String,
    kind: TransactionKind,
    buy: Option<Leg>,
    sell: Option<Leg>,
    fee: Amount,
    fee_currency: String,
    exchange: String,
    trade_group: String,
    comment: String,
    origin: Origin,
}

impl Transaction {
    pub fn buy(origin: Origin, date: impl Into<String>, bought: Leg, paid: Option<Leg>) -> Self {
        Self::new(origin, date, TransactionKind::Buy, Some(bought), paid)
    }

    pub fn sell(origin: Origin, date: impl Into<String>, sold: Leg) -> Self {
        Self::new(origin, date, TransactionKind::Sell, None, Some(sold))
    }

    pub fn withdrawal(origin: Origin, date: impl Into<String>, withdrawn: Leg) -> Self {
        Self::new(origin, date, TransactionKind::Withdrawal, None, Some(withdrawn))
    }

    fn new(
        origin: Origin,
        date: impl Into<String>,
        kind: TransactionKind,
        buy: Option<Leg>,
        sell: Option<Leg>,
    ) -> Self {
        Self {
            date: date.into(),
            kind,
            buy,
            sell,
            fee: Amount::ZERO,
            fee_currency: FEE_CURRENCY.to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            trade_group: String::new(),
            comment: String::new(),
            origin,
        }
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    pub fn with_trade_group(mut self, trade_group: impl Into<String>) -> Self {
        self.trade_group = trade_group.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Parses `date` into an instant.
    ///
    /// # Errors
    /// - Returns an error naming the record's origin when the date cannot be parsed.
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        timestamp::parse(&self.date).with_context(|| {
            format!(
                "Invalid date '{}' in {} transaction from {}",
                self.date, self.kind, self.origin
            )
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn buy_leg(&self) -> Option<&Leg> {
        self.buy.as_ref()
    }

    pub fn sell_leg(&self) -> Option<&Leg> {
        self.sell.as_ref()
    }

    pub fn buy_amount(&self) -> Option<Amount> {
        self.buy.as_ref().map(Leg::amount)
    }

    pub fn buy_currency(&self) -> Option<&str> {
        self.buy.as_ref().map(Leg::currency)
    }

    pub fn sell_amount(&self) -> Option<Amount> {
        self.sell.as_ref().map(Leg::amount)
    }

    pub fn sell_currency(&self) -> Option<&str> {
        self.sell.as_ref().map(Leg::currency)
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn fee_currency(&self) -> &str {
        &self.fee_currency
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn trade_group(&self) -> &str {
        &self.trade_group
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// Builds `Trade_<n>`.
pub fn trade_group(number: impl AsRef<str>) -> String {
    format!("{TRADE_GROUP_PREFIX}{}", number.as_ref())
}

/// Builds `Withdrawal_<n>`.
pub fn withdrawal_group(number: impl AsRef<str>) -> String {
    format!("{WITHDRAWAL_GROUP_PREFIX}{}", number.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use std::str::FromStr;

    fn origin() -> Origin {
        Origin::new(Source::PoolTransactions, 2)
    }

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_buy_defaults() {
        let tx = Transaction::buy(origin(), "2024-01-01T00:00:00", Leg::new(amount("50"), USD), None)
            .with_trade_group(trade_group("3"))
            .with_comment("note");
        assert_eq!(tx.kind(), TransactionKind::Buy);
        assert_eq!(tx.buy_amount(), Some(amount("50")));
        assert_eq!(tx.buy_currency(), Some(USD));
        assert_eq!(tx.sell_amount(), None);
        assert!(tx.fee().is_zero());
        assert_eq!(tx.fee_currency(), "SOL");
        assert_eq!(tx.exchange(), "TradingBot");
        assert_eq!(tx.trade_group(), "Trade_3");
        assert_eq!(tx.comment(), "note");
    }

    #[test]
    fn test_withdrawal_uses_sell_leg() {
        let tx = Transaction::withdrawal(origin(), "2024-01-01", Leg::new(amount("1.5"), SOL))
            .with_trade_group(withdrawal_group("2"));
        assert_eq!(tx.kind(), TransactionKind::Withdrawal);
        assert!(tx.buy_leg().is_none());
        assert_eq!(tx.sell_currency(), Some("SOL"));
        assert_eq!(tx.trade_group(), "Withdrawal_2");
    }

    #[test]
    fn test_timestamp_error_names_origin() {
        let tx = Transaction::sell(origin(), "not a date", Leg::new(amount("1"), USD));
        let err = tx.timestamp().unwrap_err().to_string();
        assert!(err.contains("pool_transactions line 2"), "{err}");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TransactionKind::Withdrawal.to_string(), "WITHDRAWAL");
        assert_eq!(
            TransactionKind::from_str("BUY").unwrap(),
            TransactionKind::Buy
        );
    }
}
