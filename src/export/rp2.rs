//! The input format of the RP2 tax-lot accounting tool.
//!
//! Only buys and sells are exported; withdrawals are transfers between the bot's own wallets and
//! have no RP2 in/out row. Rows keep ledger order. RP2 fills in missing spot prices itself, so
//! sells are written with a spot price of zero.

use crate::export::to_csv;
use crate::model::{Amount, Transaction, TransactionKind, SOL, USD};
use crate::Result;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Default value of the `holder` column.
pub const DEFAULT_HOLDER: &str = "TradingBot";

pub const HEADER: [&str; 13] = [
    "unique_id",
    "timestamp",
    "asset",
    "exchange",
    "holder",
    "transaction_type",
    "spot_price",
    "crypto_in",
    "crypto_out_no_fee",
    "crypto_fee",
    "fiat_in_no_fee",
    "fiat_out_no_fee",
    "fiat_fee",
];

/// One row of the RP2 CSV. Buy rows leave the `*_out_*` columns empty and sell rows leave the
/// `*_in*` columns empty.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Rp2Row {
    pub unique_id: String,
    pub timestamp: String,
    pub asset: String,
    pub exchange: String,
    pub holder: String,
    pub transaction_type: TransactionKind,
    pub spot_price: Amount,
    pub crypto_in: Option<Amount>,
    pub crypto_out_no_fee: Option<Amount>,
    pub crypto_fee: Amount,
    pub fiat_in_no_fee: Option<Amount>,
    pub fiat_out_no_fee: Option<Amount>,
    pub fiat_fee: Amount,
}

/// Builds the RP2 rows for the buys and sells in `transactions`.
///
/// `unique_id` is `<buy|sell>_<trade group>_<date>`. When two rows would share an id, the later
/// ones get `_2`, `_3`, ... appended.
pub fn rows(transactions: &[Transaction], holder: &str) -> Vec<Rp2Row> {
    let mut ids = UniqueIds::default();
    transactions
        .iter()
        .filter_map(|tx| {
            let row = match tx.kind() {
                TransactionKind::Buy => buy_row(tx, holder),
                TransactionKind::Sell => sell_row(tx, holder),
                TransactionKind::Withdrawal => return None,
            };
            Some(Rp2Row {
                unique_id: ids.assign(tx),
                ..row
            })
        })
        .collect()
}

/// Renders the RP2 CSV.
pub fn render(transactions: &[Transaction], holder: &str) -> Result<Vec<u8>> {
    to_csv(&HEADER, rows(transactions, holder))
}

fn buy_row(tx: &Transaction, holder: &str) -> Rp2Row {
    let bought = tx.buy_amount();
    let paid = tx.sell_amount();
    let spot_price = match (paid, bought) {
        (Some(paid), Some(bought)) => paid.checked_div(bought).unwrap_or(Amount::ZERO),
        _ => Amount::ZERO,
    };
    Rp2Row {
        unique_id: String::new(),
        timestamp: tx.date().to_string(),
        asset: tx.buy_currency().unwrap_or_default().to_string(),
        exchange: tx.exchange().to_string(),
        holder: holder.to_string(),
        transaction_type: TransactionKind::Buy,
        spot_price,
        crypto_in: bought,
        crypto_out_no_fee: None,
        crypto_fee: tx.fee(),
        fiat_in_no_fee: paid,
        fiat_out_no_fee: None,
        fiat_fee: Amount::ZERO,
    }
}

fn sell_row(tx: &Transaction, holder: &str) -> Rp2Row {
    // Pool returns are recorded in dollars but are SOL coming back to the wallet.
    let asset = match tx.sell_currency().unwrap_or_default() {
        USD => SOL,
        other => other,
    };
    Rp2Row {
        unique_id: String::new(),
        timestamp: tx.date().to_string(),
        asset: asset.to_string(),
        exchange: tx.exchange().to_string(),
        holder: holder.to_string(),
        transaction_type: TransactionKind::Sell,
        spot_price: Amount::ZERO,
        crypto_in: None,
        crypto_out_no_fee: tx.sell_amount(),
        crypto_fee: tx.fee(),
        fiat_in_no_fee: None,
        fiat_out_no_fee: tx.sell_amount(),
        fiat_fee: Amount::ZERO,
    }
}

#[derive(Debug, Default)]
struct UniqueIds {
    used: HashSet<String>,
}

impl UniqueIds {
    fn assign(&mut self, tx: &Transaction) -> String {
        let kind = tx.kind().to_string().to_lowercase();
        let base = format!("{kind}_{}_{}", tx.trade_group(), tx.date());
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                warn!(
                    "Duplicate RP2 id '{base}' for the transaction from {}, using '{candidate}'",
                    tx.origin()
                );
                return candidate;
            }
            n += 1;
        }
    }
}
