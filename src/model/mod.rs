//! Types that represent the core data model, such as `Transaction` and `Ledger`.
mod amount;
mod issue;
mod ledger;
pub mod timestamp;
mod token;
mod transaction;

pub use amount::{Amount, AmountError};
pub use issue::{Issue, IssueKind, Origin, Source};
pub use ledger::{Ledger, SourceStats};
pub use token::TokenRegistry;
pub use transaction::{
    trade_group, withdrawal_group, Leg, Transaction, TransactionKind, DEFAULT_EXCHANGE,
    FEE_CURRENCY, SOL, TRADE_GROUP_PREFIX, USD, WITHDRAWAL_GROUP_PREFIX,
};
