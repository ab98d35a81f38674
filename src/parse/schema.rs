//! The column layout of `pool_transactions.csv`.
//!
//! The bot writes the header `timestamp,type,amount,poolBefore,poolAfter,tradeNumber,notes`.
//! Columns are looked up by header name so that a reordered file still parses. When a header is
//! renamed to something unrecognized, the conventional position is used instead. The layout is
//! validated once, from the header row, and rows are then read through `PoolSchema::get`.

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SchemaError(String);

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for SchemaError {}

/// The logical columns of the pool transactions file that the parser reads.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolColumn {
    Timestamp,
    Action,
    Amount,
    TradeNumber,
    Comment,
}

serde_plain::derive_display_from_serialize!(PoolColumn);
serde_plain::derive_fromstr_from_deserialize!(PoolColumn);

impl PoolColumn {
    pub const ALL: [PoolColumn; 5] = [
        PoolColumn::Timestamp,
        PoolColumn::Action,
        PoolColumn::Amount,
        PoolColumn::TradeNumber,
        PoolColumn::Comment,
    ];

    /// The zero-based position the bot writes this column at.
    pub fn default_position(&self) -> usize {
        match self {
            PoolColumn::Timestamp => 0,
            PoolColumn::Action => 1,
            PoolColumn::Amount => 2,
            PoolColumn::TradeNumber => 5,
            PoolColumn::Comment => 6,
        }
    }

    /// Header names accepted for this column, after `normalize_header`.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            PoolColumn::Timestamp => &["timestamp", "date", "time"],
            PoolColumn::Action => &["type", "action"],
            PoolColumn::Amount => &["amount"],
            PoolColumn::TradeNumber => &["tradenumber", "trade", "tradeindex"],
            PoolColumn::Comment => &["notes", "note", "comment"],
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, PoolColumn::Comment)
    }
}

/// Resolved positions of each `PoolColumn`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PoolSchema {
    positions: BTreeMap<PoolColumn, usize>,
    width: usize,
}

impl PoolSchema {
    /// Resolves column positions from the header row.
    ///
    /// # Errors
    /// - Two headers name the same column.
    /// - A required column is neither named nor present at its conventional position.
    pub fn new<S, I>(headers: I) -> Result<Self, SchemaError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();
        let width = headers.len();

        let mut named: BTreeMap<PoolColumn, usize> = BTreeMap::new();
        for (ix, header) in headers.iter().enumerate() {
            let column = PoolColumn::ALL
                .iter()
                .find(|c| c.aliases().contains(&header.as_str()));
            if let Some(&column) = column {
                if named.insert(column, ix).is_some() {
                    return Err(SchemaError(format!(
                        "Encountered a duplicate header for the {column} column"
                    )));
                }
            }
        }

        let mut positions = BTreeMap::new();
        for column in PoolColumn::ALL {
            let position = match named.get(&column) {
                Some(&ix) => Some(ix),
                None => {
                    let ix = column.default_position();
                    let claimed = named.values().any(|&n| n == ix);
                    (ix < width && !claimed).then_some(ix)
                }
            };
            match position {
                Some(ix) => {
                    positions.insert(column, ix);
                }
                None if column.is_required() => {
                    return Err(SchemaError(format!(
                        "The header has {width} columns and does not name the {column} column \
                        (expected at position {})",
                        column.default_position() + 1
                    )));
                }
                None => {}
            }
        }

        Ok(Self { positions, width })
    }

    /// The schema of the header the bot writes.
    pub fn standard() -> Self {
        let positions = PoolColumn::ALL
            .iter()
            .map(|c| (*c, c.default_position()))
            .collect();
        Self {
            positions,
            width: 7,
        }
    }

    pub fn position(&self, column: PoolColumn) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    /// The number of columns in the header.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the trimmed field for `column`, or `None` if the row is too short to have it.
    pub fn get<'a>(&self, record: &'a StringRecord, column: PoolColumn) -> Option<&'a str> {
        self.position(column)
            .and_then(|ix| record.get(ix))
            .map(str::trim)
    }
}

/// Lowercases and strips everything except ascii alphanumerics, so `Trade Number`,
/// `trade_number` and `tradeNumber` all become `tradenumber`.
fn normalize_header(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
