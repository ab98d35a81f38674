//! Projections of the ledger into the CSV files handed to tax tools.

pub mod quality;
pub mod rp2;
pub mod standard;

use crate::Result;
use anyhow::Context;
use serde::Serialize;

/// Serializes `rows` as CSV with a header row taken from the field names of `T`.
///
/// When `rows` is empty only `header` is written, so that consumers still see the columns.
pub(crate) fn to_csv<T, I>(header: &[&str], rows: I) -> Result<Vec<u8>>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut rows = rows.into_iter().peekable();
    let mut writer = if rows.peek().is_none() {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(header)
            .context("Unable to write the CSV header")?;
        writer
    } else {
        csv::Writer::from_writer(Vec::new())
    };

    for row in rows {
        writer
            .serialize(row)
            .context("Unable to serialize a CSV row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush the CSV writer: {}", e.error()))
}
