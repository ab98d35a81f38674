//! The data-quality report: one CSV row per issue, with enough context to find the source record.

use crate::export::to_csv;
use crate::model::{Issue, IssueKind, Source};
use crate::Result;
use serde::Serialize;

pub const HEADER: [&str; 6] = ["Issue", "Source", "Line", "Trade Group", "Date", "Detail"];

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct QualityRow<'a> {
    #[serde(rename = "Issue")]
    pub kind: IssueKind,
    #[serde(rename = "Source")]
    pub source: Source,
    #[serde(rename = "Line")]
    pub line: Option<u64>,
    #[serde(rename = "Trade Group")]
    pub trade_group: Option<&'a str>,
    #[serde(rename = "Date")]
    pub date: Option<&'a str>,
    #[serde(rename = "Detail")]
    pub detail: &'a str,
}

impl<'a> From<&'a Issue> for QualityRow<'a> {
    fn from(issue: &'a Issue) -> Self {
        Self {
            kind: issue.kind(),
            source: issue.source(),
            line: issue.line(),
            trade_group: issue.trade_group(),
            date: issue.date(),
            detail: issue.detail(),
        }
    }
}

/// Renders the data-quality report for `issues`.
pub fn render(issues: &[Issue]) -> Result<Vec<u8>> {
    to_csv(&HEADER, issues.iter().map(QualityRow::from))
}
