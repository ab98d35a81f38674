use crate::commands::{load, Loaded, Out};
use crate::config::{QUALITY_CSV, RP2_CSV, STANDARD_CSV, TOKEN_REGISTRY_JSON};
use crate::export::{quality, rp2, standard};
use crate::report::Summary;
use crate::{utils, Config, Result};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A CSV file written by `convert`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct OutputFile {
    pub path: PathBuf,
    /// Data rows, not counting the header.
    pub rows: usize,
}

/// The result of a conversion: the summary and the files that were written.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Conversion {
    pub summary: Summary,
    pub standard: OutputFile,
    pub rp2: OutputFile,
    pub quality: OutputFile,
}

impl Display for Conversion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(f, "=== FILES GENERATED ===")?;
        writeln!(f, "- {} ({} transactions)", name(&self.standard), self.standard.rows)?;
        writeln!(f, "- {} ({} transactions)", name(&self.rp2), self.rp2.rows)?;
        writeln!(
            f,
            "- {} ({} issues to review)",
            name(&self.quality),
            self.quality.rows
        )?;

        if self.summary.incomplete_trades > 0 {
            writeln!(f)?;
            writeln!(
                f,
                "WARNING: {} incomplete trades found! See {} for details.",
                self.summary.incomplete_trades,
                name(&self.quality)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "=== NEXT STEPS ===")?;
        writeln!(f, "1. Review {} for any issues", name(&self.quality))?;
        writeln!(
            f,
            "2. Add unknown tokens to {TOKEN_REGISTRY_JSON} in the data directory and convert again"
        )?;
        writeln!(f, "3. Upload {} to your tax service", name(&self.standard))?;
        writeln!(f, "4. Or use {} with the RP2 tax tool", name(&self.rp2))?;
        Ok(())
    }
}

fn name(file: &OutputFile) -> String {
    file.path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Implementation of the `bot-tax convert` command.
///
/// Parses the inputs and renders all three CSV files before writing any of them, so an export
/// error such as an unparseable date writes nothing. The files are then written one at a time.
/// A relative `output_dir` is resolved against the data directory, which is also the default. It
/// is created if it does not exist.
pub async fn convert(config: Config, output_dir: Option<&Path>) -> Result<Out<Conversion>> {
    let Loaded { ledger, issues } = load(&config).await?;
    let summary = Summary::new(&ledger, &issues);

    let standard_csv = standard::render(ledger.transactions())?;
    let rp2_csv = rp2::render(ledger.transactions(), config.holder())?;
    let quality_csv = quality::render(&issues)?;

    let dir = match output_dir {
        Some(dir) => config.root().join(dir),
        None => config.root().to_path_buf(),
    };
    utils::make_dir(&dir).await?;

    let standard = OutputFile {
        path: dir.join(STANDARD_CSV),
        rows: ledger.len(),
    };
    let rp2 = OutputFile {
        path: dir.join(RP2_CSV),
        rows: summary.buy_transactions + summary.sell_transactions,
    };
    let quality = OutputFile {
        path: dir.join(QUALITY_CSV),
        rows: issues.len(),
    };
    for (file, data) in [
        (&standard, &standard_csv),
        (&rp2, &rp2_csv),
        (&quality, &quality_csv),
    ] {
        utils::write(&file.path, data).await?;
        debug!("Wrote {} rows to {}", file.rows, file.path.display());
    }

    if summary.incomplete_trades > 0 {
        warn!(
            "{} incomplete trades found, see {}",
            summary.incomplete_trades,
            quality.path.display()
        );
    }

    Ok(Out::new(
        format!(
            "Converted {} transactions into {}",
            ledger.len(),
            dir.display()
        ),
        Conversion {
            summary,
            standard,
            rp2,
            quality,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::POOL_TRANSACTIONS_CSV;
    use crate::model::TransactionKind;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_convert_writes_three_files() {
        let env = TestEnv::new().await;
        let out = convert(env.config().await, None).await.unwrap();
        let conversion = out.structure().unwrap();

        for file in [&conversion.standard, &conversion.rp2, &conversion.quality] {
            assert!(utils::is_file(&file.path).await, "{}", file.path.display());
            assert!(file.path.starts_with(env.config().await.root()));
        }

        let summary = &conversion.summary;
        assert_eq!(summary.total_transactions, TestEnv::TRANSACTIONS);
        assert_eq!(summary.withdrawals, 2);
        assert_eq!(conversion.standard.rows, TestEnv::TRANSACTIONS);
        assert_eq!(conversion.rp2.rows, TestEnv::TRANSACTIONS - 2);
    }

    #[tokio::test]
    async fn test_convert_standard_csv_is_sorted_and_reads_back() {
        let env = TestEnv::new().await;
        let out = convert(env.config().await, None).await.unwrap();
        let conversion = out.structure().unwrap();

        let data = utils::read_bytes(&conversion.standard.path).await.unwrap();
        let rows = standard::read(&data).unwrap();
        assert_eq!(rows.len(), conversion.standard.rows);
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn test_convert_rp2_has_no_withdrawals() {
        let env = TestEnv::new().await;
        let out = convert(env.config().await, None).await.unwrap();
        let path = &out.structure().unwrap().rp2.path;

        let data = utils::read_bytes(path).await.unwrap();
        let mut reader = csv::Reader::from_reader(data.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), rp2::HEADER.to_vec());
        let kind = headers
            .iter()
            .position(|h| h == "transaction_type")
            .unwrap();
        let mut rows = 0;
        for record in reader.records() {
            let record = record.unwrap();
            assert_ne!(&record[kind], TransactionKind::Withdrawal.to_string());
            rows += 1;
        }
        assert_eq!(rows, TestEnv::TRANSACTIONS - 2);
    }

    #[tokio::test]
    async fn test_convert_quality_report_lists_issues() {
        let env = TestEnv::new().await;
        let out = convert(env.config().await, None).await.unwrap();
        let conversion = out.structure().unwrap();

        let text = utils::read(&conversion.quality.path).await.unwrap();
        assert!(text.starts_with("Issue,Source,Line,Trade Group,Date,Detail\n"));
        assert!(text.contains("unresolved_token,trading_log,"), "{text}");
        assert!(text.contains("incomplete_trade,ledger,"), "{text}");
        assert_eq!(text.lines().count(), conversion.quality.rows + 1);
        assert_eq!(conversion.summary.data_quality.missing_token_ids, 1);
        assert!(conversion.summary.incomplete_trades > 0);

        let report = conversion.to_string();
        assert!(report.contains("=== FILES GENERATED ==="), "{report}");
        assert!(report.contains("WARNING:"), "{report}");
        assert!(report.contains("=== NEXT STEPS ==="), "{report}");
    }

    #[tokio::test]
    async fn test_convert_creates_output_dir() {
        let env = TestEnv::new().await;
        let out_dir = env.root().join("reports").join("2024");
        let out = convert(env.config().await, Some(&out_dir)).await.unwrap();
        let conversion = out.structure().unwrap();
        assert_eq!(conversion.standard.path, out_dir.join(STANDARD_CSV));
        assert!(utils::is_file(out_dir.join(QUALITY_CSV)).await);
        assert!(!utils::is_file(env.root().join(STANDARD_CSV)).await);
    }

    #[tokio::test]
    async fn test_convert_render_error_writes_nothing() {
        let env = TestEnv::new().await;
        env.append(POOL_TRANSACTIONS_CSV, b"not-a-date,profit_return,1,0,1,9,x\n")
            .await;
        let err = format!("{:#}", convert(env.config().await, None).await.unwrap_err());
        assert!(err.contains("pool_transactions line 7"), "{err}");
        for name in [STANDARD_CSV, RP2_CSV, QUALITY_CSV] {
            assert!(!utils::is_file(env.root().join(name)).await, "{name}");
        }
    }

    #[tokio::test]
    async fn test_convert_missing_input_writes_nothing() {
        let env = TestEnv::new().await;
        env.remove_withdrawals().await;
        assert!(convert(env.config().await, None).await.is_err());
        assert!(!utils::is_file(env.root().join(STANDARD_CSV)).await);
    }

    #[tokio::test]
    async fn test_convert_uses_configured_labels() {
        let env = TestEnv::new().await;
        env.write_config(r#"{"app_name": "bot-tax", "exchange": "Sniper", "holder": "Alice"}"#)
            .await;
        let out = convert(env.config().await, None).await.unwrap();
        let conversion = out.structure().unwrap();

        let rp2 = utils::read(&conversion.rp2.path).await.unwrap();
        let first = rp2.lines().nth(1).unwrap();
        assert!(first.contains(",Sniper,Alice,"), "{first}");
        let standard = utils::read(&conversion.standard.path).await.unwrap();
        assert!(!standard.contains("TradingBot"), "{standard}");
    }
}
