use crate::commands::{load, Loaded, Out};
use crate::report::Summary;
use crate::{Config, Result};

/// Implementation of the `bot-tax summary` command. Parses the inputs like `convert` does but
/// writes nothing.
pub async fn summary(config: Config) -> Result<Out<Summary>> {
    let Loaded { ledger, issues } = load(&config).await?;
    let summary = Summary::new(&ledger, &issues);
    Ok(Out::new(
        format!(
            "Parsed {} transactions with {} issues to review",
            summary.total_transactions, summary.data_quality.issues
        ),
        summary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STANDARD_CSV;
    use crate::test::TestEnv;
    use crate::utils;

    #[tokio::test]
    async fn test_summary_writes_nothing() {
        let env = TestEnv::new().await;
        let out = summary(env.config().await).await.unwrap();
        let summary = out.structure().unwrap();
        assert_eq!(summary.total_transactions, TestEnv::TRANSACTIONS);
        assert_eq!(summary.sources.len(), 3);
        assert!(summary.date_range.is_some());
        assert!(!utils::is_file(env.root().join(STANDARD_CSV)).await);
    }

    #[tokio::test]
    async fn test_summary_matches_convert() {
        let env = TestEnv::new().await;
        let summarized = summary(env.config().await).await.unwrap();
        let converted = crate::commands::convert(env.config().await, None)
            .await
            .unwrap();
        assert_eq!(
            summarized.structure(),
            converted.structure().map(|c| &c.summary)
        );
    }
}
