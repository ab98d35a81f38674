use crate::commands::Out;
use crate::{utils, Config, Result};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tracing::debug;

/// Whether one input file exists.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FileStatus {
    pub path: PathBuf,
    pub description: String,
    pub required: bool,
    pub found: bool,
}

impl FileStatus {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The presence of every input file the converter knows about.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FileCheck {
    files: Vec<FileStatus>,
}

impl FileCheck {
    /// Looks for each of the configured input files.
    pub async fn run(config: &Config) -> Self {
        let mut files = Vec::new();
        for input in config.inputs() {
            let found = utils::is_file(&input.path).await;
            debug!(
                "{} {}",
                if found { "Found" } else { "Missing" },
                input.path.display()
            );
            files.push(FileStatus {
                path: input.path,
                description: input.description.to_string(),
                required: input.required,
                found,
            });
        }
        Self { files }
    }

    pub fn files(&self) -> &[FileStatus] {
        &self.files
    }

    /// The required files that do not exist.
    pub fn missing(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|f| f.required && !f.found)
    }

    pub fn is_complete(&self) -> bool {
        self.missing().next().is_none()
    }

    /// Returns an error naming every missing required file.
    pub fn ensure_complete(&self) -> Result<()> {
        let missing: Vec<String> = self
            .missing()
            .map(|f| format!("{} ({})", f.path.display(), f.description))
            .collect();
        anyhow::ensure!(
            missing.is_empty(),
            "Missing required input files: {}",
            missing.join(", ")
        );
        Ok(())
    }
}

impl Display for FileCheck {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Required files:")?;
        for file in self.files.iter().filter(|file| file.required) {
            let mark = if file.found { "Found" } else { "MISSING" };
            writeln!(f, "  {mark} {} - {}", file.file_name(), file.description)?;
        }
        writeln!(f)?;
        writeln!(f, "Optional files:")?;
        for file in self.files.iter().filter(|file| !file.required) {
            let mark = if file.found { "Found" } else { "Missing" };
            writeln!(f, "  {mark} {} - {}", file.file_name(), file.description)?;
        }
        Ok(())
    }
}

/// Implementation of the `bot-tax check` command.
///
/// # Errors
/// - Any required input file is missing. The error lists the missing files.
pub async fn check(config: &Config) -> Result<Out<FileCheck>> {
    let report = FileCheck::run(config).await;
    if !report.is_complete() {
        // Show what was found before failing.
        println!("{report}");
        report.ensure_complete()?;
    }
    let found = report.files().iter().filter(|f| f.found).count();
    Ok(Out::new(
        format!(
            "All required input files are present in {} ({found} of {} files found)",
            config.root().display(),
            report.files().len()
        ),
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_check_all_present() {
        let env = TestEnv::new().await;
        let out = check(&env.config().await).await.unwrap();
        let report = out.structure().unwrap();
        assert!(report.is_complete());
        let found: Vec<bool> = report.files().iter().map(|f| f.found).collect();
        assert_eq!(found, vec![true, true, true, false]);
        let text = report.to_string();
        assert!(text.contains("Found pool_transactions.csv - Your main transaction log"));
        assert!(text.contains("Missing token_registry.json"));
    }

    #[tokio::test]
    async fn test_check_missing_required() {
        let env = TestEnv::new().await;
        env.remove_withdrawals().await;
        let err = check(&env.config().await).await.unwrap_err().to_string();
        assert!(err.contains("withdrawals.jsonl"), "{err}");
        assert!(err.contains("Withdrawal transactions"), "{err}");
        assert!(!err.contains("trading_log.json"), "{err}");
    }

    #[tokio::test]
    async fn test_check_explicit_registry_is_required() {
        let env = TestEnv::new().await;
        let config = env.config().await.with_token_registry("tokens.json");
        let report = FileCheck::run(&config).await;
        assert!(!report.is_complete());
        assert_eq!(report.missing().count(), 1);
    }
}
