//! Configuration for a conversion run.
//!
//! Everything has a default, so a data directory holding the three bot files with their usual
//! names needs no configuration at all. An optional `$DATA_DIR/bot-tax.json` can rename the input
//! files and change the exchange and holder labels written to the exports.

use crate::export::rp2::DEFAULT_HOLDER;
use crate::model::DEFAULT_EXCHANGE;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "bot-tax";
const CONFIG_VERSION: u8 = 1;
pub const CONFIG_JSON: &str = "bot-tax.json";
pub const POOL_TRANSACTIONS_CSV: &str = "pool_transactions.csv";
pub const TRADING_LOG_JSON: &str = "trading_log.json";
pub const WITHDRAWALS_JSONL: &str = "withdrawals.jsonl";
pub const TOKEN_REGISTRY_JSON: &str = "token_registry.json";
pub const STANDARD_CSV: &str = "crypto_tax_standard.csv";
pub const RP2_CSV: &str = "crypto_tax_rp2.csv";
pub const QUALITY_CSV: &str = "data_quality_report.csv";

/// An input file the converter knows about.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct InputFile {
    pub path: PathBuf,
    pub description: &'static str,
    pub required: bool,
}

/// The `Config` object represents the settings of one run. You instantiate it by providing the
/// path to the data directory, from which it loads `bot-tax.json` if present and resolves the
/// paths of the input files.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_file: ConfigFile,
    token_registry: PathBuf,
    token_registry_required: bool,
}

impl Config {
    /// This will
    /// - validate that `data_dir` exists
    /// - load `bot-tax.json` from it, if the file exists
    /// - return the configuration object
    pub async fn load(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = data_dir.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The data directory is missing")?;
        if !root.is_dir() {
            bail!("The data directory '{}' is not a directory", root.display())
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = if utils::is_file(&config_path).await {
            debug!("Loading configuration from {}", config_path.display());
            ConfigFile::load(&config_path).await?
        } else {
            ConfigFile::default()
        };

        let token_registry = resolve(&root, config_file.token_registry());
        Ok(Self {
            token_registry_required: config_file.token_registry.is_some(),
            root,
            config_file,
            token_registry,
        })
    }

    /// Uses `path` as the token registry. A registry given explicitly must exist.
    pub fn with_token_registry(mut self, path: impl AsRef<Path>) -> Self {
        self.token_registry = resolve(&self.root, path.as_ref().to_path_buf());
        self.token_registry_required = true;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exchange(&self) -> &str {
        &self.config_file.exchange
    }

    pub fn holder(&self) -> &str {
        &self.config_file.holder
    }

    pub fn pool_transactions(&self) -> PathBuf {
        resolve(&self.root, self.config_file.pool_transactions())
    }

    pub fn trading_log(&self) -> PathBuf {
        resolve(&self.root, self.config_file.trading_log())
    }

    pub fn withdrawals(&self) -> PathBuf {
        resolve(&self.root, self.config_file.withdrawals())
    }

    pub fn token_registry(&self) -> &Path {
        &self.token_registry
    }

    /// Whether a missing token registry is an error rather than a reason to use the defaults.
    pub fn token_registry_required(&self) -> bool {
        self.token_registry_required
    }

    /// The input files, required ones first.
    pub fn inputs(&self) -> Vec<InputFile> {
        vec![
            InputFile {
                path: self.pool_transactions(),
                description: "Your main transaction log",
                required: true,
            },
            InputFile {
                path: self.trading_log(),
                description: "Detailed buy transaction data",
                required: true,
            },
            InputFile {
                path: self.withdrawals(),
                description: "Withdrawal transactions",
                required: true,
            },
            InputFile {
                path: self.token_registry.clone(),
                description: "Token mint address to symbol mapping",
                required: self.token_registry_required,
            },
        ]
    }
}

/// Returns `p` if it is absolute, otherwise joins it to `root`.
fn resolve(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        return p;
    }
    root.join(p)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "bot-tax",
///   "config_version": 1,
///   "exchange": "TradingBot",
///   "holder": "TradingBot",
///   "pool_transactions": "pool_transactions.csv",
///   "trading_log": "trading_log.json",
///   "withdrawals": "wallets/withdrawals.jsonl",
///   "token_registry": "token_registry.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
struct ConfigFile {
    /// Application name, should always be "bot-tax"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Label written to the `Exchange` column of both exports
    exchange: String,

    /// Label written to the `holder` column of the RP2 export
    holder: String,

    /// Paths are relative to the data directory, or absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pool_transactions: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    trading_log: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    withdrawals: Option<PathBuf>,

    /// When set, the registry file must exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    token_registry: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            exchange: DEFAULT_EXCHANGE.to_string(),
            holder: DEFAULT_HOLDER.to_string(),
            pool_transactions: None,
            trading_log: None,
            withdrawals: None,
            token_registry: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    #[cfg(test)]
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn pool_transactions(&self) -> PathBuf {
        self.pool_transactions
            .clone()
            .unwrap_or_else(|| PathBuf::from(POOL_TRANSACTIONS_CSV))
    }

    fn trading_log(&self) -> PathBuf {
        self.trading_log
            .clone()
            .unwrap_or_else(|| PathBuf::from(TRADING_LOG_JSON))
    }

    fn withdrawals(&self) -> PathBuf {
        self.withdrawals
            .clone()
            .unwrap_or_else(|| PathBuf::from(WITHDRAWALS_JSONL))
    }

    fn token_registry(&self) -> PathBuf {
        self.token_registry
            .clone()
            .unwrap_or_else(|| PathBuf::from(TOKEN_REGISTRY_JSON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        let root = utils::canonicalize(dir.path()).await.unwrap();
        assert_eq!(config.root(), root);
        assert_eq!(config.exchange(), "TradingBot");
        assert_eq!(config.holder(), "TradingBot");
        assert_eq!(config.pool_transactions(), root.join(POOL_TRANSACTIONS_CSV));
        assert_eq!(config.trading_log(), root.join(TRADING_LOG_JSON));
        assert_eq!(config.withdrawals(), root.join(WITHDRAWALS_JSONL));
        assert_eq!(config.token_registry(), root.join(TOKEN_REGISTRY_JSON));
        assert!(!config.token_registry_required());
        let required: Vec<bool> = config.inputs().iter().map(|i| i.required).collect();
        assert_eq!(required, vec![true, true, true, false]);
    }

    #[tokio::test]
    async fn test_config_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_overrides() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "app_name": "bot-tax",
            "exchange": "SniperBot",
            "withdrawals": "wallets/withdrawals.jsonl",
            "token_registry": "/etc/tokens.json"
        }"#;
        utils::write(dir.path().join(CONFIG_JSON), json).await.unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.exchange(), "SniperBot");
        assert_eq!(config.holder(), "TradingBot");
        assert_eq!(
            config.withdrawals(),
            config.root().join("wallets/withdrawals.jsonl")
        );
        assert_eq!(config.token_registry(), Path::new("/etc/tokens.json"));
        assert!(config.token_registry_required());
    }

    #[tokio::test]
    async fn test_config_file_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let json = r#"{"app_name": "other-app"}"#;
        utils::write(dir.path().join(CONFIG_JSON), json).await.unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"), "{err}");
    }

    #[tokio::test]
    async fn test_config_file_unparseable() {
        let dir = TempDir::new().unwrap();
        utils::write(dir.path().join(CONFIG_JSON), "{").await.unwrap();
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_with_token_registry() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path())
            .await
            .unwrap()
            .with_token_registry("custom.json");
        assert_eq!(config.token_registry(), config.root().join("custom.json"));
        assert!(config.token_registry_required());
        assert!(config.inputs()[3].required);
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_JSON);
        let original = ConfigFile {
            holder: "Me".to_string(),
            trading_log: Some(PathBuf::from("logs/trading_log.json")),
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let loaded = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, loaded);

        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("token_registry"));
    }
}
