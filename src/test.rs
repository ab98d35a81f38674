//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::config::{
    CONFIG_JSON, POOL_TRANSACTIONS_CSV, TOKEN_REGISTRY_JSON, TRADING_LOG_JSON, WITHDRAWALS_JSONL,
};
use crate::{utils, Config};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Four trades, one pool reset that is skipped.
const POOL_TRANSACTIONS: &str = "\
timestamp,type,amount,poolBefore,poolAfter,tradeNumber,notes
2024-01-01T10:00:00.000Z,trade_execution,-15.0,100,85,1,Buy BONK
2024-01-01T12:00:00.000Z,profit_return,18.5,85,103.5,1,Sold BONK
2024-01-02T09:00:00.000Z,trade_execution,-15.0,103.5,88.5,2,Buy WIF
2024-01-02T09:30:00.000Z,pool_reset,0,88.5,88.5,,
2024-01-03T09:00:00.000Z,loss_return,9.25,88.5,97.75,3,Sold XYZ
";

/// Two buys, one of an unknown token, and a scan entry that is skipped.
const TRADING_LOG: &str = r#"{"action":"immediate_buy","tokenMint":"So11111111111111111111111111111111111111112","amount":100,"entryPrice":25,"timestamp":"2024-01-01T10:00:00Z","poolStatus":{"totalTrades":1}}
{"action":"scan","tokens":3}
{"action":"immediate_buy","tokenMint":"abcdefghXYZ123","amount":15,"entryPrice":0.5,"timestamp":"2024-01-02T09:00:00Z","poolStatus":{"totalTrades":2}}
"#;

/// Two withdrawals and a running summary line that is skipped.
const WITHDRAWALS: &str = r#"{"withdrawalNumber":1,"type":"HARDWARE","timestamp":"2024-01-04T00:00:00Z","amountSOL":0.5,"amountUSD":50}
{"totalWithdrawn":50,"count":1}
{"withdrawalNumber":2,"type":"TAX_PAYMENT","timestamp":1704412800000,"amountSOL":0.25,"amountUSD":25}
"#;

/// Test environment with a data directory holding a small set of bot files.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestEnv {
    /// Transactions in the sample files: four pool rows, two trading-log buys and two withdrawals.
    pub const TRANSACTIONS: usize = 8;

    /// Creates a data directory with the sample pool, trading log and withdrawal files. There is
    /// no token registry and no configuration file.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        utils::make_dir(&root).await.unwrap();
        let env = Self {
            _temp_dir: temp_dir,
            root,
        };
        env.write(POOL_TRANSACTIONS_CSV, POOL_TRANSACTIONS).await;
        env.write_trading_log(TRADING_LOG).await;
        env.write(WITHDRAWALS_JSONL, WITHDRAWALS).await;
        env
    }

    /// Loads a fresh Config for the data directory.
    pub async fn config(&self) -> Config {
        Config::load(&self.root).await.unwrap()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn write_trading_log(&self, contents: &str) {
        self.write(TRADING_LOG_JSON, contents).await
    }

    pub async fn write_token_registry(&self, contents: &str) {
        self.write(TOKEN_REGISTRY_JSON, contents).await
    }

    pub async fn write_config(&self, contents: &str) {
        self.write(CONFIG_JSON, contents).await
    }

    /// Appends raw bytes to one of the input files, e.g. `TRADING_LOG_JSON`.
    pub async fn append(&self, name: &str, bytes: &[u8]) {
        let path = self.root.join(name);
        let mut data = utils::read_bytes(&path).await.unwrap();
        data.extend_from_slice(bytes);
        utils::write(path, data).await.unwrap();
    }

    pub async fn remove_withdrawals(&self) {
        tokio::fs::remove_file(self.root.join(WITHDRAWALS_JSONL))
            .await
            .unwrap();
    }

    async fn write(&self, name: &str, contents: &str) {
        utils::write(self.root.join(name), contents).await.unwrap();
    }
}
