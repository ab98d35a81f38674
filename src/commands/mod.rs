//! Command handlers for the bot-tax CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod check;
mod convert;
mod summary;

use crate::model::{Issue, Ledger, TokenRegistry};
use crate::parse::{pool, trading_log, withdrawals};
use crate::{report, utils, Config, Result};
use anyhow::{bail, Context};
use serde::Serialize;
use std::fmt::{Debug, Display};
use tracing::{debug, info};

pub use check::{check, FileCheck, FileStatus};
pub use convert::{convert, Conversion, OutputFile};
pub use summary::summary;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug + Display,
{
    /// Like `print`, and also writes the human-readable form of the structured data to stdout.
    pub fn print_report(&self) {
        self.print();
        if let Some(structure) = self.structure() {
            println!("{structure}");
        }
    }
}

/// Everything `convert` and `summary` share: the parsed ledger and its reviewed issues.
#[derive(Debug)]
struct Loaded {
    ledger: Ledger,
    issues: Vec<Issue>,
}

/// Verifies the input files, reads them concurrently and parses them into one ledger.
///
/// Parse results are merged in a fixed order (pool transactions, trading log, withdrawals)
/// regardless of which read finished first.
async fn load(config: &Config) -> Result<Loaded> {
    FileCheck::run(config).await.ensure_complete()?;
    let tokens = load_tokens(config).await?;

    let pool_path = config.pool_transactions();
    let trading_path = config.trading_log();
    let withdrawals_path = config.withdrawals();
    let (pool_data, trading_data, withdrawals_data) = tokio::try_join!(
        utils::read_bytes(&pool_path),
        utils::read_bytes(&trading_path),
        utils::read_bytes(&withdrawals_path),
    )?;

    let exchange = config.exchange();
    let parsed = [
        pool::parse(&pool_data, exchange)
            .with_context(|| format!("Unable to parse {}", pool_path.display()))?,
        trading_log::parse(&trading_data, &tokens, exchange)
            .with_context(|| format!("Unable to parse {}", trading_path.display()))?,
        withdrawals::parse(&withdrawals_data, exchange)
            .with_context(|| format!("Unable to parse {}", withdrawals_path.display()))?,
    ];

    let mut ledger = Ledger::new();
    for p in parsed {
        debug!(
            "Parsed {} transactions from {} ({} skipped, {} issues)",
            p.stats.records,
            p.source(),
            p.stats.skipped,
            p.stats.issues
        );
        ledger.merge(p);
    }
    let issues = report::review(&ledger);
    Ok(Loaded { ledger, issues })
}

/// Loads the token registry. A missing registry falls back to the built-in tokens unless it was
/// asked for explicitly. A registry that exists but cannot be parsed is always an error.
async fn load_tokens(config: &Config) -> Result<TokenRegistry> {
    let path = config.token_registry();
    if utils::is_file(path).await {
        let tokens = TokenRegistry::load(path)
            .await
            .context("Unable to load the token registry")?;
        debug!("Loaded {} tokens from {}", tokens.len(), path.display());
        return Ok(tokens);
    }
    if config.token_registry_required() {
        bail!("The token registry {} does not exist", path.display());
    }
    debug!(
        "No token registry at {}, using the built-in tokens",
        path.display()
    );
    Ok(TokenRegistry::default())
}
