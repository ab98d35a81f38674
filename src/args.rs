//! These structs provide the CLI interface for the bot-tax CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// bot-tax: Converts trading-bot logs into tax-reporting CSV files.
///
/// The program reads the files a Solana trading bot leaves in its data directory (the pool
/// transaction log, the trading log and the withdrawal log) and writes a generic tax CSV, an RP2
/// input CSV and a data-quality report that lists everything that needs a human look.
///
/// Input file names, the exchange label and the RP2 holder can be changed in an optional
/// bot-tax.json in the data directory.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Report which input files exist in the data directory.
    ///
    /// Fails if any required file is missing. Run this first to find out whether the bot's files
    /// are where the converter expects them.
    Check(CheckArgs),
    /// Parse all inputs, write the three CSV files and print a summary.
    Convert(ConvertArgs),
    /// Parse all inputs and print a summary without writing any files.
    Summary(SummaryArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory holding the bot's output files and, optionally, bot-tax.json.
    #[arg(long, env = "BOT_TAX_DATA_DIR", default_value_t = DisplayPath::default_data_dir())]
    data_dir: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, data_dir: PathBuf) -> Self {
        Self {
            log_level,
            data_dir: data_dir.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn data_dir(&self) -> &DisplayPath {
        &self.data_dir
    }
}

/// (Not shown): Args for the `bot-tax check` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CheckArgs {
    /// A token registry to check for instead of the configured one.
    #[arg(long)]
    token_registry: Option<PathBuf>,
}

impl CheckArgs {
    pub fn new(token_registry: Option<PathBuf>) -> Self {
        Self { token_registry }
    }

    pub fn token_registry(&self) -> Option<&Path> {
        self.token_registry.as_deref()
    }
}

/// (Not shown): Args for the `bot-tax convert` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ConvertArgs {
    /// Where to write the CSV files. Created if it does not exist. Defaults to the data directory,
    /// against which a relative path is resolved.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// A JSON object mapping token mint addresses to symbols. When given, the file must exist.
    /// Defaults to token_registry.json in the data directory, which is optional. A relative path
    /// is resolved against the data directory.
    #[arg(long)]
    token_registry: Option<PathBuf>,
}

impl ConvertArgs {
    pub fn new(output_dir: Option<PathBuf>, token_registry: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            token_registry,
        }
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn token_registry(&self) -> Option<&Path> {
        self.token_registry.as_deref()
    }
}

/// (Not shown): Args for the `bot-tax summary` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct SummaryArgs {
    /// A JSON object mapping token mint addresses to symbols. When given, the file must exist.
    #[arg(long)]
    token_registry: Option<PathBuf>,
}

impl SummaryArgs {
    pub fn new(token_registry: Option<PathBuf>) -> Self {
        Self { token_registry }
    }

    pub fn token_registry(&self) -> Option<&Path> {
        self.token_registry.as_deref()
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// The current directory.
    fn default_data_dir() -> Self {
        Self(PathBuf::from("."))
    }
}
