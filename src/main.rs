use bot_tax::args::{Args, Command};
use bot_tax::{commands, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let data_dir = args.common().data_dir().path();
    let mut config = Config::load(data_dir).await?;

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Check(check_args) => {
            if let Some(path) = check_args.token_registry() {
                config = config.with_token_registry(path);
            }
            commands::check(&config).await?.print_report()
        }

        Command::Convert(convert_args) => {
            if let Some(path) = convert_args.token_registry() {
                config = config.with_token_registry(path);
            }
            commands::convert(config, convert_args.output_dir())
                .await?
                .print_report()
        }

        Command::Summary(summary_args) => {
            if let Some(path) = summary_args.token_registry() {
                config = config.with_token_registry(path);
            }
            commands::summary(config).await?.print_report()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
