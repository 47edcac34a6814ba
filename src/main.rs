//! snooze-nl - natural-language snooze for webmail
//!
//! Main entry point for the snooze-nl CLI.

mod cli;
mod cmd_config;
mod cmd_simulate;
mod cmd_snooze;
mod settings;

use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use snooze_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Log files are written to the configured directory with daily rotation.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&logging.directory)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("snooze-nl")
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&logging.directory)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the writer flushing for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable, colored, on stderr so stdout stays clean)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        // File layer (text format without colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match cli.config {
        Some(ref path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_or_default(&ConfigLoader::default_path())?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.logging)?;

    // `config` prints the full report itself, errors included.
    if !matches!(cli.command, Commands::Config) {
        for warning in ConfigValidator::validate(&config)?.into_result()? {
            warn!(path = %warning.path, "{}", warning.message);
        }
    }

    match cli.command {
        Commands::Preview {
            text,
            day_first,
            date_sample,
            time_sample,
        } => cmd_snooze::preview(&text, day_first, &date_sample, &time_sample),
        Commands::Snooze {
            text,
            port,
            headless,
            day_first,
        } => cmd_snooze::snooze(&config, &text, port, headless, day_first).await,
        Commands::Watch { port, day_first } => cmd_snooze::watch(&config, port, day_first).await,
        Commands::Simulate { text, fail_trigger } => {
            cmd_simulate::simulate(&config, &text, fail_trigger).await
        }
        Commands::Config => cmd_config::show(&config, cli.config.as_deref()),
    }
}
