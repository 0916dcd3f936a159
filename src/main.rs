//! tabpilot - browser co-pilot driven by a language model
//!
//! Main entry point for the tabpilot CLI.

mod app;
mod cli;
mod cmd_config;

use std::path::PathBuf;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{load_config, Session};
use cli::{Cli, Commands, ConfigAction};

/// Get the .tabpilot directory path.
fn tabpilot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tabpilot"))
        .unwrap_or_else(|| PathBuf::from(".tabpilot"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.tabpilot/logs/ with daily rotation. Console
/// output goes to stderr so answers on stdout stay clean.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = tabpilot_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("tabpilot")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the background writer.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask { prompt, session } => {
            let handle = load_config(cli.config)?;
            Session::start(handle, &session, false)?.ask(&prompt).await
        }
        Commands::Chat { session } => {
            let handle = load_config(cli.config)?;
            Session::start(handle, &session, true)?.chat().await
        }
        Commands::Tools => cmd_config::handle_tools(),
        Commands::Config {
            action: ConfigAction::Check,
        } => {
            let handle = load_config(cli.config)?;
            cmd_config::handle_config_check(&handle)
        }
    }
}
