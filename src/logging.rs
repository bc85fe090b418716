//! Tracing setup for Post Box.
//!
//! Output goes to stdout and, unless `logging.file` is empty, is appended to
//! the log file so earlier runs survive a restart.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::{PostboxError, Result};

/// Directives applied on top of the configured level.
///
/// sqlx logs every statement at info.
const QUIET_DIRECTIVES: &[&str] = &["sqlx::query=warn"];

fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Level::WARN,
        other => Level::from_str(other).unwrap_or(Level::INFO),
    }
}

/// `RUST_LOG` wins over the configured level.
fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::builder()
        .with_default_directive(parse_level(level).into())
        .from_env_lossy();
    for directive in QUIET_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn install<L>(layer: L, level: &str) -> Result<()>
where
    L: tracing_subscriber::Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(layer.with_filter(build_filter(level)))
        .try_init()
        .map_err(|e| PostboxError::Config(format!("logging already initialized: {e}")))
}

/// Initialize logging from the `[logging]` section.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.trim().is_empty() {
        return install(console_layer(), &config.level);
    }

    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;
    let writer = std::io::stdout.and(Arc::new(log_file));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    install(layer, &config.level)
}

fn console_layer() -> impl tracing_subscriber::Layer<Registry> + Send + Sync + 'static {
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
}

/// Console-only logging, used when the log file cannot be opened.
pub fn init_console_only(level: &str) {
    if let Err(e) = install(console_layer(), level) {
        eprintln!("{e}");
    }
}
