//! Logging setup.
//!
//! Console output always; JSON instead of text on request; optionally a
//! daily-rotated log file.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "es_exporter=info,es_stats=info,tower_http=warn";

const LOG_FILE_PREFIX: &str = "es-exporter.log";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging options collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Filter directive; falls back to `RUST_LOG`, then [`DEFAULT_LOG_FILTER`].
    pub filter: Option<String>,
    pub format: LogFormat,
    /// Directory for daily-rotated log files.
    pub dir: Option<PathBuf>,
}

impl LogOptions {
    fn env_filter(&self) -> crate::Result<EnvFilter> {
        match &self.filter {
            Some(directive) => EnvFilter::try_new(directive)
                .map_err(|e| crate::Error::config(format!("Invalid filter directive: {}", e))),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process logs.
pub fn init_logging(options: &LogOptions) -> crate::Result<Option<WorkerGuard>> {
    let filter = options.env_filter()?;

    let console = match options.format {
        LogFormat::Text => fmt::layer().with_timer(LocalTimer).boxed(),
        LogFormat::Json => fmt::layer().json().with_timer(LocalTimer).boxed(),
    };

    let (file, guard) = match &options.dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTimer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    Ok(guard)
}

fn file_writer(dir: &Path) -> crate::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
