//! # Logging Utilities
//!
//! Logging infrastructure for regview using `tracing`.
//!
//! Console and file output share one layer builder, so both outputs carry the
//! same fields (target, thread, file/line, RFC 3339 timestamps) in either the
//! pretty or the JSON format.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regview_utils::init_logging;
//!
//! // Reads RUST_LOG, REGVIEW_LOG_FORMAT and REGVIEW_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g., `RUST_LOG=debug`, `RUST_LOG=regview_core=debug`)
//! - `REGVIEW_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `REGVIEW_LOG_FILE`: Optional path to an additional, daily-rolled log file
//!
//! The returned [`LogGuard`] flushes buffered file output when dropped, so
//! binaries keep it alive for the whole of `main`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const FORMAT_VAR: &str = "REGVIEW_LOG_FORMAT";
const FILE_VAR: &str = "REGVIEW_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    #[default]
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Keeps the non-blocking file writer alive
///
/// Dropping the guard flushes pending file output.
#[derive(Debug)]
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard
{
    file: Option<PathBuf>,
    _worker: Option<WorkerGuard>,
}

impl LogGuard
{
    /// Path of the log file, if file output is active
    pub fn file(&self) -> Option<&Path>
    {
        self.file.as_deref()
    }
}

/// Initialize console logging from environment variables
///
/// `REGVIEW_LOG_FILE`, when set, adds a daily-rolled file output next to the
/// console output. An unparsable `REGVIEW_LOG_FORMAT` falls back to pretty.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<LogGuard, LoggingError>
{
    let format = env::var(FORMAT_VAR)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    init_console(format, None)
}

/// Initialize console logging with an explicit level and format
///
/// ## Example
///
/// ```rust,no_run
/// use regview_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LogGuard, LoggingError>
{
    init_console(format, Some(level.into()))
}

/// Initialize logging for TUI mode (file-only, no stdout)
///
/// Writing to stdout would corrupt the terminal UI, so all output goes to
/// `~/.regview/YYYY-MM-DD-regview-tui.log`, or to
/// `/tmp/YYYY-MM-DD-regview-tui.log` when `HOME` is not set.
///
/// `level` overrides `RUST_LOG` when given.
///
/// ## Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging_for_tui(level: Option<LogLevel>) -> Result<LogGuard, LoggingError>
{
    let log_file = tui_log_path(env::var_os("HOME").map(PathBuf::from))?;

    // The date is already in the filename
    let appender = tracing_appender::rolling::never(parent_dir(&log_file), file_name(&log_file));
    let (writer, worker) = tracing_appender::non_blocking(appender);
    let layer = fmt_layer(writer, LogFormat::Pretty, false, build_filter(level.map(Into::into)));

    install(vec![layer])?;
    Ok(LogGuard {
        file: Some(log_file),
        _worker: Some(worker),
    })
}

/// Compute (and create the directory for) the TUI log file
fn tui_log_path(home: Option<PathBuf>) -> Result<PathBuf, LoggingError>
{
    let name = format!("{}-regview-tui.log", Utc::now().format("%Y-%m-%d"));
    match home {
        Some(home) => {
            let dir = home.join(".regview");
            std::fs::create_dir_all(&dir)?;
            Ok(dir.join(name))
        }
        None => Ok(PathBuf::from("/tmp").join(name)),
    }
}

fn init_console(format: LogFormat, explicit: Option<Level>) -> Result<LogGuard, LoggingError>
{
    let mut layers = vec![fmt_layer(io::stdout, format, true, build_filter(explicit))];

    let file = env::var_os(FILE_VAR).map(PathBuf::from);
    let worker = file.as_ref().map(|path| {
        let appender = tracing_appender::rolling::daily(parent_dir(path), file_name(path));
        let (writer, worker) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(writer, format, false, build_filter(explicit)));
        worker
    });

    install(layers)?;
    Ok(LogGuard { file, _worker: worker })
}

/// Filter priority: explicit level (CLI flag), then `RUST_LOG`, then INFO
fn build_filter(explicit: Option<Level>) -> EnvFilter
{
    if let Some(level) = explicit {
        return EnvFilter::new(level.to_string());
    }
    match env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
        Err(_) => EnvFilter::new(Level::INFO.to_string()),
    }
}

fn fmt_layer<W>(writer: W, format: LogFormat, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn install(layers: Vec<BoxedLayer>) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

fn parent_dir(path: &Path) -> &Path
{
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn file_name(path: &Path) -> &std::ffi::OsStr
{
    path.file_name().unwrap_or_default()
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
