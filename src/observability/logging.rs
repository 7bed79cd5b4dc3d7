//! Structured logging.
//!
//! # Responsibilities
//! - Install the process-wide `tracing` subscriber (explicit, once, by the binary)
//! - Provide the `Logger` capability handlers and recovery functions log through
//!
//! # Design Decisions
//! - Library code logs with `tracing` macros and structured fields
//! - `Logger` is constructed explicitly and passed as `Arc<dyn Logger>`;
//!   there is no hidden default instance
//! - JSON format for production, pretty format for development

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt};

use crate::config::{LogFormat, ObservabilityConfig};

/// Leveled logging capability.
///
/// Every method takes pre-built [`fmt::Arguments`]; the `log_*!` macros
/// build them from a format template and positional arguments.
pub trait Logger: Send + Sync {
    fn trace(&self, args: fmt::Arguments<'_>);
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);

    /// Log under a caller-defined severity label.
    fn custom(&self, level: &str, args: fmt::Arguments<'_>);

    /// Log, then terminate the process.
    fn fatal(&self, args: fmt::Arguments<'_>) -> !;
}

/// [`Logger`] that forwards to the installed `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn trace(&self, args: fmt::Arguments<'_>) {
        tracing::trace!("{}", args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!("{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!("{}", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!("{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!("{}", args);
    }

    fn custom(&self, level: &str, args: fmt::Arguments<'_>) {
        tracing::info!(custom_level = %level, "{}", args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        tracing::error!(fatal = true, "{}", args);
        std::process::exit(1)
    }
}

/// [`Logger`] writing `[LEVEL] message` lines to a byte sink.
pub struct ConsoleLogger<W> {
    sink: Mutex<W>,
}

impl ConsoleLogger<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ConsoleLogger<W> {
    pub fn new(sink: W) -> Self {
        Self { sink: Mutex::new(sink) }
    }

    fn line(&self, level: &str, args: fmt::Arguments<'_>) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        // A logger has nowhere to report its own write failures.
        let _ = writeln!(sink, "[{level}] {args}");
    }
}

impl ConsoleLogger<Vec<u8>> {
    /// Everything logged so far, for in-memory sinks.
    pub fn contents(&self) -> String {
        let sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&sink).into_owned()
    }
}

impl<W: Write + Send> Logger for ConsoleLogger<W> {
    fn trace(&self, args: fmt::Arguments<'_>) {
        self.line("TRACE", args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.line("DEBUG", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        self.line("INFO", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.line("WARN", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.line("ERROR", args);
    }

    fn custom(&self, level: &str, args: fmt::Arguments<'_>) {
        self.line(level, args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.line("FATAL", args);
        std::process::exit(1)
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => { $logger.trace(format_args!($($arg)+)) };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => { $logger.debug(format_args!($($arg)+)) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => { $logger.info(format_args!($($arg)+)) };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => { $logger.warn(format_args!($($arg)+)) };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => { $logger.error(format_args!($($arg)+)) };
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_fmt::layer()).try_init(),
    }
}
