//! # JSON line logger
//!
//! A small structured logger that turns a severity, a message and a list of
//! name/value details into one JSON object per line:
//!
//! ```text
//! {"Time":"2024-03-09T17:04:05 UTC","Func":"worker::run","Severity":"INFO","Message":"started"}
//! {"Time":"2024-03-09T17:04:06 UTC","Func":"worker::run","Severity":"ERR ","Message":"failed","Dtls":{"retries":"3"}}
//! ```
//!
//! ## Main Components
//!
//! * `Logger`: formats records and writes each one with a single `write` call
//! * `Config`: timezone, date format, caller-name policy and default streams
//!   behind one lock
//! * `caller`: pluggable lookup of the calling function's name
//! * `bridge`: a `log::Log` adapter
//!
//! Loggers can be built and passed around explicitly. For code that prefers
//! a process-wide logger, the free functions in this module forward to a
//! lazily created default instance whose streams start out as no-op sinks.
//!
//! ## Quick Start
//!
//! ```
//! use jsonline_logger::{Config, Detail, Logger, Severity};
//!
//! let logger = Logger::new(Config::builder().out_stream(std::io::stdout()).build());
//! logger.ulog_out(&Severity::INFO, "started", &[]);
//! logger.ulog_out(&Severity::WARN, "slow response", &[Detail::new("ms", "950")]);
//! ```

use std::io::{self, Write};

use lazy_static::lazy_static;
use tracing::debug;

pub mod bridge;
pub mod caller;
pub mod config;
pub mod emitter;
pub mod error;
mod json;
pub mod record;

pub use bridge::LogBridge;
pub use config::{shared_sink, Config, ConfigBuilder, SharedSink, Timezone};
pub use emitter::{Logger, Stream};
pub use error::{LogError, Result};
pub use record::{Detail, Severity};

lazy_static! {
    /// Process-wide logger used by the free functions.
    static ref GLOBAL_LOGGER: Logger = Logger::default();
}

/// The process-wide logger.
pub fn global() -> &'static Logger {
    &GLOBAL_LOGGER
}

/// Writes a record to the global out stream.
#[inline(never)]
pub fn log_out(severity: &Severity, message: &str, details: &[Detail<'_>]) -> io::Result<usize> {
    global().emit(Stream::Out, 1, severity, message, details)
}

#[inline(never)]
pub fn ulog_out(severity: &Severity, message: &str, details: &[Detail<'_>]) {
    if let Err(err) = global().emit(Stream::Out, 1, severity, message, details) {
        debug!(error = %err, stream = "out", "discarded failed log write");
    }
}

/// Writes a record to the global err stream.
#[inline(never)]
pub fn log_err(severity: &Severity, message: &str, details: &[Detail<'_>]) -> io::Result<usize> {
    global().emit(Stream::Err, 1, severity, message, details)
}

#[inline(never)]
pub fn ulog_err(severity: &Severity, message: &str, details: &[Detail<'_>]) {
    if let Err(err) = global().emit(Stream::Err, 1, severity, message, details) {
        debug!(error = %err, stream = "err", "discarded failed log write");
    }
}

/// Writes a record to `writer` using the global configuration.
#[inline(never)]
pub fn log_to<W: Write + ?Sized>(
    writer: &mut W,
    severity: &Severity,
    message: &str,
    details: &[Detail<'_>],
) -> io::Result<usize> {
    let record = global().format_record(1, severity, message, details);
    writer.write(&record)
}

#[inline(never)]
pub fn ulog_to<W: Write + ?Sized>(writer: &mut W, severity: &Severity, message: &str, details: &[Detail<'_>]) {
    let record = global().format_record(1, severity, message, details);
    if let Err(err) = writer.write(&record) {
        debug!(error = %err, stream = "custom", "discarded failed log write");
    }
}

pub fn set_caller_name_length(length: i64) {
    global().config().set_caller_name_length(length);
}

pub fn exclude_caller_name() {
    global().config().exclude_caller_name();
}

pub fn set_timezone(timezone: &str) -> Result<()> {
    global().config().set_timezone(timezone)
}

pub fn set_date_format(pattern: impl Into<String>) {
    global().config().set_date_format(pattern);
}

pub fn set_out_stream<W: Write + Send + 'static>(writer: W) {
    global().config().set_out_stream(writer);
}

pub fn set_err_stream<W: Write + Send + 'static>(writer: W) {
    global().config().set_err_stream(writer);
}
