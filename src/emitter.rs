//! Record assembly and emission.
//!
//! Every entry point renders the whole record into one buffer and hands it
//! to the stream in a single `write` call. Records are laid out as
//!
//! ```text
//! {"Time":"..","Func":"..","Severity":"..","Message":".."[,"Dtls":{"k":"v",..}]}\n
//! ```
//!
//! with the keys always in that order.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::debug;

use crate::caller;
use crate::config::{Config, SharedSink};
use crate::json;
use crate::record::{Detail, Severity};

/// Bytes of fixed punctuation and key names in every record.
const BASE_OVERHEAD: usize = 49;
/// `,"Dtls":{` and its closing brace, minus the comma the last detail lacks.
const DETAILS_OVERHEAD: usize = 9;
/// Quotes, colon and separating comma around one detail.
const PER_DETAIL_OVERHEAD: usize = 6;

/// Which default stream of the configuration a record goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

/// Formats and writes structured log lines.
///
/// A logger owns a handle to its [`Config`]; clones share it, so a setter
/// called through one clone is seen by all of them.
///
/// # Examples
///
/// ```
/// use jsonline_logger::{Config, Detail, Logger, Severity};
/// use jsonline_logger::caller::FixedCaller;
///
/// let logger = Logger::new(
///     Config::builder()
///         .caller_resolver(FixedCaller::new("app::main"))
///         .date_format("fixed")
///         .build(),
/// );
///
/// let mut out = Vec::new();
/// logger.log_to(&mut out, &Severity::INFO, "failed", &[
///     Detail::new("retries", "3"),
///     Detail::new("user", "alice"),
/// ]).unwrap();
///
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "{\"Time\":\"fixed\",\"Func\":\"main\",\"Severity\":\"INFO\",\"Message\":\"failed\",\
///      \"Dtls\":{\"retries\":\"3\",\"user\":\"alice\"}}\n",
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Logger {
    config: Arc<Config>,
}

impl Logger {
    pub fn new(config: Config) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    /// Builds a logger over a configuration that other loggers may share.
    pub fn with_shared_config(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Writes a record to the configured out stream and returns the stream's
    /// result unchanged.
    #[inline(never)]
    pub fn log_out(&self, severity: &Severity, message: &str, details: &[Detail<'_>]) -> io::Result<usize> {
        self.emit(Stream::Out, 1, severity, message, details)
    }

    /// Like [`log_out`](Self::log_out) but ignores the result.
    #[inline(never)]
    pub fn ulog_out(&self, severity: &Severity, message: &str, details: &[Detail<'_>]) {
        if let Err(err) = self.emit(Stream::Out, 1, severity, message, details) {
            debug!(error = %err, stream = "out", "discarded failed log write");
        }
    }

    /// Writes a record to the configured err stream.
    #[inline(never)]
    pub fn log_err(&self, severity: &Severity, message: &str, details: &[Detail<'_>]) -> io::Result<usize> {
        self.emit(Stream::Err, 1, severity, message, details)
    }

    #[inline(never)]
    pub fn ulog_err(&self, severity: &Severity, message: &str, details: &[Detail<'_>]) {
        if let Err(err) = self.emit(Stream::Err, 1, severity, message, details) {
            debug!(error = %err, stream = "err", "discarded failed log write");
        }
    }

    /// Writes a record to a caller supplied stream.
    ///
    /// The stream is neither flushed nor closed.
    #[inline(never)]
    pub fn log_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        severity: &Severity,
        message: &str,
        details: &[Detail<'_>],
    ) -> io::Result<usize> {
        let record = self.format_record(1, severity, message, details);
        writer.write(&record)
    }

    #[inline(never)]
    pub fn ulog_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        severity: &Severity,
        message: &str,
        details: &[Detail<'_>],
    ) {
        let record = self.format_record(1, severity, message, details);
        if let Err(err) = writer.write(&record) {
            debug!(error = %err, stream = "custom", "discarded failed log write");
        }
    }

    /// Renders a record for the default stream `stream` and writes it.
    ///
    /// `skip_frames` follows [`format_record`](Self::format_record): `0`
    /// names the function calling `emit`.
    #[inline(never)]
    pub(crate) fn emit(
        &self,
        stream: Stream,
        skip_frames: usize,
        severity: &Severity,
        message: &str,
        details: &[Detail<'_>],
    ) -> io::Result<usize> {
        let sink = self.sink_for(stream);
        let record = self.format_record(skip_frames + 1, severity, message, details);
        let mut writer = sink.lock();
        writer.write(&record)
    }

    /// Assembles one newline-terminated record.
    ///
    /// `skip_frames` picks the frame named in `Func`: `0` is the function
    /// calling `format_record`, `1` its caller, and so on.
    #[inline(never)]
    pub fn format_record(
        &self,
        skip_frames: usize,
        severity: &Severity,
        message: &str,
        details: &[Detail<'_>],
    ) -> Vec<u8> {
        let timestamp = self.config.current_timestamp();
        let func = self.config.current_caller_name(skip_frames + 1);
        self.assemble(&timestamp, &func, severity, message, details)
    }

    /// Writes a record whose `Func` is given instead of resolved from the
    /// stack. The length policy still applies.
    pub(crate) fn emit_named(
        &self,
        stream: Stream,
        func: &str,
        severity: &Severity,
        message: &str,
        details: &[Detail<'_>],
    ) -> io::Result<usize> {
        let sink = self.sink_for(stream);
        let timestamp = self.config.current_timestamp();
        let func = caller::apply_length_policy(func, self.config.caller_name_length());
        let record = self.assemble(&timestamp, func, severity, message, details);
        let mut writer = sink.lock();
        writer.write(&record)
    }

    fn sink_for(&self, stream: Stream) -> SharedSink {
        match stream {
            Stream::Out => self.config.current_out_stream(),
            Stream::Err => self.config.current_err_stream(),
        }
    }

    fn assemble(
        &self,
        timestamp: &str,
        func: &str,
        severity: &Severity,
        message: &str,
        details: &[Detail<'_>],
    ) -> Vec<u8> {
        let push: fn(&mut Vec<u8>, &str) = if self.config.escaping() {
            json::push_escaped
        } else {
            json::push_raw
        };

        let mut buf = Vec::with_capacity(estimate_len(timestamp, func, severity, message, details));

        buf.extend_from_slice(br#"{"Time":""#);
        push(&mut buf, timestamp);
        buf.extend_from_slice(br#"","Func":""#);
        push(&mut buf, func);
        buf.extend_from_slice(br#"","Severity":""#);
        push(&mut buf, severity.as_str());
        buf.extend_from_slice(br#"","Message":""#);
        push(&mut buf, message);
        buf.push(b'"');

        if !details.is_empty() {
            buf.extend_from_slice(br#","Dtls":{"#);
            for (i, detail) in details.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                buf.push(b'"');
                push(&mut buf, detail.name());
                buf.extend_from_slice(br#"":""#);
                push(&mut buf, detail.value());
                buf.push(b'"');
            }
            buf.push(b'}');
        }
        buf.extend_from_slice(b"}\n");
        buf
    }
}

/// Capacity hint for a record. Escaping can make the record longer; the
/// buffer then grows as usual.
fn estimate_len(
    timestamp: &str,
    func: &str,
    severity: &Severity,
    message: &str,
    details: &[Detail<'_>],
) -> usize {
    let mut len = BASE_OVERHEAD + timestamp.len() + func.len() + severity.as_str().len() + message.len();
    if !details.is_empty() {
        len += DETAILS_OVERHEAD + details.len() * PER_DETAIL_OVERHEAD;
        len += details
            .iter()
            .map(|d| d.name().len() + d.value().len())
            .sum::<usize>();
    }
    len
}
