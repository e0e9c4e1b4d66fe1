//! Routes records from the `log` facade through a [`Logger`].
//!
//! The record target takes the place of the resolved caller name, since the
//! frame that called `log::info!` is buried under the facade's own frames.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use tracing::debug;

use crate::emitter::{Logger, Stream};
use crate::record::{Detail, Severity};

/// A `log::Log` implementation writing JSON lines to the out stream.
#[derive(Debug, Clone)]
pub struct LogBridge {
    logger: Logger,
    max_level: LevelFilter,
}

impl LogBridge {
    pub fn new(logger: Logger, max_level: LevelFilter) -> Self {
        Self { logger, max_level }
    }

    /// Installs the bridge as the process-wide `log` logger.
    pub fn install(logger: Logger, max_level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(logger, max_level)))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// Maps a facade level onto one of the predefined severities.
pub fn severity_for(level: Level) -> Severity {
    match level {
        Level::Error => Severity::ERROR,
        Level::Warn => Severity::WARN,
        Level::Info => Severity::INFO,
        Level::Debug | Level::Trace => Severity::DEBUG,
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        let line = record.line().map(|l| l.to_string());
        let mut details = Vec::with_capacity(2);
        if let Some(module) = record.module_path() {
            if module != record.target() {
                details.push(Detail::new("module", module));
            }
        }
        if let Some(line) = line.as_deref() {
            details.push(Detail::new("line", line));
        }

        let severity = severity_for(record.level());
        let result = self
            .logger
            .emit_named(Stream::Out, record.target(), &severity, &message, &details);
        if let Err(err) = result {
            debug!(error = %err, "discarded failed log write from log facade");
        }
    }

    fn flush(&self) {
        let sink = self.logger.config().current_out_stream();
        let mut writer = sink.lock();
        if let Err(err) = writer.flush() {
            debug!(error = %err, "flushing out stream failed");
        }
    }
}
