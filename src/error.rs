use std::io;

use thiserror::Error;

/// Errors raised by the logger.
///
/// Configuration has a single failure mode (a bad timezone). Everything else
/// is a write failure reported by the sink, which the reporting entry points
/// hand back as a plain `io::Result`.
#[derive(Debug, Error)]
pub enum LogError {
    /// The timezone given to a setter was empty or could not be recognised.
    #[error("invalid timezone argument: {0:?}")]
    InvalidTimezone(String),

    /// The output stream rejected a write.
    ///
    /// The logger never builds this itself: reporting entry points return the
    /// sink's `io::Result` untouched. It lets callers that also change the
    /// configuration fold both failure kinds into one `LogError` with `?`.
    #[error("sink write error: {0}")]
    Write(#[from] io::Error),
}

/// Result alias used by the configuration setters.
pub type Result<T> = std::result::Result<T, LogError>;
