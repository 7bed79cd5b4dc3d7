//! Error types surfaced by the request facade and the response writer.
//!
//! Missing headers and parameters are not errors (they read as `""`), and
//! handler panics are not error values either. What is left here are the
//! I/O faults a caller can act on.

use std::backtrace::Backtrace as CapturedBacktrace;

use thiserror::Error;

/// Failure while pulling the request body off the transport.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body stream failed or exceeded the configured limit.
    #[error("failed to read request body: {source}")]
    Read {
        source: axum::Error,
        backtrace: CapturedBacktrace,
    },

    /// An earlier read already failed; the stream cannot be replayed.
    #[error("request body unavailable after a failed read")]
    Unavailable,
}

impl BodyError {
    pub(crate) fn read(source: axum::Error) -> Self {
        Self::Read {
            source,
            backtrace: CapturedBacktrace::capture(),
        }
    }
}

/// Failure while serializing a response onto a [`ResponseWriter`].
///
/// [`ResponseWriter`]: crate::http::response::ResponseWriter
#[derive(Debug, Error)]
pub enum WriteError {
    /// The transport cannot carry this status code.
    #[error("status code {0} cannot be written by the transport")]
    InvalidStatus(u16),

    /// Header name or value rejected by the transport.
    #[error("invalid response header {name:?}")]
    InvalidHeader { name: String },

    /// The underlying sink failed.
    #[error("failed to write response: {source}")]
    Io {
        source: std::io::Error,
        backtrace: CapturedBacktrace,
    },
}

impl WriteError {
    pub fn io(source: std::io::Error) -> Self {
        Self::Io {
            source,
            backtrace: CapturedBacktrace::capture(),
        }
    }
}
