//! Error types for the fallible boundaries of the server: argument parsing,
//! socket setup, and request parsing. Filesystem errors surfaced while
//! handling a request are mapped straight to a status code in
//! [`crate::handler`] rather than propagated as an error, since a failed
//! `open()` is an ordinary response, not a server fault.

use thiserror::Error;

/// Errors from validating CLI arguments, surfaced before any socket is opened.
#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("thread count must be at least 1, got {0}")]
    ThreadCount(u32),
    #[error("port must be between 1 and 65535, got {0}")]
    Port(u32),
}

/// Errors from standing up the listening socket and worker pool.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from parsing a request off the wire. Every variant maps to a
/// `400 Bad Request` at the call site; the variant only exists to carry a
/// diagnostic message into the log.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("connection closed before a request line was received")]
    ConnectionClosed,
    #[error("header block exceeded {0} bytes")]
    HeaderTooLarge(usize),
    #[error("malformed request line: {0:?}")]
    RequestLine(String),
    #[error("unsupported HTTP version: {0:?}")]
    HttpVersion(String),
    #[error("malformed header line: {0:?}")]
    HeaderLine(String),
    #[error("PUT request missing required Content-Length header")]
    MissingContentLength,
    #[error("Content-Length value is not a valid non-negative integer: {0:?}")]
    ContentLength(String),
    #[error("I/O error while reading request: {0}")]
    Io(#[from] std::io::Error),
}
