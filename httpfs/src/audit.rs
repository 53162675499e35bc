//! The audit trail: one CSV line per request, written to stderr.
//!
//! This is a fixed external contract, not a log level a user can tune, so it
//! goes through its own sink rather than through `log`. A single [`Mutex`]
//! serializes writes so lines from concurrent workers never interleave.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::protocol::Method;
use crate::response::Status;

/// Serializes audit writes so concurrent workers never interleave a line.
pub struct AuditSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl AuditSink {
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Records one request: `METHOD,URI,STATUS,REQUEST-ID\n`.
    ///
    /// `request_id` is written as-is, or empty when the client sent none.
    pub fn record(&self, method: Method, uri: &str, status: Status, request_id: Option<&str>) {
        let mut out = self.out.lock().unwrap();
        let _ = writeln!(
            out,
            "{},{},{},{}",
            method.as_str(),
            uri,
            status.code(),
            request_id.unwrap_or("")
        );
    }
}
