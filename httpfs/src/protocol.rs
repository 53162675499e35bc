//! Wire-level constants and field grammars for the HTTP/1.1 subset this
//! server understands.
//!
//! Every regex here mirrors a field of the request line or a header line as
//! given in the external interface contract: a request-line method token, a
//! single-path-component URI, an `HTTP/x.y` version token, and header
//! name/value grammars. Validation against these patterns is what turns an
//! out-of-grammar request into a `400 Bad Request` rather than a crash.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of header bytes (header lines plus their terminating
/// CRLFs, not counting the request line) a request may carry.
pub const MAX_HEADER_LEN: usize = 2048;

/// Request-line method token, e.g. `GET`, `PUT`, `DELETE`.
pub static TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]{1,8}$").unwrap());

/// Request-line URI: a single absolute path component.
pub static URI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[A-Za-z0-9.\-]{1,63}$").unwrap());

/// Request-line HTTP version token, e.g. `HTTP/1.1`.
pub static HTTP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^HTTP/[0-9]\.[0-9]$").unwrap());

/// The only HTTP version this server accepts.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Header field name grammar.
pub static HEADER_FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.\-]{1,128}$").unwrap());

/// Header field value grammar: printable ASCII, 1 to 128 bytes.
pub static HEADER_VALUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x20-\x7E]{1,128}$").unwrap());

/// The request method, classified per §6 of the interface contract.
///
/// Any method token outside `{GET, PUT}` that still passes the request-line
/// grammar is `Unsupported`, not a parse failure: `DELETE /a HTTP/1.1` is a
/// well-formed request for an unimplemented method, which is a `501`, not a
/// `400`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Unsupported,
}

impl Method {
    pub fn classify(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "PUT" => Self::Put,
            _ => Self::Unsupported,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}
