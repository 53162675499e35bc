//! Request-line and header parsing.
//!
//! Reads exactly one request off a buffered stream: a request line, zero or
//! more header lines, and the blank line that ends the header block. Nothing
//! here touches the body; callers that need one use [`Request::content_length`]
//! to know how many bytes to read next.

use std::collections::HashMap;
use std::io::BufRead;

use crate::error::ParseError;
use crate::protocol::{Method, HEADER_FIELD_REGEX, HEADER_VALUE_REGEX, HTTP_REGEX, MAX_HEADER_LEN, TYPE_REGEX, URI_REGEX};

/// A parsed request line plus headers, with no body yet consumed.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    headers: HashMap<String, String>,
}

impl Request {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("request-id")
    }

    /// The `Content-Length` header, required and validated for `PUT`.
    pub fn content_length(&self) -> Result<u64, ParseError> {
        let raw = self
            .header("content-length")
            .ok_or(ParseError::MissingContentLength)?;
        raw.parse::<u64>()
            .map_err(|_| ParseError::ContentLength(raw.to_owned()))
    }
}

/// Reads and validates one request's request-line and headers from `reader`.
///
/// `reader` is left positioned right after the blank line that ends the
/// header block, ready for a body read if one is needed.
pub fn parse_request(reader: &mut impl BufRead) -> Result<Request, ParseError> {
    let mut budget = MAX_HEADER_LEN;

    let line = read_crlf_line(reader, &mut budget)?;
    if line.is_empty() {
        return Err(ParseError::ConnectionClosed);
    }
    let (method, uri) = parse_request_line(&line)?;

    let mut headers = HashMap::new();
    loop {
        let line = read_crlf_line(reader, &mut budget)?;
        if line.is_empty() {
            break;
        }
        let (name, value) = parse_header_line(&line)?;
        headers.insert(name.to_ascii_lowercase(), value);
    }

    Ok(Request { method, uri, headers })
}

fn read_crlf_line(reader: &mut impl BufRead, budget: &mut usize) -> Result<String, ParseError> {
    let mut raw = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        let n = std::io::Read::read(reader, &mut byte)?;
        if n == 0 {
            if raw.is_empty() {
                return Ok(String::new());
            }
            return Err(ParseError::ConnectionClosed);
        }
        if *budget == 0 {
            return Err(ParseError::HeaderTooLarge(MAX_HEADER_LEN));
        }
        *budget -= 1;

        if byte[0] == b'\n' {
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            break;
        }
        raw.push(byte[0]);
    }
    String::from_utf8(raw).map_err(|e| ParseError::RequestLine(format!("{e}")))
}

fn parse_request_line(line: &str) -> Result<(Method, String), ParseError> {
    let mut parts = line.split(' ');
    let (Some(method_tok), Some(uri), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::RequestLine(line.to_owned()));
    };

    if !TYPE_REGEX.is_match(method_tok) {
        return Err(ParseError::RequestLine(line.to_owned()));
    }
    if !URI_REGEX.is_match(uri) {
        return Err(ParseError::RequestLine(line.to_owned()));
    }
    if !HTTP_REGEX.is_match(version) {
        return Err(ParseError::HttpVersion(version.to_owned()));
    }

    Ok((Method::classify(method_tok), uri.to_owned()))
}

fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(ParseError::HeaderLine(line.to_owned()));
    };
    let value = value.strip_prefix(' ').unwrap_or(value);

    if !HEADER_FIELD_REGEX.is_match(name) || !HEADER_VALUE_REGEX.is_match(value) {
        return Err(ParseError::HeaderLine(line.to_owned()));
    }

    Ok((name.to_owned(), value.to_owned()))
}
