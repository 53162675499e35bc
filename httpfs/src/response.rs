//! Status codes and response serialization.

use std::io::{self, Write};

/// The status codes this server ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    BadRequest,
    Forbidden,
    NotFound,
    InternalServerError,
    NotImplemented,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
            Self::NotImplemented => 501,
        }
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
        }
    }
}

/// Writes a full response: status line, `Content-Length`, blank line, body.
pub fn write_response(writer: &mut impl Write, status: Status, body: &[u8]) -> io::Result<()> {
    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n\r\n",
        status.code(),
        status.reason(),
        body.len()
    )?;
    writer.write_all(body)
}

/// Writes a status-only response with an empty body.
pub fn write_empty_response(writer: &mut impl Write, status: Status) -> io::Result<()> {
    write_response(writer, status, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_status_line_and_content_length() {
        let mut buf = Vec::new();
        write_response(&mut buf, Status::Ok, b"hello").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("hello"));
    }

    #[test]
    fn empty_response_has_zero_length() {
        let mut buf = Vec::new();
        write_empty_response(&mut buf, Status::NotFound).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Content-Length: 0\r\n"));
    }
}
