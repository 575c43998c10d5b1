//! Response status lines and header blocks.

use std::io::{self, Write};

/// Every status this server ever replies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    VersionNotSupported,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::VersionNotSupported => 505,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::VersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// Write an error reply. Error replies never have a body.
///
/// Returns the number of bytes written.
pub fn write_error<W: Write>(out: &mut W, status: Status) -> io::Result<usize> {
    let header = format!(
        "HTTP/1.1 {}\r\n\
        Content-Type: N/A\r\n\
        Content-Length: 0\r\n\
        \r\n",
        status
    );
    out.write_all(header.as_bytes())?;
    Ok(header.len())
}

/// Write the header block of a file reply. The body must follow with exactly `content_length`
/// bytes.
///
/// Returns the number of bytes written.
pub fn write_file_header<W: Write>(
    out: &mut W,
    content_type: &str,
    content_length: u64,
) -> io::Result<usize> {
    let header = format!(
        "HTTP/1.1 {}\r\n\
        Content-Type: {}\r\n\
        Content-Length: {}\r\n\
        \r\n",
        Status::Ok,
        content_type,
        content_length
    );
    out.write_all(header.as_bytes())?;
    Ok(header.len())
}
