//! Request line parsing and validation.

use crate::error::RequestError;

/// The only method this server serves.
pub const METHOD_GET: &str = "GET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
    Unsupported,
}

impl Version {
    /// Exact, case-sensitive match on the protocol token.
    pub fn parse(protocol: &str) -> Self {
        match protocol {
            "HTTP/1.0" => Self::Http10,
            "HTTP/1.1" => Self::Http11,
            _ => Self::Unsupported,
        }
    }

    /// HTTP/1.0 connections are closed after one reply, even if the client asked for keep-alive.
    pub fn keep_alive(self) -> bool {
        matches!(self, Self::Http11)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub version: Version,
    /// Version token as sent, kept for logging.
    pub protocol: String,
}

impl Request {
    /// Parse a request like "GET / HTTP/1.1" from the bytes of a single read.
    ///
    /// Only the first line is looked at; headers and any body are ignored. Tokens past the third
    /// are ignored too.
    pub fn parse(data: &[u8]) -> Result<Self, RequestError> {
        let data = String::from_utf8_lossy(data);
        let request_line = data.split('\n').next().unwrap_or("");
        let mut tokens = request_line.split_whitespace();

        let method = tokens.next().ok_or(RequestError::Malformed)?;
        let target = tokens.next().ok_or(RequestError::Malformed)?;
        let protocol = tokens.next().ok_or(RequestError::Malformed)?;

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version: Version::parse(protocol),
            protocol: protocol.to_string(),
        })
    }

    /// Check method, then version.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.method != METHOD_GET {
            return Err(RequestError::UnsupportedMethod);
        }
        if self.version == Version::Unsupported {
            return Err(RequestError::UnsupportedVersion);
        }
        Ok(())
    }
}
