use crate::status::Status;

/// Reasons a single request is answered with an error reply. Each one ends the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// Fewer than three tokens on the request line.
    Malformed,
    UnsupportedMethod,
    UnsupportedVersion,
    /// Target doesn't start with a slash or tries to climb out of the document root.
    InvalidTarget,
    /// Missing file, directory, or a file that couldn't be opened.
    NotFound,
    /// File isn't readable by others.
    Forbidden,
}

impl RequestError {
    pub fn status(self) -> Status {
        match self {
            Self::Malformed | Self::InvalidTarget => Status::BadRequest,
            Self::UnsupportedMethod => Status::MethodNotAllowed,
            Self::UnsupportedVersion => Status::VersionNotSupported,
            Self::NotFound => Status::NotFound,
            Self::Forbidden => Status::Forbidden,
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::Malformed => "malformed request line",
            Self::UnsupportedMethod => "method not supported",
            Self::UnsupportedVersion => "protocol version not supported",
            Self::InvalidTarget => "invalid request target",
            Self::NotFound => "file not found",
            Self::Forbidden => "file not world-readable",
        };
        write!(f, "{}", reason)
    }
}

impl std::error::Error for RequestError {}
