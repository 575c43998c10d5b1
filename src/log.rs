//! Access log entries in Common Log Format.

use std::net::IpAddr;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing_subscriber::EnvFilter;

use crate::request::Request;
use crate::status::Status;

/// Target used for access log events. `RUST_LOG=info,access=off` keeps only diagnostics.
pub const ACCESS_TARGET: &str = "access";

/// Filter used when RUST_LOG isn't set.
const DEFAULT_DIRECTIVES: &str = "info";

/// Log filter from RUST_LOG, falling back to everything at info level.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Common Log Format (CLF) formatted date in local timezone.
pub struct ClfDate(pub SystemTime);

impl std::fmt::Display for ClfDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let datetime = DateTime::<Local>::from(self.0);
        write!(f, "{}", datetime.format("[%d/%b/%Y:%H:%M:%S %z]"))
    }
}

/// Encode string for logging. Logs should not contain control characters or double quotes.
pub struct LogEncoded<'a>(pub &'a str);

impl<'a> std::fmt::Display for LogEncoded<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.0.chars() {
            if !c.is_ascii() || c.is_ascii_control() || c == '"' {
                let mut buf = [0; 4];
                c.encode_utf8(&mut buf);
                for b in buf.iter().take(c.len_utf8()) {
                    write!(f, "%{:02X}", b)?;
                }
            } else {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// One line of the access log.
pub struct AccessEntry<'a> {
    pub client: IpAddr,
    pub time: SystemTime,
    pub request: &'a Request,
    pub status: Status,
    pub bytes_sent: u64,
}

impl<'a> std::fmt::Display for AccessEntry<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - - {} \"{} {} {}\" {} {}",
            self.client,
            ClfDate(self.time),
            LogEncoded(&self.request.method),
            LogEncoded(&self.request.target),
            LogEncoded(&self.request.protocol),
            self.status.code(),
            self.bytes_sent,
        )
    }
}

impl<'a> AccessEntry<'a> {
    pub fn log(&self) {
        tracing::info!(target: ACCESS_TARGET, "{}", self);
    }
}
