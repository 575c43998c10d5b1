use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// File served for the root and its aliases.
pub const INDEX_NAME: &str = "/index.html";
/// Targets rewritten to INDEX_NAME.
pub const INDEX_ALIASES: &[&str] = &["/", "/inside/"];
/// Size of the buffer a request is read into. One byte is held back, so a single read returns at
/// most `MAX_REQUEST_LENGTH - 1` bytes.
pub const MAX_REQUEST_LENGTH: usize = 1024;
/// Size of the chunks a file body is streamed in.
pub const CHUNK_SIZE: usize = 4096;

const DEFAULT_WWWROOT: &str = "./www";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Document root, without a trailing slash.
    pub wwwroot: String,
    /// How long to wait for each request before closing the connection.
    pub idle_timeout: Duration,
    /// Upper bound on how long the accept loop takes to notice a shutdown request.
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            wwwroot: DEFAULT_WWWROOT.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Config {
    pub fn from_command_line() -> Result<Self> {
        Self::from_args(std::env::args())
    }

    /// Parse `argv0 port`.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut args = args.into_iter();
        let name = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        let port = match args.next().as_deref() {
            Some("--help") => {
                usage(&name);
                std::process::exit(0);
            }
            Some(port) => port
                .parse()
                .with_context(|| format!("port number {} is invalid", port))?,
            None => {
                usage(&name);
                return Err(anyhow!("missing port number"));
            }
        };
        if let Some(arg) = args.next() {
            return Err(anyhow!("unknown argument `{}'", arg));
        }
        Ok(Self {
            port,
            ..Default::default()
        })
    }

    /// Set the document root, stripping any ending slash.
    pub fn with_wwwroot(mut self, wwwroot: &str) -> Self {
        self.wwwroot = wwwroot.trim_end_matches('/').to_string();
        self
    }
}

fn usage(argv0: &str) {
    print!(
        "usage:\t{} port\n\n\
        \tServes GET requests for files under {} on the given port.\n\
        \tPass 0 to let the system choose any free port for you.\n\n",
        argv0, DEFAULT_WWWROOT,
    );
}
