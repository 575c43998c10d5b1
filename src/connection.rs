//! One client connection: read a request, reply, and repeat while keep-alive allows.

use std::io::{self, Read};
use std::net::{IpAddr, TcpStream};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::config::{Config, MAX_REQUEST_LENGTH};
use crate::error::RequestError;
use crate::file::ResolvedFile;
use crate::log::AccessEntry;
use crate::request::Request;
use crate::status::{self, Status};

/// Why a connection ended without an error on the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Client closed its end.
    PeerClosed,
    /// No request arrived within the idle timeout.
    IdleTimeout,
    /// An error reply was sent.
    Rejected(RequestError),
    /// An HTTP/1.0 request was served.
    Completed,
}

pub struct Connection {
    socket: TcpStream,
    client: IpAddr,
    config: Arc<Config>,
}

impl Connection {
    pub fn new(socket: TcpStream, client: IpAddr, config: Arc<Config>) -> Self {
        Self {
            socket,
            client,
            config,
        }
    }

    /// Serve requests until the connection ends, then close the socket.
    pub fn serve(mut self) {
        match self.run() {
            Ok(Outcome::IdleTimeout) => {
                info!(client = %self.client, "timeout, closing connection")
            }
            Ok(outcome) => debug!(client = %self.client, ?outcome, "closing connection"),
            Err(e) => warn!(client = %self.client, "connection failed: {}", e),
        }
        // self.socket is dropped here, the only place it gets closed.
    }

    fn run(&mut self) -> io::Result<Outcome> {
        let mut buf = [0; MAX_REQUEST_LENGTH];
        loop {
            // The deadline applies to each request, not the whole connection.
            self.socket
                .set_read_timeout(Some(self.config.idle_timeout))?;
            let received = match self.socket.read(&mut buf[..MAX_REQUEST_LENGTH - 1]) {
                Ok(0) => return Ok(Outcome::PeerClosed),
                Ok(received) => received,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Ok(Outcome::IdleTimeout)
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            let request = match Request::parse(&buf[..received]) {
                Ok(request) => request,
                Err(e) => {
                    status::write_error(&mut self.socket, e.status())?;
                    return Ok(Outcome::Rejected(e));
                }
            };
            info!(
                client = %self.client,
                "request: {} {} {}", request.method, request.target, request.protocol
            );

            if let Err(e) = self.respond(&request)? {
                return Ok(Outcome::Rejected(e));
            }

            if !request.version.keep_alive() {
                return Ok(Outcome::Completed);
            }
        }
    }

    /// Validate, resolve and send one reply.
    ///
    /// The outer error is a socket failure; the inner one a request that got an error reply.
    fn respond(&mut self, request: &Request) -> io::Result<Result<(), RequestError>> {
        let resolved = request
            .validate()
            .and_then(|()| ResolvedFile::open(&self.config.wwwroot, &request.target));
        let file = match resolved {
            Ok(file) => file,
            Err(e) => {
                let sent = status::write_error(&mut self.socket, e.status())?;
                self.log_access(request, e.status(), sent as u64);
                return Ok(Err(e));
            }
        };

        let header_len =
            status::write_file_header(&mut self.socket, file.content_type(), file.content_length())?;
        let body_len = file.send_to(&mut self.socket)?;
        self.log_access(request, Status::Ok, header_len as u64 + body_len);
        Ok(Ok(()))
    }

    fn log_access(&self, request: &Request, status: Status, bytes_sent: u64) {
        AccessEntry {
            client: self.client,
            time: SystemTime::now(),
            request,
            status,
            bytes_sent,
        }
        .log();
    }
}
