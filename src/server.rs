//! The accept loop.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener};
use std::os::unix::io::AsRawFd;
use std::sync::Arc;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::select::{select, FdSet};
use nix::sys::time::TimeVal;
use tracing::{info, warn};

use crate::config::Config;
use crate::connection::Connection;
use crate::signal::{self, ShutdownFlag};

pub struct Server {
    listener: TcpListener,
    config: Arc<Config>,
}

impl Server {
    /// Initialize the TcpListener. This is the socket that we accept connections from.
    pub fn bind(config: Config) -> Result<Self> {
        let socket_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port));
        // Sets `SO_REUSEADDR` implicitly.
        let listener = TcpListener::bind(socket_addr)
            .with_context(|| format!("failed to create listening socket for {}", socket_addr))?;
        // Readiness comes from select(), so a connection reset before accept() mustn't block.
        listener
            .set_nonblocking(true)
            .context("failed to make listening socket non-blocking")?;
        let server = Self {
            listener,
            config: Arc::new(config),
        };
        info!(
            "listening on: http://{}/, serving {}",
            server.local_addr()?,
            server.config.wwwroot
        );
        Ok(server)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to get listening address")
    }

    /// Accept connections until `shutdown` is requested, handing each one to its own thread.
    ///
    /// Handlers still running when this returns are left to finish on their own.
    pub fn run(self, shutdown: &ShutdownFlag) -> Result<()> {
        while !shutdown.is_requested() {
            if self.wait_readable()? {
                self.accept_connection(shutdown);
            }
        }
        info!("shutting down, no longer accepting connections");
        // The listener is closed when self is dropped.
        Ok(())
    }

    /// Wait up to the poll interval for a pending connection.
    ///
    /// Returns false on timeout or when interrupted by a signal.
    fn wait_readable(&self) -> Result<bool> {
        let mut recv_set = FdSet::new();
        recv_set.insert(self.listener.as_raw_fd());
        let interval = self.config.poll_interval;
        let mut timeout = TimeVal::from(libc::timeval {
            tv_sec: interval.as_secs() as libc::time_t,
            tv_usec: interval.subsec_micros() as libc::suseconds_t,
        });
        match select(None, Some(&mut recv_set), None, None, Some(&mut timeout)) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(e) if e.as_errno() == Some(Errno::EINTR) => Ok(false),
            Err(e) => Err(e).context("select() failed"),
        }
    }

    fn accept_connection(&self, shutdown: &ShutdownFlag) {
        let (stream, addr) = match self.listener.accept() {
            Ok((stream, addr)) => (stream, addr),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock
                ) =>
            {
                return
            }
            Err(e) => {
                warn!("accept() failed: {}", e);
                if matches!(e.raw_os_error(), Some(libc::EMFILE) | Some(libc::ENFILE)) {
                    // Give handlers a chance to release descriptors.
                    std::thread::sleep(self.config.poll_interval);
                }
                return;
            }
        };
        if shutdown.is_requested() {
            return;
        }
        // Some platforms hand out accepted sockets with the listener's O_NONBLOCK.
        if let Err(e) = stream.set_nonblocking(false) {
            warn!(client = %addr, "dropping connection: set_nonblocking failed: {}", e);
            return;
        }
        info!(client = %addr, "connection accepted");

        let config = Arc::clone(&self.config);
        let handler = move || Connection::new(stream, addr.ip(), config).serve();
        if let Err(e) = signal::spawn_detached(format!("conn-{}", addr), handler) {
            warn!(client = %addr, "dropping connection: {:#}", e);
        }
    }
}
