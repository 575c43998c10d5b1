use anyhow::Result;
use tracing::info;

use gethttpd::{log, signal, Config, Server, ShutdownFlag};

static SHUTDOWN: ShutdownFlag = ShutdownFlag::new();

extern "C" fn stop_running(_signal: libc::c_int) {
    SHUTDOWN.request();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log::env_filter())
        .with_target(false)
        .with_level(true)
        .init();

    info!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::from_command_line()?;
    let server = Server::bind(config)?;
    signal::install(stop_running)?;

    server.run(&SHUTDOWN)
}
