//! Shutdown flag and the signal plumbing that sets it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result};
use nix::sys::signal::{
    pthread_sigmask, sigaction, signal, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow,
    Signal,
};

/// Signals that request a graceful shutdown.
const SHUTDOWN_SIGNALS: &[Signal] = &[Signal::SIGINT, Signal::SIGTERM];

/// Set once to stop the accept loop. Never cleared.
#[derive(Debug, Default)]
pub struct ShutdownFlag(AtomicBool);

impl ShutdownFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Route SIGINT and SIGTERM to `handler` and ignore SIGPIPE.
///
/// SA_RESTART is left unset so blocking calls in the accepting thread return EINTR.
pub fn install(handler: extern "C" fn(libc::c_int)) -> Result<()> {
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }
        .context("failed to set SIGPIPE handler")?;
    let action = SigAction::new(
        SigHandler::Handler(handler),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for &sig in SHUTDOWN_SIGNALS {
        unsafe { sigaction(sig, &action) }
            .with_context(|| format!("failed to set {:?} handler", sig))?;
    }
    Ok(())
}

fn shutdown_sigset() -> SigSet {
    let mut set = SigSet::empty();
    for &sig in SHUTDOWN_SIGNALS {
        set.add(sig);
    }
    set
}

/// Spawn a detached thread that never receives shutdown signals.
///
/// The mask is inherited at creation, so it's applied around the spawn instead of inside the
/// thread.
pub fn spawn_detached<F>(name: String, f: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    let mut old_mask = SigSet::empty();
    pthread_sigmask(
        SigmaskHow::SIG_BLOCK,
        Some(&shutdown_sigset()),
        Some(&mut old_mask),
    )
    .context("failed to block shutdown signals")?;
    let spawned = thread::Builder::new().name(name).spawn(f);
    pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&old_mask), None)
        .context("failed to restore signal mask")?;
    // Dropping the handle detaches the thread.
    spawned.map(drop).context("failed to spawn thread")
}
