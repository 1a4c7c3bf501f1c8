//! Termination handling for the driver process
//!
//! SIGTERM, SIGINT and SIGHUP no longer kill the driver outright. The handler
//! records the request and forwards SIGTERM to the process group of the stage
//! that is currently running. The runner then reaps that stage and the
//! workflow unwinds through its normal error path, which drops the temporary
//! build directory.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Once;

use crate::error::{BuilderError, Result};

static REQUESTED: AtomicBool = AtomicBool::new(false);

/// Process group of the running stage, 0 when none
static FOREGROUND_GROUP: AtomicI32 = AtomicI32::new(0);

static INSTALL: Once = Once::new();

const SIGNALS: [i32; 3] = [
    signal_hook::consts::SIGTERM,
    signal_hook::consts::SIGINT,
    signal_hook::consts::SIGHUP,
];

/// Install the handlers; later calls are no-ops
pub fn install_handlers() -> Result<()> {
    let mut outcome = Ok(());
    INSTALL.call_once(|| {
        for signal in SIGNALS {
            // The handler only touches atomics and calls kill(2), both async-signal-safe.
            let registered = unsafe { signal_hook::low_level::register(signal, on_signal) };
            if let Err(e) = registered {
                outcome = Err(BuilderError::Io(e));
                return;
            }
        }
        tracing::debug!("termination handlers installed");
    });
    outcome
}

fn on_signal() {
    REQUESTED.store(true, Ordering::SeqCst);
    let group = FOREGROUND_GROUP.load(Ordering::SeqCst);
    if group > 0 {
        unsafe {
            libc::kill(-group, libc::SIGTERM);
        }
    }
}

/// Whether a termination signal has arrived
pub fn requested() -> bool {
    REQUESTED.load(Ordering::SeqCst)
}

/// Fail with [`BuilderError::Interrupted`] once termination was requested
pub fn check(step: &str) -> Result<()> {
    if requested() {
        return Err(BuilderError::Interrupted(step.to_string()));
    }
    Ok(())
}

/// Marks a process group as the target for forwarded signals while alive
pub(crate) struct ForegroundGroup;

impl ForegroundGroup {
    pub(crate) fn enter(pgid: u32) -> Self {
        FOREGROUND_GROUP.store(i32::try_from(pgid).unwrap_or(0), Ordering::SeqCst);
        // A signal that raced the spawn found no group to forward to
        if requested() && pgid > 0 {
            signal_group(pgid, libc::SIGTERM);
        }
        ForegroundGroup
    }
}

impl Drop for ForegroundGroup {
    fn drop(&mut self) {
        FOREGROUND_GROUP.store(0, Ordering::SeqCst);
    }
}

/// Send `signal` to every process in group `pgid`
pub(crate) fn signal_group(pgid: u32, signal: i32) {
    if let Ok(group) = i32::try_from(pgid) {
        if group > 0 {
            unsafe {
                libc::kill(-group, signal);
            }
        }
    }
}
