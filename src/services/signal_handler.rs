//! Termination signal handling
//!
//! SIGINT, SIGTERM, SIGHUP and SIGQUIT restore the terminal through the
//! process-wide [`TERMINAL_RESTORE`] slot, reset the signal to its default
//! disposition and raise it again, so the parent shell observes an ordinary
//! signal death with its terminal left intact.
//!
//! The handler must stay async-signal-safe: no logging, no allocation, no
//! locks, and no calls into the editing code.
//!
//! While an external editor owns the terminal, SIGINT and SIGQUIT are
//! ignored here and left to the child, the same way `system(3)` does it.

use crate::services::terminal_guard::TERMINAL_RESTORE;
use anyhow::{Context, Result};
use nix::sys::signal::{raise, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::io;

/// Signals that end the session
pub const TERMINATION_SIGNALS: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGHUP,
    Signal::SIGQUIT,
];

extern "C" fn restore_and_reraise(signum: libc::c_int) {
    TERMINAL_RESTORE.restore_from_signal();

    match Signal::try_from(signum) {
        Ok(signal) => {
            let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
            // SAFETY: installing SIG_DFL is always sound.
            unsafe {
                let _ = sigaction(signal, &default);
            }
            let _ = raise(signal);
        }
        // SAFETY: _exit is async-signal-safe.
        Err(_) => unsafe { libc::_exit(128 + signum) },
    }
}

/// Install the restoring handler for every termination signal.
pub fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(restore_and_reraise),
        SaFlags::empty(),
        SigSet::empty(),
    );

    for signal in TERMINATION_SIGNALS {
        // SAFETY: the handler only touches atomics and async-signal-safe libc calls.
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("Failed to install {} handler", signal))?;
    }

    tracing::debug!("Installed termination signal handlers");
    Ok(())
}

/// Keyboard signals that belong to a foreground child while it runs
pub const CHILD_KEYBOARD_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// Ignores [`CHILD_KEYBOARD_SIGNALS`] until dropped, then puts the previous
/// actions back.
pub struct KeyboardSignalsIgnored {
    saved: Vec<(Signal, SigAction)>,
}

impl KeyboardSignalsIgnored {
    pub fn new() -> io::Result<Self> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let mut guard = Self {
            saved: Vec::with_capacity(CHILD_KEYBOARD_SIGNALS.len()),
        };
        for signal in CHILD_KEYBOARD_SIGNALS {
            // SAFETY: SIG_IGN has no handler code to run.
            let previous = unsafe { sigaction(signal, &ignore) }?;
            guard.saved.push((signal, previous));
        }
        Ok(guard)
    }
}

impl Drop for KeyboardSignalsIgnored {
    fn drop(&mut self) {
        for (signal, previous) in self.saved.drain(..).rev() {
            // SAFETY: reinstalls an action that was installed before.
            if let Err(e) = unsafe { sigaction(signal, &previous) } {
                tracing::warn!("Failed to restore {} action: {}", signal, e);
            }
        }
    }
}

/// Give the keyboard signals their default action again.
///
/// Meant for `CommandExt::pre_exec`: an ignored signal stays ignored across
/// `exec`, so the child would otherwise inherit our `SIG_IGN`. Only calls
/// `sigaction`, which is async-signal-safe.
pub fn reset_keyboard_signals() -> io::Result<()> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for signal in CHILD_KEYBOARD_SIGNALS {
        // SAFETY: installing SIG_DFL is always sound.
        unsafe { sigaction(signal, &default) }?;
    }
    Ok(())
}

/// End the process the way an unhandled SIGINT would.
///
/// Used when Ctrl-C arrives as a key press in raw mode. The caller must have
/// already restored the terminal.
pub fn raise_interrupt() -> Result<()> {
    raise(Signal::SIGINT).context("Failed to raise SIGINT")?;
    Ok(())
}

/// Run `child` in a forked process and wait for it. The closure's return
/// value is the child's exit status.
#[cfg(test)]
pub(crate) fn run_forked(child: impl FnOnce() -> i32) -> nix::sys::wait::WaitStatus {
    use nix::unistd::{fork, ForkResult};

    // SAFETY: the child only runs `child` and then leaves through _exit.
    match unsafe { fork() }.expect("fork") {
        ForkResult::Child => {
            let code = std::panic::catch_unwind(std::panic::AssertUnwindSafe(child)).unwrap_or(101);
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => nix::sys::wait::waitpid(child, None).expect("waitpid"),
    }
}
