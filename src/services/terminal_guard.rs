//! Terminal attribute guard
//!
//! The guard owns the only destructive change this program makes to the
//! terminal device itself: disabling the native line-kill character (VKILL)
//! so that Ctrl-U reaches the prompt as a key press. It has two states,
//! [`GuardState::Unmodified`] and [`GuardState::Modified`], and moves between
//! them with [`TerminalGuard::enter`] and [`TerminalGuard::restore`], both of
//! which are idempotent.
//!
//! A signal handler cannot reach the guard value, so the first snapshot is
//! also published to a [`SignalRestore`] slot: an armed flag, the tty file
//! descriptor and a write-once copy of the attributes. The handler only ever
//! calls [`SignalRestore::restore_from_signal`], which is a single
//! `tcsetattr(2)` with no allocation.

use anyhow::{Context, Result};
use nix::sys::termios::{self, SetArg, SpecialCharacterIndices, Termios};
use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::OnceLock;

/// Path of the controlling terminal
pub const TTY_PATH: &str = "/dev/tty";

/// Handler-readable copy of the saved terminal attributes.
///
/// Written once, before the first modification; afterwards only the armed
/// flag changes.
pub struct SignalRestore {
    armed: AtomicBool,
    fd: AtomicI32,
    snapshot: OnceLock<libc::termios>,
}

impl SignalRestore {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            fd: AtomicI32::new(-1),
            snapshot: OnceLock::new(),
        }
    }

    fn saved(&self) -> Option<Termios> {
        self.snapshot.get().map(|raw| Termios::from(*raw))
    }

    fn save(&self, fd: RawFd, snapshot: &Termios) {
        let raw: libc::termios = snapshot.clone().into();
        if self.snapshot.set(raw).is_ok() {
            self.fd.store(fd, Ordering::SeqCst);
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// True while the terminal is modified and a restore is pending
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Reapply the saved attributes if the terminal is currently modified.
    ///
    /// Async-signal-safe: atomics plus one `tcsetattr` call.
    pub fn restore_from_signal(&self) {
        if !self.armed.swap(false, Ordering::SeqCst) {
            return;
        }
        let fd = self.fd.load(Ordering::SeqCst);
        if let Some(snapshot) = self.snapshot.get() {
            // SAFETY: fd stays open for as long as the owning guard lives and
            // the guard disarms the slot before closing it; snapshot points to
            // an initialized termios.
            unsafe {
                libc::tcsetattr(fd, libc::TCSANOW, snapshot);
            }
        }
    }
}

impl Default for SignalRestore {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide slot used by the signal handler and the panic hook
pub static TERMINAL_RESTORE: SignalRestore = SignalRestore::new();

/// Guard state
#[derive(Debug, Clone)]
pub enum GuardState {
    Unmodified,
    Modified(Termios),
}

/// Owns the terminal device while the prompt is in control of it.
pub struct TerminalGuard {
    tty: File,
    state: GuardState,
    slot: &'static SignalRestore,
}

impl TerminalGuard {
    /// Open the controlling terminal and guard it through the process-wide slot.
    pub fn open() -> Result<Self> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open(TTY_PATH)
            .with_context(|| format!("Failed to open {}", TTY_PATH))?;
        Ok(Self::with_device(tty, &TERMINAL_RESTORE))
    }

    /// Guard an already open terminal device, publishing to `slot`.
    pub fn with_device(tty: File, slot: &'static SignalRestore) -> Self {
        Self {
            tty,
            state: GuardState::Unmodified,
            slot,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn is_modified(&self) -> bool {
        matches!(self.state, GuardState::Modified(_))
    }

    /// Snapshot the terminal (first call only) and disable the line-kill
    /// character. No-op when already modified.
    pub fn enter(&mut self) -> Result<()> {
        if self.is_modified() {
            return Ok(());
        }

        let snapshot = match self.slot.saved() {
            Some(snapshot) => snapshot,
            None => {
                let snapshot =
                    termios::tcgetattr(&self.tty).context("Failed to read terminal attributes")?;
                self.slot.save(self.tty.as_raw_fd(), &snapshot);
                snapshot
            }
        };

        let mut modified =
            termios::tcgetattr(&self.tty).context("Failed to read terminal attributes")?;
        modified.control_chars[SpecialCharacterIndices::VKILL as usize] = libc::_POSIX_VDISABLE;

        self.slot.arm();
        termios::tcsetattr(&self.tty, SetArg::TCSANOW, &modified)
            .context("Failed to disable the terminal line-kill character")?;

        self.state = GuardState::Modified(snapshot);
        tracing::debug!("Terminal guard entered (VKILL disabled)");
        Ok(())
    }

    /// Reapply the snapshot. No-op when unmodified.
    pub fn restore(&mut self) -> Result<()> {
        let GuardState::Modified(snapshot) = &self.state else {
            return Ok(());
        };

        termios::tcsetattr(&self.tty, SetArg::TCSANOW, snapshot)
            .context("Failed to restore terminal attributes")?;
        self.slot.disarm();
        self.state = GuardState::Unmodified;
        tracing::debug!("Terminal guard restored");
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("{:#}", e);
        }
        self.slot.disarm();
    }
}

/// Restore the terminal without access to the guard (panic hook).
pub fn emergency_restore() {
    TERMINAL_RESTORE.restore_from_signal();
}
