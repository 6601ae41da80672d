//! Terminal mode management for the prompt
//!
//! This module handles enabling and disabling the modes the prompt needs
//! while it reads keys:
//! - Raw mode
//! - Bracketed paste
//!
//! `TerminalModes` tracks which modes were enabled so that `undo()` only
//! reverses what was actually turned on. It is safe to call more than once.

use anyhow::Result;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    terminal::{disable_raw_mode, enable_raw_mode},
    ExecutableCommand,
};
use std::io::Write;

/// Tracks which terminal modes have been enabled.
#[derive(Debug, Default)]
pub struct TerminalModes {
    raw_mode: bool,
    bracketed_paste: bool,
}

impl TerminalModes {
    /// Create a new TerminalModes with nothing enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable raw mode and bracketed paste, writing escape sequences to `out`.
    ///
    /// Raw mode is required; bracketed paste is best effort.
    pub fn enable(&mut self, out: &mut dyn Write) -> Result<()> {
        if !self.raw_mode {
            if let Err(e) = enable_raw_mode() {
                tracing::error!("Failed to enable raw mode: {}", e);
                return Err(e.into());
            }
            self.raw_mode = true;
            tracing::debug!("Enabled raw mode");
        }

        if !self.bracketed_paste {
            if let Err(e) = out.execute(EnableBracketedPaste) {
                tracing::warn!("Failed to enable bracketed paste: {}", e);
            } else {
                self.bracketed_paste = true;
                tracing::debug!("Enabled bracketed paste mode");
            }
        }

        Ok(())
    }

    /// Disable every mode that `enable()` turned on.
    pub fn undo(&mut self, out: &mut dyn Write) {
        if self.bracketed_paste {
            let _ = out.execute(DisableBracketedPaste);
            self.bracketed_paste = false;
            tracing::debug!("Disabled bracketed paste");
        }

        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
            tracing::debug!("Disabled raw mode");
        }

        let _ = out.flush();
    }

    /// Returns true if raw mode is enabled.
    pub fn raw_mode_enabled(&self) -> bool {
        self.raw_mode
    }

    /// Returns true if bracketed paste is enabled.
    pub fn bracketed_paste_enabled(&self) -> bool {
        self.bracketed_paste
    }
}

/// Unconditionally leave raw mode without tracking (panic hook).
pub fn emergency_cleanup() {
    let _ = disable_raw_mode();
}
