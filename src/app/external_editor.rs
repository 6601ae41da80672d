//! Round trip of the buffer through an external full-screen editor.
//!
//! The buffer is written to a fresh `jot_edit_XXXXXX` file in the scratch
//! directory, the terminal is handed to the editor command, and on a clean
//! exit the file's contents replace the buffer. The temp file never outlives
//! one round trip.

use crate::model::buffer::LineBuffer;
use crate::services::signal_handler::{self, KeyboardSignalsIgnored};
use std::fmt;
use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Prefix of the round-trip temp file
pub const TEMP_FILE_PREFIX: &str = "jot_edit_";

const DEFAULT_SHELL: &str = "/bin/sh";

/// Explicit transfer of the terminal device to the editor and back.
pub trait TerminalOwnership {
    /// Put the terminal back the way the user had it
    fn release(&mut self) -> anyhow::Result<()>;
    /// Take the terminal back for interactive editing
    fn reacquire(&mut self) -> anyhow::Result<()>;
}

/// Why a round trip failed. Every variant is fatal to the session.
#[derive(Debug)]
pub enum HandoffError {
    /// Creating or writing the temp file failed
    TempFile(io::Error),
    /// The editor process could not be started
    Spawn(io::Error),
    /// The editor exited with a non-zero status
    ExitStatus(i32),
    /// The editor was killed by a signal
    Signaled(i32),
    /// The edited file could not be read back as text
    ReadBack(io::Error),
    /// Handing the terminal over (or taking it back) failed
    Terminal(anyhow::Error),
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffError::TempFile(e) => write!(f, "cannot prepare temp file: {e}"),
            HandoffError::Spawn(e) => write!(f, "cannot launch editor: {e}"),
            HandoffError::ExitStatus(code) => write!(f, "editor exited with status {code}"),
            HandoffError::Signaled(signal) => write!(f, "editor killed by signal {signal}"),
            HandoffError::ReadBack(e) => write!(f, "cannot read back edited text: {e}"),
            HandoffError::Terminal(e) => write!(f, "terminal handoff failed: {e:#}"),
        }
    }
}

impl std::error::Error for HandoffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandoffError::TempFile(e) | HandoffError::Spawn(e) | HandoffError::ReadBack(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

/// Configured external editor
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
    scratch_dir: PathBuf,
    shell: PathBuf,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            scratch_dir: scratch_dir.into(),
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }

    /// Use a different shell to interpret the editor command
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Edit `buffer` in the external editor.
    ///
    /// On success the buffer holds exactly the saved file contents with the
    /// cursor at the end, and the terminal has been reacquired. On failure the
    /// buffer is untouched and the terminal is left released.
    pub fn round_trip(
        &self,
        buffer: &mut LineBuffer,
        terminal: &mut dyn TerminalOwnership,
    ) -> Result<(), HandoffError> {
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&self.scratch_dir)
            .map_err(HandoffError::TempFile)?;
        file.write_all(buffer.text().as_bytes())
            .and_then(|()| file.flush())
            .map_err(HandoffError::TempFile)?;

        // Close our handle; the path is removed when `path` drops.
        let path = file.into_temp_path();
        tracing::debug!(path = %path.display(), bytes = buffer.len(), "Wrote handoff file");

        terminal.release().map_err(HandoffError::Terminal)?;

        let edited = self.launch(&path).and_then(|()| read_back(&path));

        if let Err(e) = path.close() {
            tracing::warn!("Failed to remove handoff file: {}", e);
        }

        let text = edited?;
        buffer.replace_all(text);
        terminal.reacquire().map_err(HandoffError::Terminal)?;
        tracing::info!(bytes = buffer.len(), "External edit applied");
        Ok(())
    }

    /// Run the editor on `path` and wait for it.
    ///
    /// The command goes through `sh -c '<editor> "$1"'` so editor values with
    /// arguments work and the path is passed as a single word. SIGINT and
    /// SIGQUIT go to the editor only; we ignore them until it exits.
    fn launch(&self, path: &Path) -> Result<(), HandoffError> {
        tracing::info!(editor = %self.command, "Launching external editor");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(format!("{} \"$1\"", self.command))
            .arg("jot")
            .arg(path);
        // SAFETY: the hook only calls sigaction, which is async-signal-safe.
        unsafe {
            cmd.pre_exec(signal_handler::reset_keyboard_signals);
        }

        let status = {
            let _ignored = KeyboardSignalsIgnored::new().map_err(HandoffError::Spawn)?;
            cmd.status().map_err(HandoffError::Spawn)?
        };

        if status.success() {
            return Ok(());
        }
        match (status.code(), status.signal()) {
            (Some(code), _) => Err(HandoffError::ExitStatus(code)),
            (None, Some(signal)) => Err(HandoffError::Signaled(signal)),
            (None, None) => Err(HandoffError::ExitStatus(-1)),
        }
    }
}

fn read_back(path: &Path) -> Result<String, HandoffError> {
    let bytes = std::fs::read(path).map_err(HandoffError::ReadBack)?;
    String::from_utf8(bytes)
        .map_err(|e| HandoffError::ReadBack(io::Error::new(io::ErrorKind::InvalidData, e)))
}
