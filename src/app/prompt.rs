//! Interactive prompt loop
//!
//! Owns the terminal for the interactive phase: the [`TerminalGuard`] for the
//! line-kill character, [`TerminalModes`] for raw mode and bracketed paste,
//! and the output stream the prompt is drawn on. When stdout is not a
//! terminal the prompt is drawn on `/dev/tty` so the accepted text can still
//! go to the original stdout.

use crate::app::external_editor::TerminalOwnership;
use crate::app::session::{Flow, Session};
use crate::services::terminal_guard::{TerminalGuard, TTY_PATH};
use crate::services::terminal_modes::TerminalModes;
use crate::view::prompt_view::PromptView;
use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal, Write};

const FALLBACK_WIDTH: u16 = 80;

/// How the interactive phase ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Accepted(String),
    Interrupted,
}

/// The terminal as seen by the prompt
pub struct PromptTerminal {
    guard: TerminalGuard,
    modes: TerminalModes,
    out: Box<dyn Write>,
    /// Set when someone else drew on the screen since the last redraw
    stale_origin: bool,
}

impl PromptTerminal {
    /// Open the controlling terminal and pick the output stream
    pub fn open() -> Result<Self> {
        let guard = TerminalGuard::open()?;
        let out: Box<dyn Write> = if io::stdout().is_terminal() {
            Box::new(io::stdout())
        } else {
            tracing::debug!("stdout is not a terminal, drawing on {}", TTY_PATH);
            let tty = OpenOptions::new()
                .write(true)
                .open(TTY_PATH)
                .with_context(|| format!("Failed to open {} for output", TTY_PATH))?;
            Box::new(tty)
        };

        Ok(Self {
            guard,
            modes: TerminalModes::new(),
            out,
            stale_origin: false,
        })
    }

    /// Disable the line-kill character, then enter raw mode
    pub fn enter(&mut self) -> Result<()> {
        self.guard.enter()?;
        self.modes.enable(&mut *self.out)?;
        Ok(())
    }

    /// Leave raw mode, then put the saved attributes back
    pub fn leave(&mut self) -> Result<()> {
        self.modes.undo(&mut *self.out);
        self.guard.restore()
    }

    fn width() -> u16 {
        crossterm::terminal::size()
            .map(|(cols, _)| cols)
            .unwrap_or(FALLBACK_WIDTH)
    }
}

impl TerminalOwnership for PromptTerminal {
    fn release(&mut self) -> Result<()> {
        tracing::debug!("Releasing terminal to external editor");
        self.leave()
    }

    fn reacquire(&mut self) -> Result<()> {
        tracing::debug!("Reacquiring terminal");
        self.stale_origin = true;
        self.enter()
    }
}

impl Drop for PromptTerminal {
    fn drop(&mut self) {
        self.modes.undo(&mut *self.out);
    }
}

/// Run the interactive prompt until the session accepts or is interrupted.
///
/// The terminal is back in its original state when this returns, whether it
/// returns an error or not.
pub fn run(session: Session, banner: &str, bell: bool) -> Result<PromptResult> {
    let mut terminal = PromptTerminal::open()?;

    if !banner.is_empty() {
        writeln!(terminal.out, "{banner}").context("Failed to print banner")?;
    }

    terminal.enter()?;
    let result = event_loop(session, &mut terminal, bell);
    let left = terminal.leave();
    let result = result?;
    left?;
    Ok(result)
}

fn event_loop(
    mut session: Session,
    terminal: &mut PromptTerminal,
    bell: bool,
) -> Result<PromptResult> {
    let mut view = PromptView::new();

    loop {
        if std::mem::take(&mut terminal.stale_origin) {
            view = PromptView::new();
        }
        view.render(&mut *terminal.out, session.buffer(), PromptTerminal::width())
            .context("Failed to draw prompt")?;

        let outcome = match event::read().context("Failed to read terminal input")? {
            Event::Key(key) => session.handle_key(key, terminal)?,
            Event::Paste(text) => session.handle_paste(&text),
            _ => continue,
        };

        if outcome.bell && bell {
            view.bell(&mut *terminal.out)?;
        }

        match outcome.flow {
            Flow::Continue => {}
            Flow::Accept => {
                view.render(&mut *terminal.out, session.buffer(), PromptTerminal::width())?;
                view.finish(&mut *terminal.out)?;
                let text = session.into_buffer().into_text();
                tracing::info!(bytes = text.len(), "Input accepted");
                return Ok(PromptResult::Accepted(text));
            }
            Flow::Interrupt => {
                view.finish(&mut *terminal.out)?;
                tracing::info!("Input interrupted");
                return Ok(PromptResult::Interrupted);
            }
        }
    }
}
