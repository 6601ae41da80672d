// Drives a `Session` with key events the way the prompt loop does

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use jot::app::external_editor::{ExternalEditor, HandoffError, TerminalOwnership};
use jot::app::{Flow, Outcome, Session};
use jot::config::EditingMode;
use jot::input::action::EditMode;
use jot::model::buffer::LineBuffer;
use std::path::Path;

/// Records terminal handoffs instead of touching a real terminal
#[derive(Debug, Default)]
pub struct FakeTerminal {
    pub released: usize,
    pub reacquired: usize,
}

impl TerminalOwnership for FakeTerminal {
    fn release(&mut self) -> anyhow::Result<()> {
        self.released += 1;
        Ok(())
    }

    fn reacquire(&mut self) -> anyhow::Result<()> {
        self.reacquired += 1;
        Ok(())
    }
}

pub struct PromptHarness {
    session: Session,
    pub terminal: FakeTerminal,
    /// Bells rung so far
    pub bells: usize,
    /// Flow returned by the last key
    pub last_flow: Flow,
}

impl PromptHarness {
    pub fn new(text: &str, cursor: usize, mode: EditingMode) -> Self {
        Self::with_editor(
            text,
            cursor,
            mode,
            ExternalEditor::new("true", std::env::temp_dir()),
        )
    }

    pub fn emacs(text: &str, cursor: usize) -> Self {
        Self::new(text, cursor, EditingMode::Emacs)
    }

    /// Vi session switched to command mode with the cursor on `cursor`
    pub fn vi_command(text: &str, cursor: usize) -> Self {
        // Esc steps back one character, so start insert mode one to the right
        let start = match text[cursor..].chars().next() {
            Some(c) if c != '\n' => cursor + c.len_utf8(),
            _ => cursor,
        };
        let mut harness = Self::new(text, start, EditingMode::Vi);
        harness.key(KeyCode::Esc, KeyModifiers::NONE);
        harness
    }

    pub fn with_editor(text: &str, cursor: usize, mode: EditingMode, editor: ExternalEditor) -> Self {
        Self {
            session: Session::new(LineBuffer::with_cursor(text, cursor), mode, editor),
            terminal: FakeTerminal::default(),
            bells: 0,
            last_flow: Flow::Continue,
        }
    }

    /// Editor command run through the shell against `scratch_dir`
    pub fn with_shell_editor(text: &str, command: &str, scratch_dir: &Path) -> Self {
        Self::with_editor(
            text,
            text.len(),
            EditingMode::Emacs,
            ExternalEditor::new(command, scratch_dir),
        )
    }

    pub fn try_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<Outcome, HandoffError> {
        let outcome = self
            .session
            .handle_key(KeyEvent::new(code, modifiers), &mut self.terminal)?;
        if outcome.bell {
            self.bells += 1;
        }
        self.last_flow = outcome.flow;
        Ok(outcome)
    }

    pub fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Outcome {
        self.try_key(code, modifiers).unwrap()
    }

    pub fn ctrl(&mut self, c: char) -> Outcome {
        self.key(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn alt(&mut self, c: char) -> Outcome {
        self.key(KeyCode::Char(c), KeyModifiers::ALT)
    }

    pub fn enter(&mut self) -> Outcome {
        self.key(KeyCode::Enter, KeyModifiers::NONE)
    }

    /// Type each character as a plain key press (uppercase with SHIFT)
    pub fn type_keys(&mut self, keys: &str) {
        for c in keys.chars() {
            let modifiers = if c.is_ascii_uppercase() {
                KeyModifiers::SHIFT
            } else {
                KeyModifiers::NONE
            };
            self.key(KeyCode::Char(c), modifiers);
        }
    }

    pub fn paste(&mut self, text: &str) {
        self.session.handle_paste(text);
    }

    pub fn text(&self) -> &str {
        self.session.buffer().text()
    }

    pub fn cursor(&self) -> usize {
        self.session.buffer().cursor()
    }

    pub fn mode(&self) -> EditMode {
        self.session.mode()
    }

    pub fn into_text(self) -> String {
        self.session.into_buffer().into_text()
    }
}
