//! Editing session: buffer, mode and key dispatch
//!
//! A `Session` owns the buffer for the whole interactive phase. Each key is
//! resolved to one [`Action`] and applied through [`Session::dispatch`]; the
//! returned [`Outcome`] tells the front end whether to keep reading, accept
//! or abandon the input, and whether to ring the bell.

use crate::app::external_editor::{ExternalEditor, HandoffError, TerminalOwnership};
use crate::config::EditingMode;
use crate::input::action::{Action, EditMode};
use crate::input::keymap::{KeyResolver, Resolution};
use crate::model::buffer::{char_at, LineBuffer};
use crate::primitives::grapheme::{next_grapheme_boundary, prev_grapheme_boundary};
use crate::primitives::line_edit::{self, Edit};
use crate::primitives::line_navigation::{self as nav, LineTarget, Motion};
use crossterm::event::{KeyEvent, KeyEventKind};

/// Upper bound on a typed repeat count
pub const MAX_COUNT: usize = 100_000;

/// What the front end does after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The buffer is final
    Accept,
    /// The user interrupted; nothing is written
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub flow: Flow,
    /// A boundary or unbound key was hit
    pub bell: bool,
}

impl Outcome {
    fn proceed() -> Self {
        Self {
            flow: Flow::Continue,
            bell: false,
        }
    }

    fn bell() -> Self {
        Self {
            flow: Flow::Continue,
            bell: true,
        }
    }

    fn bell_if(boundary: bool) -> Self {
        if boundary {
            Self::bell()
        } else {
            Self::proceed()
        }
    }

    fn finish(flow: Flow) -> Self {
        Self { flow, bell: false }
    }
}

pub struct Session {
    buffer: LineBuffer,
    mode: EditMode,
    resolver: KeyResolver,
    count: Option<usize>,
    last_kill: Option<String>,
    editor: ExternalEditor,
}

impl Session {
    pub fn new(buffer: LineBuffer, editing_mode: EditingMode, editor: ExternalEditor) -> Self {
        Self {
            buffer,
            mode: EditMode::initial(editing_mode),
            resolver: KeyResolver::default(),
            count: None,
            last_kill: None,
            editor,
        }
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Repeat count typed so far, if any
    pub fn pending_count(&self) -> Option<usize> {
        self.count
    }

    /// Most recently killed text
    pub fn last_kill(&self) -> Option<&str> {
        self.last_kill.as_deref()
    }

    pub fn into_buffer(self) -> LineBuffer {
        self.buffer
    }

    /// Resolve and apply one key press
    pub fn handle_key(
        &mut self,
        event: KeyEvent,
        terminal: &mut dyn TerminalOwnership,
    ) -> Result<Outcome, HandoffError> {
        if event.kind == KeyEventKind::Release {
            return Ok(Outcome::proceed());
        }

        match self.resolver.feed(self.mode, &event) {
            Resolution::Action(action) => self.dispatch(action, terminal),
            Resolution::Pending => Ok(Outcome::proceed()),
            Resolution::Unbound => {
                tracing::debug!(?event, mode = self.mode.name(), "Unbound key");
                self.count = None;
                Ok(Outcome::bell())
            }
        }
    }

    /// Insert pasted text with line endings normalized to `\n`
    pub fn handle_paste(&mut self, text: &str) -> Outcome {
        self.resolver.reset();
        self.count = None;
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.buffer.insert_at_cursor(&normalized);
        Outcome::proceed()
    }

    /// Apply one action
    pub fn dispatch(
        &mut self,
        action: Action,
        terminal: &mut dyn TerminalOwnership,
    ) -> Result<Outcome, HandoffError> {
        if let Action::Digit(digit) = action {
            return Ok(self.push_digit(digit));
        }

        let count = self.count.take();
        let n = count.unwrap_or(1);
        tracing::trace!(?action, n, mode = self.mode.name(), "Dispatch");

        let outcome = match action {
            Action::InsertChar(c) => {
                let mut utf8 = [0u8; 4];
                self.insert_repeated(c.encode_utf8(&mut utf8), n)
            }
            Action::InsertNewline => self.insert_repeated("\n", n),
            Action::InsertTab => self.insert_repeated("\t", n),

            Action::MoveLeft => self.step(n, prev_grapheme_boundary),
            Action::MoveRight => self.step(n, next_grapheme_boundary),
            Action::DeleteBackward => self.delete_grapheme_before(n),
            Action::DeleteForward => self.delete_grapheme_after(n, false),
            Action::DeleteForwardOrAccept => {
                if self.buffer.cursor() >= self.buffer.len() {
                    tracing::debug!("Ctrl-D at end of buffer, accepting");
                    Outcome::finish(Flow::Accept)
                } else {
                    self.delete_grapheme_after(n, false)
                }
            }
            Action::ViDeleteChar => self.delete_grapheme_after(n, true),

            Action::MoveUp => {
                let motion = nav::move_up(self.buffer.text(), self.buffer.cursor(), n);
                self.apply_motion(motion)
            }
            Action::MoveDown => {
                let motion = nav::move_down(self.buffer.text(), self.buffer.cursor(), n);
                self.apply_motion(motion)
            }
            Action::MoveNextLineFirstNonBlank => {
                let motion =
                    nav::goto_first_nonblank_next_line(self.buffer.text(), self.buffer.cursor(), n);
                self.apply_motion(motion)
            }
            Action::MoveLineStart => self.jump(nav::beginning_of_line),
            Action::MoveLineEnd => self.jump(nav::end_of_line),
            Action::MoveFirstNonBlank => self.jump(nav::first_nonblank_of_line),
            Action::MoveBufferStart => self.jump(|text, _| nav::beginning_of_buffer(text)),
            Action::MoveBufferEnd => self.jump(|text, _| nav::end_of_buffer(text)),
            Action::GotoLastLine => {
                self.goto(count.map_or(LineTarget::Last, LineTarget::Number))
            }
            Action::GotoFirstLine => {
                self.goto(LineTarget::Number(count.unwrap_or(1)))
            }

            Action::KillToLineEnd => {
                let edit = line_edit::kill_to_end_of_line(&mut self.buffer);
                self.apply_edit(edit)
            }
            Action::KillToLineStart => {
                let edit = line_edit::kill_to_beginning_of_line(&mut self.buffer);
                self.apply_edit(edit)
            }
            Action::KillWholeLine => {
                let edit = line_edit::kill_whole_line(&mut self.buffer);
                self.apply_edit(edit)
            }
            Action::ViDeleteLines => {
                let edit = line_edit::vi_delete_lines(&mut self.buffer, n);
                self.apply_edit(edit)
            }
            Action::ViDeleteToLineEnd => {
                let edit = line_edit::vi_delete_to_end_of_line(&mut self.buffer, n);
                self.apply_edit(edit)
            }
            Action::JoinLines => {
                let edit = line_edit::join_lines(&mut self.buffer, n);
                self.apply_edit(edit)
            }
            Action::OpenLineBelow => {
                let edit = line_edit::insert_line_below(&mut self.buffer);
                self.apply_edit(edit)
            }
            Action::OpenLineAbove => {
                let edit = line_edit::insert_line_above(&mut self.buffer);
                self.apply_edit(edit)
            }
            Action::Yank => self.yank(),
            Action::Put => self.put(),

            Action::EnterInsert => self.enter_insert(self.buffer.cursor()),
            Action::EnterInsertAfter => {
                let pos = self.buffer.cursor();
                let after = match char_at(self.buffer.text(), pos) {
                    Some(c) if c != '\n' => next_grapheme_boundary(self.buffer.text(), pos),
                    _ => pos,
                };
                self.enter_insert(after)
            }
            Action::EnterInsertLineStart => {
                let pos = nav::beginning_of_line(self.buffer.text(), self.buffer.cursor());
                self.enter_insert(pos)
            }
            Action::EnterInsertLineEnd => {
                let pos = nav::end_of_line(self.buffer.text(), self.buffer.cursor());
                self.enter_insert(pos)
            }
            Action::EnterCommandMode => {
                let pos = self.buffer.cursor();
                if pos > nav::beginning_of_line(self.buffer.text(), pos) {
                    let back = prev_grapheme_boundary(self.buffer.text(), pos);
                    self.buffer.set_cursor(back);
                }
                self.set_mode(EditMode::ViCommand);
                Outcome::proceed()
            }

            Action::ExternalEditor => {
                self.editor.round_trip(&mut self.buffer, terminal)?;
                Outcome::proceed()
            }
            Action::Accept => Outcome::finish(Flow::Accept),
            Action::Interrupt => Outcome::finish(Flow::Interrupt),

            Action::Digit(_) => Outcome::proceed(),
        };

        Ok(outcome)
    }

    fn push_digit(&mut self, digit: u8) -> Outcome {
        if digit == 0 && self.count.is_none() && self.mode == EditMode::ViCommand {
            return self.jump(nav::beginning_of_line);
        }
        let count = self
            .count
            .unwrap_or(0)
            .saturating_mul(10)
            .saturating_add(usize::from(digit));
        self.count = Some(count.min(MAX_COUNT));
        Outcome::proceed()
    }

    fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            tracing::debug!(from = self.mode.name(), to = mode.name(), "Mode change");
            self.mode = mode;
        }
    }

    fn enter_insert(&mut self, pos: usize) -> Outcome {
        self.buffer.set_cursor(pos);
        self.set_mode(EditMode::ViInsert);
        Outcome::proceed()
    }

    fn insert_repeated(&mut self, text: &str, n: usize) -> Outcome {
        self.buffer.insert_at_cursor(&text.repeat(n));
        Outcome::proceed()
    }

    fn jump(&mut self, target: impl Fn(&str, usize) -> usize) -> Outcome {
        let pos = target(self.buffer.text(), self.buffer.cursor());
        self.buffer.set_cursor(pos);
        Outcome::proceed()
    }

    fn goto(&mut self, target: LineTarget) -> Outcome {
        let pos = nav::goto_line(self.buffer.text(), target);
        self.buffer.set_cursor(pos);
        Outcome::proceed()
    }

    fn step(&mut self, n: usize, next: fn(&str, usize) -> usize) -> Outcome {
        for _ in 0..n {
            let pos = self.buffer.cursor();
            let target = next(self.buffer.text(), pos);
            if target == pos {
                return Outcome::bell();
            }
            self.buffer.set_cursor(target);
        }
        Outcome::proceed()
    }

    fn apply_motion(&mut self, motion: Motion) -> Outcome {
        self.buffer.set_cursor(motion.position);
        Outcome::bell_if(motion.boundary)
    }

    fn apply_edit(&mut self, edit: Edit) -> Outcome {
        if let Some(killed) = edit.killed {
            self.last_kill = Some(killed);
        }
        if edit.enter_insert && self.mode == EditMode::ViCommand {
            self.set_mode(EditMode::ViInsert);
        }
        Outcome::bell_if(edit.boundary)
    }

    fn delete_grapheme_before(&mut self, n: usize) -> Outcome {
        for _ in 0..n {
            let pos = self.buffer.cursor();
            let start = prev_grapheme_boundary(self.buffer.text(), pos);
            if start == pos {
                return Outcome::bell();
            }
            self.buffer.delete(start..pos);
        }
        Outcome::proceed()
    }

    /// Delete `n` clusters under the cursor. `kill` keeps them for `p`.
    fn delete_grapheme_after(&mut self, n: usize, kill: bool) -> Outcome {
        let start = self.buffer.cursor();
        let mut end = start;
        for _ in 0..n {
            let next = next_grapheme_boundary(self.buffer.text(), end);
            if next == end || (kill && char_at(self.buffer.text(), end) == Some('\n')) {
                break;
            }
            end = next;
        }
        if end == start {
            return Outcome::bell();
        }
        let removed = self.buffer.delete(start..end);
        if kill {
            self.last_kill = Some(removed);
        }
        Outcome::proceed()
    }

    fn yank(&mut self) -> Outcome {
        match self.last_kill.clone() {
            Some(text) => {
                self.buffer.insert_at_cursor(&text);
                Outcome::proceed()
            }
            None => Outcome::bell(),
        }
    }

    /// vi `p`: whole lines go below the current line, anything else after
    /// the cursor.
    fn put(&mut self) -> Outcome {
        let Some(text) = self.last_kill.clone() else {
            return Outcome::bell();
        };
        let pos = self.buffer.cursor();

        if text.ends_with('\n') {
            let line_end = nav::end_of_line(self.buffer.text(), pos);
            if line_end < self.buffer.len() {
                self.buffer.insert(line_end + 1, &text);
                self.buffer.set_cursor(line_end + 1);
            } else {
                let body = text.trim_end_matches('\n');
                self.buffer.insert(line_end, &format!("\n{body}"));
                self.buffer.set_cursor(line_end + 1);
            }
        } else {
            let after = match char_at(self.buffer.text(), pos) {
                Some(c) if c != '\n' => next_grapheme_boundary(self.buffer.text(), pos),
                _ => pos,
            };
            self.buffer.insert(after, &text);
        }
        Outcome::proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTerminal;

    impl TerminalOwnership for NoTerminal {
        fn release(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
        fn reacquire(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn session(text: &str, cursor: usize, mode: EditingMode) -> Session {
        Session::new(
            LineBuffer::with_cursor(text, cursor),
            mode,
            ExternalEditor::new("true", std::env::temp_dir()),
        )
    }

    fn run(session: &mut Session, actions: &[Action]) -> Outcome {
        let mut last = Outcome::proceed();
        for action in actions {
            last = session.dispatch(*action, &mut NoTerminal).unwrap();
        }
        last
    }

    #[test]
    fn test_insert_and_newline() {
        let mut s = session("", 0, EditingMode::Emacs);
        run(
            &mut s,
            &[
                Action::InsertChar('a'),
                Action::InsertNewline,
                Action::InsertTab,
                Action::InsertChar('b'),
            ],
        );
        assert_eq!(s.buffer().text(), "a\n\tb");
        assert_eq!(s.buffer().cursor(), 4);
    }

    #[test]
    fn test_ctrl_d_deletes_or_accepts() {
        let mut s = session("ab", 0, EditingMode::Emacs);
        let outcome = run(&mut s, &[Action::DeleteForwardOrAccept]);
        assert_eq!(outcome.flow, Flow::Continue);
        assert_eq!(s.buffer().text(), "b");

        let mut s = session("ab", 2, EditingMode::Emacs);
        let outcome = run(&mut s, &[Action::DeleteForwardOrAccept]);
        assert_eq!(outcome.flow, Flow::Accept);
        assert_eq!(s.buffer().text(), "ab");

        let mut s = session("", 0, EditingMode::Emacs);
        assert_eq!(run(&mut s, &[Action::DeleteForwardOrAccept]).flow, Flow::Accept);
    }

    #[test]
    fn test_boundaries_ring_bell() {
        let mut s = session("one\ntwo", 1, EditingMode::Emacs);
        assert!(run(&mut s, &[Action::MoveUp]).bell);
        assert_eq!(s.buffer().cursor(), 1);
        assert!(!run(&mut s, &[Action::MoveDown]).bell);
        assert_eq!(s.buffer().cursor(), 5);
        assert!(run(&mut s, &[Action::MoveDown]).bell);
        assert!(run(&mut s, &[Action::MoveBufferStart, Action::MoveLeft]).bell);
        assert!(run(&mut s, &[Action::DeleteBackward]).bell);
    }

    #[test]
    fn test_kill_and_yank() {
        let mut s = session("hello world", 5, EditingMode::Emacs);
        run(&mut s, &[Action::KillToLineEnd]);
        assert_eq!(s.buffer().text(), "hello");
        assert_eq!(s.last_kill(), Some(" world"));

        run(&mut s, &[Action::MoveLineStart, Action::Yank]);
        assert_eq!(s.buffer().text(), " worldhello");
        assert_eq!(s.buffer().cursor(), 6);
    }

    #[test]
    fn test_yank_without_kill_rings_bell() {
        let mut s = session("abc", 0, EditingMode::Emacs);
        assert!(run(&mut s, &[Action::Yank]).bell);
        assert_eq!(s.buffer().text(), "abc");
    }

    #[test]
    fn test_vi_count_prefix() {
        let mut s = session("a\nb\nc\nd", 0, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::Digit(2), Action::ViDeleteLines]);
        assert_eq!(s.buffer().text(), "c\nd");
        assert_eq!(s.pending_count(), None);
        assert_eq!(s.last_kill(), Some("a\nb\n"));
    }

    #[test]
    fn test_vi_zero_is_line_start_without_count() {
        let mut s = session("abcdef", 4, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode]);
        assert_eq!(s.buffer().cursor(), 3);
        run(&mut s, &[Action::Digit(0)]);
        assert_eq!(s.buffer().cursor(), 0);
        assert_eq!(s.pending_count(), None);

        run(&mut s, &[Action::Digit(1), Action::Digit(0)]);
        assert_eq!(s.pending_count(), Some(10));
    }

    #[test]
    fn test_goto_with_and_without_count() {
        let text = "one\n  two\nthree\n  four";
        let mut s = session(text, 0, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::GotoLastLine]);
        assert_eq!(s.buffer().cursor(), text.find("four").unwrap());

        run(&mut s, &[Action::Digit(2), Action::GotoLastLine]);
        assert_eq!(s.buffer().cursor(), text.find("two").unwrap());

        run(&mut s, &[Action::GotoFirstLine]);
        assert_eq!(s.buffer().cursor(), 0);

        run(&mut s, &[Action::Digit(3), Action::GotoFirstLine]);
        assert_eq!(s.buffer().cursor(), text.find("three").unwrap());
    }

    #[test]
    fn test_open_line_enters_insert_mode() {
        let mut s = session("abc\ndef", 1, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::OpenLineBelow]);
        assert_eq!(s.mode(), EditMode::ViInsert);
        assert_eq!(s.buffer().text(), "abc\n\ndef");
        assert_eq!(s.buffer().cursor(), 4);
    }

    #[test]
    fn test_insert_variants() {
        let mut s = session("  abc", 3, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::EnterInsertAfter]);
        assert_eq!(s.buffer().cursor(), 3);

        run(&mut s, &[Action::EnterCommandMode, Action::EnterInsertLineEnd]);
        assert_eq!(s.buffer().cursor(), 5);

        run(&mut s, &[Action::EnterCommandMode, Action::EnterInsertLineStart]);
        assert_eq!(s.buffer().cursor(), 0);
        assert_eq!(s.mode(), EditMode::ViInsert);
    }

    #[test]
    fn test_vi_x_and_put() {
        let mut s = session("abc", 0, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::ViDeleteChar, Action::Put]);
        assert_eq!(s.buffer().text(), "bac");
    }

    #[test]
    fn test_x_stops_at_newline() {
        let mut s = session("ab\ncd", 2, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::Digit(5), Action::ViDeleteChar]);
        assert_eq!(s.buffer().text(), "a\ncd");
    }

    #[test]
    fn test_put_whole_line_below() {
        let mut s = session("one\ntwo\nthree", 0, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode, Action::ViDeleteLines, Action::Put]);
        assert_eq!(s.buffer().text(), "two\none\nthree");
        assert_eq!(s.buffer().cursor(), 4);

        run(&mut s, &[Action::GotoLastLine, Action::Put]);
        assert_eq!(s.buffer().text(), "two\none\nthree\none");
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let mut s = session("", 0, EditingMode::Emacs);
        s.handle_paste("a\r\nb\rc\n");
        assert_eq!(s.buffer().text(), "a\nb\nc\n");
        assert!(!s.buffer().text().contains('\r'));
    }

    #[test]
    fn test_emacs_numeric_argument() {
        let mut s = session("", 0, EditingMode::Emacs);
        run(&mut s, &[Action::Digit(3), Action::InsertChar('z')]);
        assert_eq!(s.buffer().text(), "zzz");
    }

    #[test]
    fn test_count_is_capped() {
        let mut s = session("", 0, EditingMode::Vi);
        run(&mut s, &[Action::EnterCommandMode]);
        for _ in 0..10 {
            run(&mut s, &[Action::Digit(9)]);
        }
        assert_eq!(s.pending_count(), Some(MAX_COUNT));
    }

    #[test]
    fn test_interrupt_and_accept() {
        let mut s = session("x", 0, EditingMode::Emacs);
        assert_eq!(run(&mut s, &[Action::Interrupt]).flow, Flow::Interrupt);
        assert_eq!(run(&mut s, &[Action::Accept]).flow, Flow::Accept);
    }
}
