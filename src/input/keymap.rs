//! Built-in key binding table and multi-key sequence resolution
//!
//! Bindings are keyed by `(EditMode, key sequence)`. Single keys and chords
//! (`g g`, `d d`, `Ctrl-X Ctrl-E`) live in the same table; the
//! [`KeyResolver`] buffers keys while they form a prefix of some binding.

use crate::input::action::{Action, EditMode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// A single normalized key press
pub type KeyPress = (KeyCode, KeyModifiers);

const EMACS: &[EditMode] = &[EditMode::Emacs];
const INSERT: &[EditMode] = &[EditMode::Emacs, EditMode::ViInsert];
const COMMAND: &[EditMode] = &[EditMode::ViCommand];
const ALL: &[EditMode] = &[EditMode::Emacs, EditMode::ViInsert, EditMode::ViCommand];

fn key(code: KeyCode) -> KeyPress {
    (code, KeyModifiers::NONE)
}

fn ch(c: char) -> KeyPress {
    Keymap::normalize_key(KeyCode::Char(c), KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyPress {
    (KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn alt(c: char) -> KeyPress {
    Keymap::normalize_key(KeyCode::Char(c), KeyModifiers::ALT)
}

/// Fixed table mapping `(mode, keys)` to an [`Action`]
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<(EditMode, Vec<KeyPress>), Action>,
}

impl Keymap {
    /// Create the built-in binding table
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };

        // Every mode
        keymap.bind(ALL, vec![ctrl('n')], Action::Accept);
        keymap.bind(ALL, vec![ctrl('d')], Action::DeleteForwardOrAccept);
        keymap.bind(ALL, vec![ctrl('c')], Action::Interrupt);
        keymap.bind(ALL, vec![key(KeyCode::Up)], Action::MoveUp);
        keymap.bind(ALL, vec![key(KeyCode::Down)], Action::MoveDown);
        keymap.bind(ALL, vec![key(KeyCode::Left)], Action::MoveLeft);
        keymap.bind(ALL, vec![key(KeyCode::Right)], Action::MoveRight);

        // Text-insertion modes
        keymap.bind(INSERT, vec![key(KeyCode::Enter)], Action::InsertNewline);
        keymap.bind(INSERT, vec![key(KeyCode::Tab)], Action::InsertTab);
        keymap.bind(INSERT, vec![key(KeyCode::Backspace)], Action::DeleteBackward);
        keymap.bind(INSERT, vec![key(KeyCode::Delete)], Action::DeleteForward);
        keymap.bind(INSERT, vec![ctrl('a')], Action::MoveLineStart);
        keymap.bind(INSERT, vec![key(KeyCode::Home)], Action::MoveLineStart);
        keymap.bind(INSERT, vec![ctrl('e')], Action::MoveLineEnd);
        keymap.bind(INSERT, vec![key(KeyCode::End)], Action::MoveLineEnd);
        keymap.bind(INSERT, vec![ctrl('k')], Action::KillToLineEnd);
        keymap.bind(INSERT, vec![ctrl('u')], Action::KillToLineStart);
        keymap.bind(INSERT, vec![ctrl('y')], Action::Yank);
        keymap.bind(INSERT, vec![alt('<')], Action::MoveBufferStart);
        keymap.bind(INSERT, vec![alt('>')], Action::MoveBufferEnd);
        keymap.bind(INSERT, vec![ctrl('x'), ctrl('e')], Action::ExternalEditor);

        // Emacs only
        keymap.bind(EMACS, vec![ctrl('x'), ctrl('k')], Action::KillWholeLine);
        keymap.bind(EMACS, vec![ctrl('p')], Action::MoveUp);
        keymap.bind(EMACS, vec![ctrl('f')], Action::MoveRight);
        keymap.bind(EMACS, vec![ctrl('b')], Action::MoveLeft);
        for digit in 0..=9u8 {
            keymap.bind(EMACS, vec![alt(char::from(b'0' + digit))], Action::Digit(digit));
        }

        // vi insert
        keymap.bind(
            &[EditMode::ViInsert],
            vec![key(KeyCode::Esc)],
            Action::EnterCommandMode,
        );

        // vi command
        let command = [
            (ch('j'), Action::MoveDown),
            (ch('k'), Action::MoveUp),
            (ch('h'), Action::MoveLeft),
            (ch('l'), Action::MoveRight),
            (ch('^'), Action::MoveFirstNonBlank),
            (ch('$'), Action::MoveLineEnd),
            (ch('J'), Action::JoinLines),
            (ch('o'), Action::OpenLineBelow),
            (ch('O'), Action::OpenLineAbove),
            (ch('G'), Action::GotoLastLine),
            (ch('D'), Action::ViDeleteToLineEnd),
            (ch('x'), Action::ViDeleteChar),
            (ch('p'), Action::Put),
            (ch('v'), Action::ExternalEditor),
            (ch('i'), Action::EnterInsert),
            (ch('a'), Action::EnterInsertAfter),
            (ch('I'), Action::EnterInsertLineStart),
            (ch('A'), Action::EnterInsertLineEnd),
            (key(KeyCode::Enter), Action::MoveNextLineFirstNonBlank),
            (key(KeyCode::Home), Action::MoveLineStart),
            (key(KeyCode::End), Action::MoveLineEnd),
        ];
        for (press, action) in command {
            keymap.bind(COMMAND, vec![press], action);
        }
        keymap.bind(COMMAND, vec![ch('g'), ch('g')], Action::GotoFirstLine);
        keymap.bind(COMMAND, vec![ch('d'), ch('d')], Action::ViDeleteLines);
        for digit in 0..=9u8 {
            keymap.bind(COMMAND, vec![ch(char::from(b'0' + digit))], Action::Digit(digit));
        }

        keymap
    }

    fn bind(&mut self, modes: &[EditMode], keys: Vec<KeyPress>, action: Action) {
        for mode in modes {
            self.bindings.insert((*mode, keys.clone()), action);
        }
    }

    /// Normalize a key for lookup
    ///
    /// - Uppercase letters become lowercase with SHIFT
    /// - SHIFT is dropped from other characters, whose shifted form is
    ///   already in the char (`$`, `<`, `^`)
    pub fn normalize_key(code: KeyCode, modifiers: KeyModifiers) -> KeyPress {
        if let KeyCode::Char(c) = code {
            if c.is_ascii_uppercase() {
                return (
                    KeyCode::Char(c.to_ascii_lowercase()),
                    modifiers | KeyModifiers::SHIFT,
                );
            }
            if !c.is_ascii_alphabetic() {
                return (code, modifiers - KeyModifiers::SHIFT);
            }
        }
        (code, modifiers)
    }

    /// Exact binding for a complete sequence
    pub fn lookup(&self, mode: EditMode, sequence: &[KeyPress]) -> Option<Action> {
        self.bindings.get(&(mode, sequence.to_vec())).copied()
    }

    /// Check if `sequence` is a strict prefix of some binding in `mode`
    pub fn is_prefix(&self, mode: EditMode, sequence: &[KeyPress]) -> bool {
        self.bindings.keys().any(|(bound_mode, keys)| {
            *bound_mode == mode && keys.len() > sequence.len() && keys[..sequence.len()] == *sequence
        })
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of feeding one key to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Action(Action),
    /// The keys so far are a prefix of a longer binding
    Pending,
    /// No binding; the pending keys were discarded
    Unbound,
}

/// Pending-prefix resolver over a [`Keymap`]
#[derive(Debug, Clone, Default)]
pub struct KeyResolver {
    keymap: Keymap,
    pending: Vec<KeyPress>,
}

impl KeyResolver {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            pending: Vec::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Feed one key event
    pub fn feed(&mut self, mode: EditMode, event: &KeyEvent) -> Resolution {
        self.pending
            .push(Keymap::normalize_key(event.code, event.modifiers));

        if let Some(action) = self.keymap.lookup(mode, &self.pending) {
            self.pending.clear();
            return Resolution::Action(action);
        }
        if self.keymap.is_prefix(mode, &self.pending) {
            return Resolution::Pending;
        }

        let single = self.pending.len() == 1;
        self.pending.clear();

        if single && mode.allows_text_input() {
            if let Some(c) = printable(event) {
                return Resolution::Action(Action::InsertChar(c));
            }
        }
        Resolution::Unbound
    }
}

/// The character a key inserts, if it is plain text
fn printable(event: &KeyEvent) -> Option<char> {
    match event.code {
        KeyCode::Char(c)
            if (event.modifiers - KeyModifiers::SHIFT).is_empty() && !c.is_control() =>
        {
            Some(c)
        }
        _ => None,
    }
}
