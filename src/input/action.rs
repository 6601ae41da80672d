use crate::config::EditingMode;

/// Binding context of the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Emacs bindings; text is always inserted
    Emacs,
    /// vi insert mode
    ViInsert,
    /// vi command (movement) mode
    ViCommand,
}

impl EditMode {
    /// Mode a fresh session starts in
    pub fn initial(editing_mode: EditingMode) -> Self {
        match editing_mode {
            EditingMode::Emacs => Self::Emacs,
            EditingMode::Vi => Self::ViInsert,
        }
    }

    /// Check if unbound printable keys insert themselves in this mode
    pub fn allows_text_input(&self) -> bool {
        matches!(self, Self::Emacs | Self::ViInsert)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Emacs => "emacs",
            Self::ViInsert => "vi-insert",
            Self::ViCommand => "vi-command",
        }
    }
}

/// Everything a key sequence can ask the prompt to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Character input
    InsertChar(char),
    InsertNewline,
    InsertTab,

    // Character motion and deletion
    MoveLeft,
    MoveRight,
    DeleteBackward,
    DeleteForward,
    /// Ctrl-D: delete under the cursor, accept at the end of the buffer
    DeleteForwardOrAccept,

    // Line motion
    MoveUp,
    MoveDown,
    MoveLineStart,
    MoveLineEnd,
    MoveFirstNonBlank,
    MoveBufferStart,
    MoveBufferEnd,
    /// vi Enter: first non-blank of the next line
    MoveNextLineFirstNonBlank,
    /// vi `G`: last line, or line N with a count
    GotoLastLine,
    /// vi `gg`: first line, or line N with a count
    GotoFirstLine,

    // Line edits
    KillToLineEnd,
    KillToLineStart,
    KillWholeLine,
    ViDeleteLines,
    ViDeleteToLineEnd,
    ViDeleteChar,
    JoinLines,
    OpenLineBelow,
    OpenLineAbove,
    /// Insert the last killed text before the cursor
    Yank,
    /// vi `p`: insert the last killed text after the cursor
    Put,

    // Mode switches
    EnterInsert,
    EnterInsertAfter,
    EnterInsertLineStart,
    EnterInsertLineEnd,
    EnterCommandMode,

    /// Count prefix digit (vi digits, Emacs Alt-digit)
    Digit(u8),

    ExternalEditor,
    Accept,
    Interrupt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode() {
        assert_eq!(EditMode::initial(EditingMode::Emacs), EditMode::Emacs);
        assert_eq!(EditMode::initial(EditingMode::Vi), EditMode::ViInsert);
    }

    #[test]
    fn test_text_input_modes() {
        assert!(EditMode::Emacs.allows_text_input());
        assert!(EditMode::ViInsert.allows_text_input());
        assert!(!EditMode::ViCommand.allows_text_input());
    }
}
