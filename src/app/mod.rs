//! Prompt application: session state, key dispatch, external editor round
//! trip and target file I/O.

pub mod external_editor;
pub mod prompt;
pub mod session;
pub mod target;

pub use session::{Flow, Outcome, Session};
