//! Key bindings and the actions they resolve to

pub mod action;
pub mod keymap;
