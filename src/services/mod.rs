//! Process-level services: terminal state, signals and logging

pub mod signal_handler;
pub mod terminal_guard;
pub mod terminal_modes;
pub mod tracing_setup;
