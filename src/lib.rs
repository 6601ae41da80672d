// Prompt editing library - exposes the core modules for testing

pub mod app;
pub mod config;
pub mod input;
pub mod model;
pub mod primitives;
pub mod services;
pub mod view;
