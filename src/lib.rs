//! Core of the jellypie to-do and plain text editor.
//!
//! A [`app::Session`] owns the tabs of one window: their buffers, on-disk
//! association, search and goto state, and file-change monitors. Shells drive
//! it through plain method calls (or [`input::commands::Action`]s) and answer
//! its questions through the [`app::Dialogs`] trait.

// Configuration types
pub mod config;
pub mod config_io;

// Document model: text buffer, content sniffing, filesystem access
pub mod model;

// Background work: file loading, watching, search, reconciliation
pub mod services;

// Window/session state and operations
pub mod app;

// Actions, dispatch and key bindings
pub mod input;
