//! Named actions, their dispatch and keyboard accelerators

pub mod commands;
pub mod keybindings;
