//! Named actions and the table that routes them to session operations.
//!
//! The shell maps menu items, toolbar buttons and accelerators to an
//! [`Action`] and calls [`Session::dispatch`]. Actions that need UI the core
//! does not own (font chooser, help window) are handed back as
//! [`Dispatch::Shell`].

use crate::app::{CloseOutcome, Dialogs, Session, WindowCloseOutcome};
use std::fmt;

/// Every action the window exposes, with its stable name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Save,
    SaveAs,
    Open,
    NewTab,
    CloseTab,
    Quit,
    Find,
    FindNext,
    FindPrevious,
    GoToLine,
    Escape,
    NextTab,
    PreviousTab,
    MarkDone,
    FormatBold,
    FormatItalic,
    FormatMonospace,
    ToggleOverwrite,
    ToggleBookmark,
    Font,
    QuickHelp,
}

impl Action {
    pub const ALL: [Action; 21] = [
        Action::Save,
        Action::SaveAs,
        Action::Open,
        Action::NewTab,
        Action::CloseTab,
        Action::Quit,
        Action::Find,
        Action::FindNext,
        Action::FindPrevious,
        Action::GoToLine,
        Action::Escape,
        Action::NextTab,
        Action::PreviousTab,
        Action::MarkDone,
        Action::FormatBold,
        Action::FormatItalic,
        Action::FormatMonospace,
        Action::ToggleOverwrite,
        Action::ToggleBookmark,
        Action::Font,
        Action::QuickHelp,
    ];

    /// Name used in the `shortcuts` config map
    pub fn name(self) -> &'static str {
        match self {
            Action::Save => "save",
            Action::SaveAs => "save_as",
            Action::Open => "open",
            Action::NewTab => "new_tab",
            Action::CloseTab => "close_tab",
            Action::Quit => "quit",
            Action::Find => "find",
            Action::FindNext => "find_next",
            Action::FindPrevious => "find_previous",
            Action::GoToLine => "go_to_line",
            Action::Escape => "escape",
            Action::NextTab => "next_tab",
            Action::PreviousTab => "previous_tab",
            Action::MarkDone => "mark_done",
            Action::FormatBold => "format_bold",
            Action::FormatItalic => "format_italic",
            Action::FormatMonospace => "format_monospace",
            Action::ToggleOverwrite => "toggle_overwrite",
            Action::ToggleBookmark => "toggle_bookmark",
            Action::Font => "font",
            Action::QuickHelp => "quick_help",
        }
    }

    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|action| action.name() == name)
    }

    /// Human-readable description for help listings
    pub fn description(self) -> &'static str {
        match self {
            Action::Save => "Save the current document",
            Action::SaveAs => "Save the current document under a new name",
            Action::Open => "Open files",
            Action::NewTab => "Open a new untitled tab",
            Action::CloseTab => "Close the current document",
            Action::Quit => "Close the window",
            Action::Find => "Show the find bar",
            Action::FindNext => "Select the next match",
            Action::FindPrevious => "Select the previous match",
            Action::GoToLine => "Show the go-to-line bar",
            Action::Escape => "Hide the find and go-to-line bars",
            Action::NextTab => "Move to the next tab",
            Action::PreviousTab => "Move to the previous tab",
            Action::MarkDone => "Mark the current line done",
            Action::FormatBold => "Bold",
            Action::FormatItalic => "Italic",
            Action::FormatMonospace => "Monospace",
            Action::ToggleOverwrite => "Switch between insert and overwrite mode",
            Action::ToggleBookmark => "Toggle a bookmark on the current line",
            Action::Font => "Choose the editor font",
            Action::QuickHelp => "Show quick help",
        }
    }

    /// Whether the core handles this action itself
    pub fn is_core(self) -> bool {
        !matches!(self, Action::Font | Action::QuickHelp)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of dispatching an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The action ran
    Handled,
    /// The action does not apply right now (no tab, tab loading, nothing to do)
    Ignored,
    /// The shell must carry out the action
    Shell(Action),
    /// Goto bar shown, pre-filled with the current line
    GotoLine(String),
    TabClosed(CloseOutcome),
    WindowClosed(WindowCloseOutcome),
}

impl Dispatch {
    fn from_flag(done: bool) -> Self {
        if done {
            Dispatch::Handled
        } else {
            Dispatch::Ignored
        }
    }
}

impl Session {
    /// Run a named action against the active tab
    pub fn dispatch(&mut self, action: Action, dialogs: &mut dyn Dialogs) -> Dispatch {
        tracing::debug!("Dispatching {}", action);
        if !action.is_core() {
            return Dispatch::Shell(action);
        }
        if self.is_closed() {
            return Dispatch::Ignored;
        }

        match action {
            Action::NewTab => {
                self.new_tab();
                Dispatch::Handled
            }
            Action::Open => {
                let results = self.open_with_dialog(dialogs);
                Dispatch::from_flag(results.iter().any(|r| r.is_ok()))
            }
            Action::Quit => Dispatch::WindowClosed(self.close_window(dialogs)),
            Action::NextTab => Dispatch::from_flag(self.next_tab(dialogs).is_some()),
            Action::PreviousTab => Dispatch::from_flag(self.previous_tab(dialogs).is_some()),
            Action::Escape => {
                self.escape();
                Dispatch::Handled
            }
            Action::MarkDone => Dispatch::from_flag(self.mark_done()),
            Action::FormatBold => Dispatch::from_flag(self.format_bold()),
            Action::FormatItalic => Dispatch::from_flag(self.format_italic()),
            Action::FormatMonospace => Dispatch::from_flag(self.format_monospace()),
            Action::ToggleOverwrite => Dispatch::from_flag(self.toggle_overwrite().is_some()),
            Action::ToggleBookmark => {
                Dispatch::from_flag(self.toggle_bookmark_at_cursor().is_some())
            }
            Action::GoToLine => match self.show_goto_line() {
                Some(current) => Dispatch::GotoLine(current),
                None => Dispatch::Ignored,
            },
            Action::Find => {
                self.show_find_bar();
                Dispatch::Handled
            }
            Action::FindNext => {
                self.find_next();
                Dispatch::Handled
            }
            Action::FindPrevious => {
                self.find_previous();
                Dispatch::Handled
            }
            Action::Save | Action::SaveAs | Action::CloseTab => {
                let Some(key) = self.active_tab() else {
                    return Dispatch::Ignored;
                };
                match action {
                    Action::Save => Dispatch::from_flag(self.save_current(key, dialogs)),
                    Action::SaveAs => {
                        let suggested = self
                            .tab(key)
                            .map(|tab| tab.label.clone())
                            .unwrap_or_default();
                        Dispatch::from_flag(self.save_as(key, &suggested, dialogs))
                    }
                    _ => Dispatch::TabClosed(self.close_tab(key, dialogs)),
                }
            }
            Action::Font | Action::QuickHelp => Dispatch::Shell(action),
        }
    }
}
