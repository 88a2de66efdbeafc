//! User interactions the session needs from its shell.
//!
//! The session never draws anything. Whenever a flow needs a decision it
//! calls into [`Dialogs`] synchronously and continues with the answer.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseResponse {
    Cancel,
    Discard,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCloseResponse {
    Cancel,
    DiscardAll,
    /// Save the rows left checked, then close
    SaveSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadResponse {
    Cancel,
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovedResponse {
    Cancel,
    SaveAs,
}

/// One modified document in the window-close list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedRow {
    pub label: String,
    /// Whether the document is saved on "save selected"
    pub checked: bool,
}

/// Informational messages with no decision attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AlreadyOpenElsewhere { path: PathBuf },
    /// Save-as target is the file of another tab in this window
    AlreadyOpenInTab { path: PathBuf },
    BinaryFile { path: PathBuf },
    OpenFailed { path: PathBuf, error: String },
    SaveFailed { path: PathBuf, error: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::AlreadyOpenElsewhere { path } => write!(
                f,
                "The file \"{}\" is already open in another window",
                path.display()
            ),
            Notice::AlreadyOpenInTab { path } => write!(
                f,
                "The file \"{}\" is already open in another tab",
                path.display()
            ),
            Notice::BinaryFile { path } => write!(
                f,
                "The file \"{}\" is a binary file. Its content cannot be displayed",
                path.display()
            ),
            Notice::OpenFailed { path, error } => {
                write!(f, "Could not open file \"{}\": {}", path.display(), error)
            }
            Notice::SaveFailed { path, error } => {
                write!(f, "Could not save file \"{}\": {}", path.display(), error)
            }
        }
    }
}

pub trait Dialogs {
    /// A modified tab is about to close
    fn confirm_close(&mut self, label: &str) -> CloseResponse;

    /// The window is closing with modified tabs; rows may be unchecked
    fn confirm_window_close(&mut self, rows: &mut [UnsavedRow]) -> WindowCloseResponse;

    /// Pick a destination; `None` when the user cancels
    fn choose_save_path(&mut self, suggested_name: &str) -> Option<PathBuf>;

    /// Pick files to open
    fn choose_open_paths(&mut self) -> Vec<PathBuf>;

    /// The active tab's file changed on disk
    fn confirm_reload(&mut self, label: &str) -> ReloadResponse;

    /// The active tab's file disappeared from disk
    fn confirm_removed(&mut self, label: &str) -> RemovedResponse;

    fn notify(&mut self, notice: Notice);
}
