use crate::model::buffer::TextBuffer;
use crate::services::cancellation::CancellationToken;
use crate::services::loader::LoadHandle;
use crate::services::search::{SearchDirection, SearchState};
use std::path::PathBuf;

/// Identifies a tab within a session. Keys are the lowest unused
/// non-negative integer at allocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabKey(pub usize);

/// Loading lifecycle of a tab's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No file content involved (new untitled tab)
    Idle,
    /// Background load in progress: read-only, unsearchable, no highlighting
    Loading,
    /// Content present and editable
    Ready,
    /// Tab is being torn down; late results are ignored
    Closed,
}

/// Go-to-line bar state kept per tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GotoLineState {
    pub visible: bool,
    /// Last text entered (or pre-filled)
    pub text: Option<String>,
}

/// A queued find-next/find-previous, completed by the next `pump`
#[derive(Debug)]
pub(crate) struct PendingNavigation {
    pub direction: SearchDirection,
    pub token: CancellationToken,
}

/// One open document
#[derive(Debug)]
pub struct Tab {
    pub key: TabKey,
    pub buffer: TextBuffer,
    pub file_path: Option<PathBuf>,
    /// N of "Untitled N" until the first save
    pub untitled: Option<usize>,
    pub label: String,
    /// Short content type, e.g. "PLAIN" or "LOG"
    pub file_type: String,
    pub load_state: LoadState,
    pub(crate) load: Option<LoadHandle>,
    pub search: SearchState,
    pub goto: GotoLineState,
    pub find_bar_visible: bool,
    /// Typed characters replace the ones after the cursor
    pub overwrite: bool,
    pub(crate) pending_navigation: Option<PendingNavigation>,
}

impl Tab {
    pub(crate) fn new(key: TabKey, label: String) -> Self {
        Self {
            key,
            buffer: TextBuffer::new(),
            file_path: None,
            untitled: None,
            label,
            file_type: String::new(),
            load_state: LoadState::Idle,
            load: None,
            search: SearchState::default(),
            goto: GotoLineState::default(),
            find_bar_visible: false,
            overwrite: false,
            pending_navigation: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    /// Cancel the queued search navigation, if any
    pub(crate) fn cancel_navigation(&mut self) {
        if let Some(nav) = self.pending_navigation.take() {
            nav.token.cancel();
        }
    }

    /// Cancel the background load, if any
    pub(crate) fn cancel_load(&mut self) {
        if let Some(load) = self.load.take() {
            load.cancel();
        }
    }
}

/// Snapshot of a tab's UI state, handed to the shell on tab switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub key: TabKey,
    pub label: String,
    pub title: String,
    pub file_type: String,
    pub search: SearchState,
    pub goto: GotoLineState,
    pub find_bar_visible: bool,
    /// Search and goto inputs accept input (false while loading)
    pub search_enabled: bool,
    pub loading: bool,
}

/// Result of `open_file`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened(TabKey),
    /// Already open in this session; nothing new was created
    AlreadyOpen(TabKey),
    /// Held by another window
    OpenElsewhere,
    /// Rejected as binary
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    Cancelled,
    /// The user chose to save and the save did not happen
    SaveFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCloseOutcome {
    Closed,
    Cancelled,
    /// At least one selected save failed; the window stays open
    SaveFailed,
}

/// Counts outstanding saves before a window may close
#[derive(Debug)]
pub(crate) struct SaveGate {
    remaining: usize,
}

impl SaveGate {
    pub fn new(remaining: usize) -> Self {
        Self { remaining }
    }

    /// Record one finished save; returns true once every save succeeded
    pub fn complete(&mut self, success: bool) -> bool {
        if success && self.remaining > 0 {
            self.remaining -= 1;
        }
        self.is_open()
    }

    pub fn is_open(&self) -> bool {
        self.remaining == 0
    }
}
