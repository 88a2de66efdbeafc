mod async_messages;
mod buffer_management;
pub mod dialogs;
mod editing;
mod errors;
pub mod file_open;
mod file_operations;
mod goto_line;
pub mod registry;
mod search_actions;
mod todo_actions;
pub mod types;

pub use self::dialogs::{
    CloseResponse, Dialogs, Notice, ReloadResponse, RemovedResponse, UnsavedRow,
    WindowCloseResponse,
};
pub use self::errors::SessionError;
pub use self::registry::{OpenFileRegistry, SharedRegistry, WindowId};
pub use self::types::{
    CloseOutcome, GotoLineState, LoadState, OpenOutcome, Tab, TabKey, TabView, WindowCloseOutcome,
};

use crate::config::Config;
use crate::config_io::APP_NAME;
use crate::model::filesystem::{FileSystem, StdFileSystem};
use crate::services::async_bridge::{AsyncBridge, AsyncMessage};
use crate::services::elevated::{ElevatedWriter, PkexecWriter};
use crate::services::file_watcher::FileMonitors;
use crate::services::reconciler::Reconciler;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Make `path` absolute and resolve `.`/`..` without requiring it to exist.
/// Existing paths are canonicalized so symlinked names map to one tab.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// The documents of one window and everything attached to them
///
/// All state is owned here and mutated only on the thread driving the
/// session; worker threads report back through the async bridge.
pub struct Session {
    window: WindowId,
    config: Config,

    tabs: HashMap<TabKey, Tab>,
    /// Page order
    order: Vec<TabKey>,
    active: Option<TabKey>,

    fs: Arc<dyn FileSystem>,
    elevated: Box<dyn ElevatedWriter>,

    /// Shared with the other windows of the process
    registry: SharedRegistry,
    monitors: FileMonitors,
    reconciler: Reconciler,
    async_bridge: AsyncBridge,

    /// Paths last written through the elevated fallback
    admin_files: HashSet<PathBuf>,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("window", &self.window)
            .field("order", &self.order)
            .field("active", &self.active)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an empty session for a new window
    pub fn new(config: Config, registry: SharedRegistry) -> Self {
        let reconciler = Reconciler::new(
            Duration::from_millis(config.self_save_suppress_ms),
            Duration::from_millis(config.file_event_debounce_ms),
        );
        Self {
            window: WindowId::next(),
            config,
            tabs: HashMap::new(),
            order: Vec::new(),
            active: None,
            fs: Arc::new(StdFileSystem),
            elevated: Box::new(PkexecWriter::default()),
            registry,
            monitors: FileMonitors::new(),
            reconciler,
            async_bridge: AsyncBridge::new(),
            admin_files: HashSet::new(),
            closed: false,
        }
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_elevated_writer(mut self, writer: Box<dyn ElevatedWriter>) -> Self {
        self.elevated = writer;
        self
    }

    pub fn window_id(&self) -> WindowId {
        self.window
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn active_tab(&self) -> Option<TabKey> {
        self.active
    }

    pub fn tab(&self, key: TabKey) -> Option<&Tab> {
        self.tabs.get(&key)
    }

    pub fn tab_mut(&mut self, key: TabKey) -> Option<&mut Tab> {
        self.tabs.get_mut(&key)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Keys in page order
    pub fn tab_keys(&self) -> &[TabKey] {
        &self.order
    }

    /// Labels in page order
    pub fn tab_labels(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|key| self.tabs.get(key))
            .map(|tab| tab.label.clone())
            .collect()
    }

    /// Tab backed by `path` in this session
    pub fn find_tab_by_path(&self, path: &Path) -> Option<TabKey> {
        self.order
            .iter()
            .copied()
            .find(|key| self.tabs.get(key).and_then(|t| t.file_path.as_deref()) == Some(path))
    }

    /// "* label" when the active document is modified, else its label
    pub fn window_title(&self) -> String {
        match self.active.and_then(|key| self.tabs.get(&key)) {
            Some(tab) if tab.is_modified() => format!("* {}", tab.label),
            Some(tab) => tab.label.clone(),
            None => APP_NAME.to_string(),
        }
    }

    pub fn is_admin_file(&self, path: &Path) -> bool {
        self.admin_files.contains(path)
    }

    pub fn monitors(&self) -> &FileMonitors {
        &self.monitors
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Sender for injecting messages into the main loop
    pub fn async_sender(&self) -> Sender<AsyncMessage> {
        self.async_bridge.sender()
    }

    /// Wait up to `timeout` for worker messages, then process them.
    /// Used by shells that have nothing else to poll.
    pub fn wait_for_messages(&mut self, timeout: Duration, dialogs: &mut dyn Dialogs) {
        if let Some(message) = self.async_bridge.recv_timeout(timeout) {
            self.handle_async_message(message, dialogs);
        }
        self.pump(Instant::now(), dialogs);
    }

    /// When the next debounce timer fires, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reconciler.next_deadline()
    }

    fn active_tab_mut(&mut self) -> Option<&mut Tab> {
        let key = self.active?;
        self.tabs.get_mut(&key)
    }

    /// Lowest unused non-negative key
    fn allocate_key(&self) -> TabKey {
        (0..)
            .map(TabKey)
            .find(|key| !self.tabs.contains_key(key))
            .unwrap_or(TabKey(self.tabs.len()))
    }

    /// Lowest N >= 1 not used by an open untitled tab
    fn allocate_untitled_number(&self) -> usize {
        let used: HashSet<usize> = self.tabs.values().filter_map(|t| t.untitled).collect();
        (1..).find(|n| !used.contains(n)).unwrap_or(used.len() + 1)
    }

    /// Register (or re-register) the file monitor for a tab's path
    fn start_monitor(&mut self, key: TabKey, path: &Path) {
        let sender = self
            .config
            .watch_files
            .then(|| self.async_bridge.sender());
        if let Err(e) = self.monitors.watch(path, key, sender) {
            let error = SessionError::Watch {
                path: path.to_path_buf(),
                source: e,
            };
            tracing::warn!("{}", error);
            // Keep the registration so the path stays accounted for
            let _ = self.monitors.watch(path, key, None);
        }
    }

    fn register_path(&mut self, path: &Path, key: TabKey) {
        if let Err(e) = self.registry.borrow_mut().register(path, self.window, key) {
            tracing::warn!("{}", e);
        }
    }

    fn unregister_path(&mut self, path: &Path, key: TabKey) {
        self.registry.borrow_mut().unregister(path, self.window, key);
    }
}
