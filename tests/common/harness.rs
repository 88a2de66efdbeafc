// SessionHarness - drives a Session with scripted dialog answers

use jellypie::app::{
    CloseResponse, Dialogs, Notice, OpenFileRegistry, OpenOutcome, ReloadResponse,
    RemovedResponse, Session, SessionError, SharedRegistry, TabKey, UnsavedRow,
    WindowCloseResponse,
};
use jellypie::config::Config;
use jellypie::model::filesystem::FileSystem;
use jellypie::services::elevated::{ElevatedWriter, NoElevation};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Dialog answers queued by the test, plus a record of every question asked.
///
/// An empty queue answers Cancel (or None / no paths).
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    pub close_answers: VecDeque<CloseResponse>,
    pub window_close_answers: VecDeque<WindowCloseResponse>,
    /// Labels to uncheck in the window-close list
    pub window_close_uncheck: Vec<String>,
    pub save_paths: VecDeque<Option<PathBuf>>,
    pub open_paths: VecDeque<Vec<PathBuf>>,
    pub reload_answers: VecDeque<ReloadResponse>,
    pub removed_answers: VecDeque<RemovedResponse>,

    pub close_prompts: Vec<String>,
    pub window_close_rows: Vec<Vec<UnsavedRow>>,
    pub save_suggestions: Vec<String>,
    pub reload_prompts: Vec<String>,
    pub removed_prompts: Vec<String>,
    pub notices: Vec<Notice>,
}

impl Dialogs for ScriptedDialogs {
    fn confirm_close(&mut self, label: &str) -> CloseResponse {
        self.close_prompts.push(label.to_string());
        self.close_answers
            .pop_front()
            .unwrap_or(CloseResponse::Cancel)
    }

    fn confirm_window_close(&mut self, rows: &mut [UnsavedRow]) -> WindowCloseResponse {
        self.window_close_rows.push(rows.to_vec());
        for row in rows.iter_mut() {
            if self.window_close_uncheck.contains(&row.label) {
                row.checked = false;
            }
        }
        self.window_close_answers
            .pop_front()
            .unwrap_or(WindowCloseResponse::Cancel)
    }

    fn choose_save_path(&mut self, suggested_name: &str) -> Option<PathBuf> {
        self.save_suggestions.push(suggested_name.to_string());
        self.save_paths.pop_front().flatten()
    }

    fn choose_open_paths(&mut self) -> Vec<PathBuf> {
        self.open_paths.pop_front().unwrap_or_default()
    }

    fn confirm_reload(&mut self, label: &str) -> ReloadResponse {
        self.reload_prompts.push(label.to_string());
        self.reload_answers
            .pop_front()
            .unwrap_or(ReloadResponse::Cancel)
    }

    fn confirm_removed(&mut self, label: &str) -> RemovedResponse {
        self.removed_prompts.push(label.to_string());
        self.removed_answers
            .pop_front()
            .unwrap_or(RemovedResponse::Cancel)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Elevated writer that writes directly and records each call
#[derive(Debug, Default, Clone)]
pub struct RecordingElevatedWriter {
    pub calls: Arc<std::sync::Mutex<Vec<PathBuf>>>,
    pub fail: bool,
}

impl ElevatedWriter for RecordingElevatedWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, "authorization dismissed"));
        }
        std::fs::write(path, contents)
    }
}

/// Filesystem that refuses plain writes to chosen paths with PermissionDenied
#[derive(Debug, Default)]
pub struct ReadOnlyPathsFs {
    pub denied: Vec<PathBuf>,
}

impl FileSystem for ReadOnlyPathsFs {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_prefix(&self, path: &Path, len: usize) -> io::Result<Vec<u8>> {
        let mut bytes = std::fs::read(path)?;
        bytes.truncate(len);
        Ok(bytes)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if self.denied.iter().any(|denied| denied == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        std::fs::write(path, contents)
    }

    fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open_reader(&self, path: &Path) -> io::Result<Box<dyn io::Read + Send>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }
}

/// Test configuration: no OS watchers, to-do file inside the temp dir
pub fn test_config(dir: &Path) -> Config {
    Config {
        filepath: dir.join("jellypie.todo").to_string_lossy().into_owned(),
        watch_files: false,
        ..Config::default()
    }
}

pub struct SessionHarness {
    pub session: Session,
    pub dialogs: ScriptedDialogs,
    temp_dir: TempDir,
}

impl SessionHarness {
    pub fn new() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path());
        Ok(Self::from_parts(temp_dir, config, OpenFileRegistry::shared()))
    }

    pub fn with_config(edit: impl FnOnce(&mut Config)) -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let mut config = test_config(temp_dir.path());
        edit(&mut config);
        Ok(Self::from_parts(temp_dir, config, OpenFileRegistry::shared()))
    }

    /// A second window sharing `registry`, in its own temp dir
    pub fn with_registry(registry: SharedRegistry) -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = test_config(temp_dir.path());
        Ok(Self::from_parts(temp_dir, config, registry))
    }

    fn from_parts(temp_dir: TempDir, config: Config, registry: SharedRegistry) -> Self {
        Self {
            // Tests never escalate unless they install a writer
            session: Session::new(config, registry).with_elevated_writer(Box::new(NoElevation)),
            dialogs: ScriptedDialogs::default(),
            temp_dir,
        }
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.session = self.session.with_filesystem(fs);
        self
    }

    pub fn with_elevated_writer(mut self, writer: Box<dyn ElevatedWriter>) -> Self {
        self.session = self.session.with_elevated_writer(writer);
        self
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Canonical path of a file in the temp dir
    pub fn path(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        path.canonicalize().unwrap_or(path)
    }

    /// Write a file in the temp dir and return its canonical path
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path.canonicalize().unwrap()
    }

    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(name)).unwrap()
    }

    pub fn open(&mut self, path: &Path) -> Result<OpenOutcome, SessionError> {
        self.session.open_file(path, &mut self.dialogs)
    }

    /// Open a file and return its tab, panicking on anything but a new tab
    pub fn open_new(&mut self, path: &Path) -> TabKey {
        match self.open(path) {
            Ok(OpenOutcome::Opened(key)) => key,
            other => panic!("expected a new tab for {:?}, got {:?}", path, other),
        }
    }

    pub fn new_tab(&mut self) -> TabKey {
        self.session.new_tab()
    }

    pub fn active(&self) -> TabKey {
        self.session.active_tab().expect("no active tab")
    }

    pub fn text(&self, key: TabKey) -> String {
        self.session.tab(key).unwrap().buffer.text().to_string()
    }

    pub fn active_text(&self) -> String {
        self.text(self.active())
    }

    pub fn label(&self, key: TabKey) -> String {
        self.session.tab(key).unwrap().label.clone()
    }

    /// Type at the cursor of the active tab as one undoable step
    pub fn type_text(&mut self, text: &str) {
        let key = self.active();
        let buffer = &mut self.session.tab_mut(key).unwrap().buffer;
        buffer.begin_user_action();
        buffer.insert_at_cursor(text);
        buffer.end_user_action();
    }

    pub fn place_cursor(&mut self, offset: usize) {
        let key = self.active();
        self.session.tab_mut(key).unwrap().buffer.place_cursor(offset);
    }

    pub fn select(&mut self, start: usize, end: usize) {
        let key = self.active();
        self.session
            .tab_mut(key)
            .unwrap()
            .buffer
            .select_range(start, end);
    }

    pub fn selection(&self) -> Option<std::ops::Range<usize>> {
        self.session.tab(self.active()).unwrap().buffer.selection()
    }

    pub fn save(&mut self, key: TabKey) -> bool {
        self.session.save_current(key, &mut self.dialogs)
    }

    pub fn pump(&mut self) {
        self.session.pump(Instant::now(), &mut self.dialogs);
    }

    pub fn pump_at(&mut self, now: Instant) {
        self.session.pump(now, &mut self.dialogs);
    }

    /// Pump until the tab finishes its background load
    pub fn wait_until_loaded(&mut self, key: TabKey) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while self.session.tab(key).is_some_and(|tab| tab.is_loading()) {
            assert!(Instant::now() < deadline, "timed out waiting for load");
            self.session
                .wait_for_messages(Duration::from_millis(20), &mut self.dialogs);
        }
    }
}
