//! Opening documents: files from disk, new untitled tabs and the startup
//! to-do file.

use super::{normalize_path, Dialogs, Notice, Session, SessionError};
use super::types::{LoadState, OpenOutcome, Tab, TabKey};
use crate::model::buffer::TextBuffer;
use crate::model::content_type::ContentType;
use crate::model::filesystem::PROBE_LEN;
use crate::services::loader;
use std::path::{Path, PathBuf};

impl Session {
    /// Open `path` in a new tab.
    ///
    /// A file already open here is not opened twice, and a file held by
    /// another window is refused with a notice. Binary files are rejected.
    /// Files above the large-file threshold load in the background.
    pub fn open_file(
        &mut self,
        path: &Path,
        dialogs: &mut dyn Dialogs,
    ) -> Result<OpenOutcome, SessionError> {
        let path = normalize_path(path);

        if let Some(key) = self.find_tab_by_path(&path) {
            tracing::info!("{:?} is already open in tab {:?}", path, key);
            return Ok(OpenOutcome::AlreadyOpen(key));
        }
        let holder = self.registry.borrow().holder(&path);
        if let Some((window, _)) = holder {
            if window != self.window {
                tracing::info!("{:?} is open in another window", path);
                dialogs.notify(Notice::AlreadyOpenElsewhere { path });
                return Ok(OpenOutcome::OpenElsewhere);
            }
        }

        let (len, prefix) = match self
            .fs
            .len(&path)
            .and_then(|len| Ok((len, self.fs.read_prefix(&path, PROBE_LEN)?)))
        {
            Ok(found) => found,
            Err(e) => {
                dialogs.notify(Notice::OpenFailed {
                    path: path.clone(),
                    error: e.to_string(),
                });
                return Err(SessionError::io(path, e));
            }
        };

        let Some(content_type) = ContentType::sniff(&path, &prefix) else {
            tracing::info!("Refusing to open binary file {:?}", path);
            dialogs.notify(Notice::BinaryFile { path });
            return Ok(OpenOutcome::Binary);
        };

        let key = self.allocate_key();
        let mut tab = Tab::new(key, file_label(&path));
        tab.file_path = Some(path.clone());
        tab.file_type = content_type.file_type_label();

        if len > self.config.large_file_threshold_bytes {
            tracing::info!("Loading {:?} ({} bytes) in the background", path, len);
            tab.buffer.set_read_only(true);
            tab.buffer.set_highlight_syntax(false);
            tab.buffer.begin_irreversible_action();
            let handle = loader::spawn_load(
                self.fs.clone(),
                path.clone(),
                key,
                self.async_bridge.sender(),
            )
            .map_err(|e| SessionError::io(&path, e))?;
            tab.load = Some(handle);
            tab.load_state = LoadState::Loading;
        } else {
            let bytes = match self.fs.read_file(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    dialogs.notify(Notice::OpenFailed {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    return Err(SessionError::io(path, e));
                }
            };
            tab.buffer = TextBuffer::from_text(&String::from_utf8_lossy(&bytes));
            tab.load_state = LoadState::Ready;
        }
        tab.buffer
            .set_language(content_type.language_for_buffer(self.config.allow_jellypie_formatting));

        self.tabs.insert(key, tab);
        self.order.push(key);
        self.active = Some(key);
        self.start_monitor(key, &path);
        self.register_path(&path, key);

        tracing::info!("Opened {:?} as tab {:?}", path, key);
        Ok(OpenOutcome::Opened(key))
    }

    /// Open several files; each one succeeds or fails on its own
    pub fn open_files(
        &mut self,
        paths: &[PathBuf],
        dialogs: &mut dyn Dialogs,
    ) -> Vec<Result<OpenOutcome, SessionError>> {
        paths
            .iter()
            .map(|path| self.open_file(path, dialogs))
            .collect()
    }

    /// Ask the shell for files and open them
    pub fn open_with_dialog(
        &mut self,
        dialogs: &mut dyn Dialogs,
    ) -> Vec<Result<OpenOutcome, SessionError>> {
        let paths = dialogs.choose_open_paths();
        self.open_files(&paths, dialogs)
    }

    /// Create an empty "Untitled N" tab and make it active
    pub fn new_tab(&mut self) -> TabKey {
        let key = self.allocate_key();
        let number = self.allocate_untitled_number();
        let mut tab = Tab::new(key, format!("Untitled {number}"));
        tab.untitled = Some(number);
        let content_type = ContentType::plain_text();
        tab.file_type = content_type.file_type_label();
        tab.buffer
            .set_language(content_type.language_for_buffer(self.config.allow_jellypie_formatting));

        self.tabs.insert(key, tab);
        self.order.push(key);
        self.active = Some(key);
        tracing::debug!("New untitled tab {:?} (Untitled {})", key, number);
        key
    }

    /// Open the configured to-do file, creating it when missing.
    ///
    /// Falls back to an untitled tab if the file cannot be opened.
    pub fn open_startup_file(&mut self, dialogs: &mut dyn Dialogs) -> TabKey {
        let path = self.config.todo_file_path();
        if !self.fs.exists(&path) {
            if let Err(e) = self.fs.write_file(&path, b"") {
                tracing::warn!("Could not create {:?}: {}", path, e);
                return self.new_tab();
            }
        }
        match self.open_file(&path, dialogs) {
            Ok(OpenOutcome::Opened(key)) | Ok(OpenOutcome::AlreadyOpen(key)) => key,
            Ok(outcome) => {
                tracing::warn!("Startup file {:?} not opened: {:?}", path, outcome);
                self.new_tab()
            }
            Err(e) => {
                tracing::warn!("Startup file not opened: {}", e);
                self.new_tab()
            }
        }
    }
}

/// Tab label for a file: its base name
pub(super) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
