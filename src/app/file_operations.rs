//! Saving documents and re-reading them from disk.

use super::file_open::file_label;
use super::{normalize_path, Dialogs, Notice, Session};
use super::types::TabKey;
use crate::model::content_type::ContentType;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Suffix added to the label of files written with elevated privileges
pub const ADMIN_SUFFIX: &str = " [Admin]";

impl Session {
    /// Save a tab to its file, or ask for a destination if it has none.
    ///
    /// Returns whether the document was written.
    pub fn save_current(&mut self, key: TabKey, dialogs: &mut dyn Dialogs) -> bool {
        let Some(tab) = self.tabs.get(&key) else {
            return false;
        };
        if tab.is_loading() {
            tracing::debug!("Not saving tab {:?} while it is loading", key);
            return false;
        }
        match tab.file_path.clone() {
            Some(path) => self.write_to(key, &path, dialogs),
            None => {
                let suggested = tab.label.clone();
                self.save_as(key, &suggested, dialogs)
            }
        }
    }

    /// Ask for a destination and save the tab there
    pub fn save_as(&mut self, key: TabKey, suggested_name: &str, dialogs: &mut dyn Dialogs) -> bool {
        match self.tabs.get(&key) {
            Some(tab) if !tab.is_loading() => {}
            _ => return false,
        }
        let Some(path) = dialogs.choose_save_path(suggested_name) else {
            tracing::debug!("Save as cancelled for tab {:?}", key);
            return false;
        };
        let path = normalize_path(&path);
        if let Some(notice) = self.held_by_other_tab(key, &path) {
            tracing::info!("Refusing to save tab {:?} over {:?}: {}", key, path, notice);
            dialogs.notify(notice);
            return false;
        }
        self.write_to(key, &path, dialogs)
    }

    /// Notice to show when `path` already backs a tab other than `key`
    fn held_by_other_tab(&self, key: TabKey, path: &Path) -> Option<Notice> {
        if self.find_tab_by_path(path).is_some_and(|other| other != key) {
            return Some(Notice::AlreadyOpenInTab {
                path: path.to_path_buf(),
            });
        }
        match self.registry.borrow().holder(path) {
            Some((window, _)) if window != self.window => Some(Notice::AlreadyOpenElsewhere {
                path: path.to_path_buf(),
            }),
            Some((_, holder)) if holder != key => Some(Notice::AlreadyOpenInTab {
                path: path.to_path_buf(),
            }),
            _ => None,
        }
    }

    /// Write the tab's text to `path` with a guaranteed trailing newline,
    /// falling back to an elevated write on permission errors
    fn write_to(&mut self, key: TabKey, path: &Path, dialogs: &mut dyn Dialogs) -> bool {
        let Some(tab) = self.tabs.get(&key) else {
            return false;
        };
        let mut contents = tab.buffer.text().to_string();
        if !contents.ends_with('\n') {
            contents.push('\n');
        }

        let elevated = match self.fs.write_file(path, contents.as_bytes()) {
            Ok(()) => false,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                tracing::info!("Permission denied writing {:?}, retrying elevated", path);
                match self.elevated.write(path, contents.as_bytes()) {
                    Ok(()) => true,
                    Err(e) => {
                        self.report_save_failure(path, &e, dialogs);
                        return false;
                    }
                }
            }
            Err(e) => {
                self.report_save_failure(path, &e, dialogs);
                return false;
            }
        };

        if elevated {
            self.admin_files.insert(path.to_path_buf());
        } else {
            self.admin_files.remove(path);
        }
        self.after_save(key, path, contents.as_bytes());
        true
    }

    fn report_save_failure(&self, path: &Path, error: &io::Error, dialogs: &mut dyn Dialogs) {
        tracing::warn!("Saving {:?} failed: {}", path, error);
        dialogs.notify(Notice::SaveFailed {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    /// Bookkeeping after a successful write
    fn after_save(&mut self, key: TabKey, path: &Path, written: &[u8]) {
        let admin = self.is_admin_file(path);
        let allow_formatting = self.config.allow_jellypie_formatting;
        let content_type = ContentType::sniff(path, written).unwrap_or_else(ContentType::plain_text);

        let Some(tab) = self.tabs.get_mut(&key) else {
            return;
        };
        let old_path = tab.file_path.replace(path.to_path_buf());
        tab.untitled = None;
        tab.buffer
            .set_language(content_type.language_for_buffer(allow_formatting));
        tab.file_type = content_type.file_type_label();
        tab.buffer.set_modified(false);
        tab.label = file_label(path);
        if admin {
            tab.label.push_str(ADMIN_SUFFIX);
        }

        if let Some(old) = old_path.filter(|old| old != path) {
            self.monitors.cancel(&old);
            self.unregister_path(&old, key);
        }
        // Saves may replace the inode, so the watch is always re-created
        self.monitors.cancel(path);
        self.start_monitor(key, path);
        self.reconciler.record_save(key, Instant::now());
        self.register_path(path, key);

        tracing::info!("Saved tab {:?} to {:?}", key, path);
    }

    /// Replace a tab's content with the file on disk and clear modified
    pub(super) fn reload_from_disk(&mut self, key: TabKey) -> bool {
        let Some(path) = self.tabs.get(&key).and_then(|t| t.file_path.clone()) else {
            return false;
        };
        let bytes = match self.fs.read_file(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Reloading {:?} failed: {}", path, e);
                return false;
            }
        };
        let Some(tab) = self.tabs.get_mut(&key) else {
            return false;
        };
        tab.buffer.set_text(&String::from_utf8_lossy(&bytes));
        tab.buffer.set_modified(false);
        tracing::info!("Reloaded {:?} from disk", path);
        true
    }

    /// Paths of all path-backed tabs, in page order
    pub fn open_paths(&self) -> Vec<PathBuf> {
        self.order
            .iter()
            .filter_map(|key| self.tabs.get(key))
            .filter_map(|tab| tab.file_path.clone())
            .collect()
    }
}
