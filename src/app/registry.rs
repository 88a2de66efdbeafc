//! Process-wide record of which window holds which file.
//!
//! Every session (window) of a process shares one [`OpenFileRegistry`] so a
//! file is never open in two windows at once.

use super::errors::SessionError;
use super::types::TabKey;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Registry shared by the sessions of one process
pub type SharedRegistry = Rc<RefCell<OpenFileRegistry>>;

#[derive(Debug, Default)]
pub struct OpenFileRegistry {
    entries: HashMap<PathBuf, (WindowId, TabKey)>,
}

impl OpenFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Associate `path` with (window, tab).
    ///
    /// Re-registering the same association is fine; a path held by a
    /// different window or tab is rejected.
    pub fn register(
        &mut self,
        path: &Path,
        window: WindowId,
        key: TabKey,
    ) -> Result<(), SessionError> {
        match self.entries.get(path) {
            Some(holder) if *holder != (window, key) => Err(SessionError::DuplicateRegistration {
                path: path.to_path_buf(),
            }),
            _ => {
                self.entries.insert(path.to_path_buf(), (window, key));
                Ok(())
            }
        }
    }

    pub fn holder(&self, path: &Path) -> Option<(WindowId, TabKey)> {
        self.entries.get(path).copied()
    }

    /// Remove the association if (window, tab) still holds it
    pub fn unregister(&mut self, path: &Path, window: WindowId, key: TabKey) {
        if self.entries.get(path) == Some(&(window, key)) {
            self.entries.remove(path);
        }
    }

    pub fn unregister_window(&mut self, window: WindowId) {
        self.entries.retain(|_, (w, _)| *w != window);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
