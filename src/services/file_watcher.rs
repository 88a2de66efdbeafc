//! Per-tab file monitors.
//!
//! Every path-backed tab gets one registration: path -> (tab, OS watcher).
//! The watcher observes the parent directory rather than the file itself so
//! it survives saves that replace the inode (temp file + rename), and only
//! forwards events naming the registered path.

use crate::app::types::TabKey;
use crate::services::async_bridge::{AsyncMessage, FileEventKind};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Instant;

struct Monitor {
    key: TabKey,
    /// None when watching is disabled; the registration still exists
    _watcher: Option<RecommendedWatcher>,
}

/// Registry of file monitors, at most one per path
#[derive(Default)]
pub struct FileMonitors {
    monitors: HashMap<PathBuf, Monitor>,
}

impl std::fmt::Debug for FileMonitors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.monitors.iter().map(|(path, m)| (path, m.key)))
            .finish()
    }
}

impl FileMonitors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a monitor for `path`, replacing the tab's previous one.
    ///
    /// With a sender an OS watcher is started; without one only the
    /// registration is recorded. A path monitored for another tab is refused.
    pub fn watch(
        &mut self,
        path: &Path,
        key: TabKey,
        sender: Option<Sender<AsyncMessage>>,
    ) -> Result<(), notify::Error> {
        if let Some(owner) = self.tab_for(path).filter(|owner| *owner != key) {
            return Err(notify::Error::generic(&format!(
                "already monitored for tab {}",
                owner.0
            ))
            .add_path(path.to_path_buf()));
        }
        self.monitors.remove(path);

        let watcher = match sender {
            Some(sender) => Some(start_watcher(path, sender)?),
            None => None,
        };
        self.monitors.insert(
            path.to_path_buf(),
            Monitor {
                key,
                _watcher: watcher,
            },
        );
        Ok(())
    }

    /// Drop the monitor for `path`; returns whether one existed
    pub fn cancel(&mut self, path: &Path) -> bool {
        self.monitors.remove(path).is_some()
    }

    /// Drop every monitor owned by `key`
    pub fn cancel_tab(&mut self, key: TabKey) {
        self.monitors.retain(|_, m| m.key != key);
    }

    pub fn clear(&mut self) {
        self.monitors.clear();
    }

    /// Tab watching `path`
    pub fn tab_for(&self, path: &Path) -> Option<TabKey> {
        self.monitors.get(path).map(|m| m.key)
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.monitors.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

/// Map a notify event kind onto the kinds the reconciler handles
pub fn classify_event(kind: &EventKind) -> Option<FileEventKind> {
    match kind {
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileEventKind::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) | EventKind::Create(_) => Some(FileEventKind::Changed),
        EventKind::Remove(_) => Some(FileEventKind::Deleted),
        _ => None,
    }
}

fn start_watcher(
    path: &Path,
    sender: Sender<AsyncMessage>,
) -> Result<RecommendedWatcher, notify::Error> {
    let target = path.to_path_buf();
    let watch_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut watcher =
        notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                let Some(kind) = classify_event(&event.kind) else {
                    return;
                };
                if !event.paths.iter().any(|p| p == &target) {
                    return;
                }
                if let Err(e) = sender.send(AsyncMessage::FileEvent {
                    path: target.clone(),
                    kind,
                    observed_at: Instant::now(),
                }) {
                    tracing::debug!("File event for {:?} dropped: {}", target, e);
                }
            }
            Err(e) => {
                tracing::warn!("File watcher error: {}", e);
            }
        })?;

    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching {:?} via {:?}", path, watch_dir);
    Ok(watcher)
}
