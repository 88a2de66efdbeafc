//! Main-loop processing: worker messages, debounce timers, queued search
//! navigation and buffer-change notifications.

use super::dialogs::{Dialogs, ReloadResponse, RemovedResponse};
use super::types::{LoadState, TabKey};
use super::Session;
use crate::services::async_bridge::{AsyncMessage, FileEventKind};
use crate::services::cancellation::OperationId;
use crate::services::reconciler::{ChangeKind, EventDecision};
use std::path::Path;
use std::time::Instant;

impl Session {
    /// Run one main-loop iteration at `now`.
    ///
    /// Drains worker messages, fires due debounce timers, completes queued
    /// search navigation and re-runs searches after buffer edits.
    pub fn pump(&mut self, now: Instant, dialogs: &mut dyn Dialogs) {
        if self.closed {
            return;
        }
        for message in self.async_bridge.try_recv_all() {
            self.handle_async_message(message, dialogs);
        }

        for key in self.reconciler.take_due(now) {
            self.fire_file_timer(key, dialogs);
        }

        let keys: Vec<TabKey> = self.order.clone();
        for key in &keys {
            let refresh = match self.tabs.get_mut(key) {
                Some(tab) => tab.buffer.take_changed() && tab.find_bar_visible,
                None => false,
            };
            if refresh {
                self.refresh_search(*key);
            }
        }
        for key in keys {
            self.complete_navigation(key);
        }
    }

    pub(super) fn handle_async_message(
        &mut self,
        message: AsyncMessage,
        _dialogs: &mut dyn Dialogs,
    ) {
        match message {
            AsyncMessage::LoadChunk { key, op, text } => self.handle_load_chunk(key, op, &text),
            AsyncMessage::LoadFinished { key, op, error } => {
                self.handle_load_finished(key, op, error)
            }
            // Timed from when the watcher saw the change, not from when it
            // was drained
            AsyncMessage::FileEvent {
                path,
                kind,
                observed_at,
            } => {
                self.handle_file_event_at(&path, kind, observed_at);
            }
        }
    }

    /// Whether a load result for (key, op) still applies
    fn is_current_load(&self, key: TabKey, op: OperationId) -> bool {
        match self.tabs.get(&key) {
            Some(tab) => {
                tab.load_state == LoadState::Loading
                    && tab
                        .load
                        .as_ref()
                        .is_some_and(|load| load.op == op && !load.is_cancelled())
            }
            None => false,
        }
    }

    fn handle_load_chunk(&mut self, key: TabKey, op: OperationId, text: &str) {
        if !self.is_current_load(key, op) {
            tracing::debug!("Dropping stale load chunk for tab {:?}", key);
            return;
        }
        if let Some(tab) = self.tabs.get_mut(&key) {
            tab.buffer.append_loaded(text);
        }
    }

    fn handle_load_finished(&mut self, key: TabKey, op: OperationId, error: Option<String>) {
        if !self.is_current_load(key, op) {
            tracing::debug!("Dropping stale load completion for tab {:?}", key);
            return;
        }
        let Some(tab) = self.tabs.get_mut(&key) else {
            return;
        };
        tab.load = None;
        tab.load_state = LoadState::Ready;
        tab.buffer.end_irreversible_action();
        tab.buffer.set_read_only(false);
        tab.buffer.set_highlight_syntax(true);
        tab.buffer.set_modified(false);
        tab.buffer.place_cursor(0);
        match error {
            Some(error) => tracing::warn!("Loading tab {:?} stopped early: {}", key, error),
            None => tracing::info!("Finished loading tab {:?}", key),
        }
    }

    /// Feed a raw file event observed at `now` into the reconciler
    pub fn handle_file_event_at(
        &mut self,
        path: &Path,
        kind: FileEventKind,
        now: Instant,
    ) -> Option<EventDecision> {
        let key = self.monitors.tab_for(path)?;
        if !self.tabs.contains_key(&key) {
            return None;
        }
        tracing::debug!("File event {:?} for {:?}", kind, path);
        Some(self.reconciler.on_event(key, now))
    }

    /// A debounce timer fired: classify and prompt or defer
    fn fire_file_timer(&mut self, key: TabKey, dialogs: &mut dyn Dialogs) {
        let Some(path) = self.tabs.get(&key).and_then(|t| t.file_path.clone()) else {
            return;
        };
        let kind = if self.fs.exists(&path) {
            ChangeKind::Changed
        } else {
            ChangeKind::Removed
        };

        if self.active == Some(key) {
            self.prompt_file_change(key, kind, dialogs);
        } else {
            tracing::debug!("Deferring {:?} prompt for background tab {:?}", kind, key);
            self.reconciler.queue_reload(key, kind);
        }
    }

    /// Ask the user how to reconcile an external change
    pub(super) fn prompt_file_change(
        &mut self,
        key: TabKey,
        kind: ChangeKind,
        dialogs: &mut dyn Dialogs,
    ) {
        let Some(tab) = self.tabs.get(&key) else {
            return;
        };
        let label = tab.label.clone();
        let suggested = tab
            .file_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| label.clone());
        self.reconciler.begin_prompt(key);
        match kind {
            ChangeKind::Changed => {
                if dialogs.confirm_reload(&label) == ReloadResponse::Reload {
                    self.reload_from_disk(key);
                }
            }
            ChangeKind::Removed => {
                if dialogs.confirm_removed(&label) == RemovedResponse::SaveAs {
                    self.save_as(key, &suggested, dialogs);
                }
            }
        }
        self.reconciler.end_prompt(key);
    }
}
