//! Tab lifecycle: closing tabs and the window, switching between tabs.

use super::dialogs::{CloseResponse, Dialogs, UnsavedRow, WindowCloseResponse};
use super::types::{CloseOutcome, LoadState, SaveGate, TabKey, TabView, WindowCloseOutcome};
use super::Session;

impl Session {
    /// Close a tab, asking first if it has unsaved changes.
    ///
    /// A tab that is still loading closes without asking. Closing the last
    /// tab leaves a fresh untitled tab behind.
    pub fn close_tab(&mut self, key: TabKey, dialogs: &mut dyn Dialogs) -> CloseOutcome {
        let Some(tab) = self.tabs.get(&key) else {
            return CloseOutcome::Cancelled;
        };

        if !tab.is_loading() && tab.is_modified() {
            let label = tab.label.clone();
            match dialogs.confirm_close(&label) {
                CloseResponse::Cancel => return CloseOutcome::Cancelled,
                CloseResponse::Discard => {}
                CloseResponse::Save => {
                    if !self.save_current(key, dialogs) {
                        return CloseOutcome::SaveFailed;
                    }
                }
            }
        }

        self.remove_tab(key, dialogs);
        CloseOutcome::Closed
    }

    /// Tear down a tab without asking
    fn remove_tab(&mut self, key: TabKey, dialogs: &mut dyn Dialogs) {
        let Some(mut tab) = self.tabs.remove(&key) else {
            return;
        };
        // Stop async work before anything is released
        tab.load_state = LoadState::Closed;
        tab.cancel_load();
        tab.cancel_navigation();

        self.monitors.cancel_tab(key);
        if let Some(path) = tab.file_path.as_deref() {
            self.unregister_path(path, key);
        }
        self.reconciler.forget(key);

        let position = self.order.iter().position(|k| *k == key);
        self.order.retain(|k| *k != key);
        tracing::info!("Closed tab {:?} ({})", key, tab.label);
        drop(tab);

        if self.order.is_empty() {
            self.active = None;
            if !self.closed {
                self.new_tab();
            }
            return;
        }
        if self.active == Some(key) {
            let index = position.unwrap_or(0).min(self.order.len() - 1);
            let next = self.order[index];
            self.switch_active_tab(next, dialogs);
        }
    }

    /// Close the window, asking about every modified document.
    ///
    /// With "save selected" the window only closes once every checked
    /// document has been saved; any failure keeps it open.
    pub fn close_window(&mut self, dialogs: &mut dyn Dialogs) -> WindowCloseOutcome {
        let dirty: Vec<TabKey> = self
            .order
            .iter()
            .copied()
            .filter(|key| self.tabs.get(key).is_some_and(|t| t.is_modified()))
            .collect();

        if dirty.is_empty() {
            self.finalize_close();
            return WindowCloseOutcome::Closed;
        }

        let mut rows: Vec<UnsavedRow> = dirty
            .iter()
            .filter_map(|key| self.tabs.get(key))
            .map(|tab| UnsavedRow {
                label: tab.label.clone(),
                checked: true,
            })
            .collect();

        match dialogs.confirm_window_close(&mut rows) {
            WindowCloseResponse::Cancel => WindowCloseOutcome::Cancelled,
            WindowCloseResponse::DiscardAll => {
                self.finalize_close();
                WindowCloseOutcome::Closed
            }
            WindowCloseResponse::SaveSelected => {
                let selected: Vec<TabKey> = dirty
                    .iter()
                    .zip(rows.iter())
                    .filter(|(_, row)| row.checked)
                    .map(|(key, _)| *key)
                    .collect();

                let mut gate = SaveGate::new(selected.len());
                for key in selected {
                    let saved = self.save_current(key, dialogs);
                    gate.complete(saved);
                }
                if gate.is_open() {
                    self.finalize_close();
                    WindowCloseOutcome::Closed
                } else {
                    tracing::info!("Window close aborted: not every document was saved");
                    WindowCloseOutcome::SaveFailed
                }
            }
        }
    }

    /// Release everything the window holds
    fn finalize_close(&mut self) {
        self.closed = true;
        for tab in self.tabs.values_mut() {
            tab.load_state = LoadState::Closed;
            tab.cancel_load();
            tab.cancel_navigation();
        }
        self.monitors.clear();
        self.reconciler.clear();
        self.registry.borrow_mut().unregister_window(self.window);
        self.tabs.clear();
        self.order.clear();
        self.active = None;
        tracing::info!("Window {:?} closed", self.window);
    }

    /// Make `key` the active tab and return its UI state.
    ///
    /// A file change queued while the tab was in the background is
    /// prompted for now.
    pub fn switch_active_tab(&mut self, key: TabKey, dialogs: &mut dyn Dialogs) -> Option<TabView> {
        if !self.tabs.contains_key(&key) {
            return None;
        }
        self.active = Some(key);

        if let Some(kind) = self.reconciler.take_pending_reload(key) {
            self.prompt_file_change(key, kind, dialogs);
        }
        if self.tabs.get(&key).is_some_and(|t| t.find_bar_visible) {
            self.refresh_search(key);
        }
        self.tab_view(key)
    }

    /// Activate the next tab in page order, wrapping around
    pub fn next_tab(&mut self, dialogs: &mut dyn Dialogs) -> Option<TabView> {
        self.cycle_tab(1, dialogs)
    }

    /// Activate the previous tab in page order, wrapping around
    pub fn previous_tab(&mut self, dialogs: &mut dyn Dialogs) -> Option<TabView> {
        self.cycle_tab(-1, dialogs)
    }

    fn cycle_tab(&mut self, step: isize, dialogs: &mut dyn Dialogs) -> Option<TabView> {
        if self.order.len() < 2 {
            return None;
        }
        let current = self
            .active
            .and_then(|key| self.order.iter().position(|k| *k == key))
            .unwrap_or(0);
        let len = self.order.len() as isize;
        let next = (current as isize + step).rem_euclid(len) as usize;
        let key = self.order[next];
        self.switch_active_tab(key, dialogs)
    }

    /// Snapshot of a tab's UI state
    pub fn tab_view(&self, key: TabKey) -> Option<TabView> {
        let tab = self.tabs.get(&key)?;
        let title = if tab.is_modified() {
            format!("* {}", tab.label)
        } else {
            tab.label.clone()
        };
        Some(TabView {
            key,
            label: tab.label.clone(),
            title,
            file_type: tab.file_type.clone(),
            search: tab.search.clone(),
            goto: tab.goto.clone(),
            find_bar_visible: tab.find_bar_visible,
            search_enabled: !tab.is_loading(),
            loading: tab.is_loading(),
        })
    }
}
