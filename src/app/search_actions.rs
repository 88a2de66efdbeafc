//! Find/replace on the active tab.
//!
//! Settings changes recount immediately. Navigation is queued and completed
//! by the next `pump`, with at most one outstanding request per tab.

use super::types::{PendingNavigation, TabKey};
use super::Session;
use crate::services::cancellation::CancellationToken;
use crate::services::search::{self, SearchDirection, SearchSettings};

impl Session {
    pub fn show_find_bar(&mut self) {
        if let Some(tab) = self.active_tab_mut() {
            tab.find_bar_visible = true;
            tab.goto.visible = false;
        }
        if let Some(key) = self.active {
            self.refresh_search(key);
        }
    }

    pub fn close_find_bar(&mut self) {
        if let Some(tab) = self.active_tab_mut() {
            tab.find_bar_visible = false;
            tab.cancel_navigation();
        }
    }

    /// Hide both the find bar and the goto bar
    pub fn escape(&mut self) {
        self.close_find_bar();
        if let Some(tab) = self.active_tab_mut() {
            tab.goto.visible = false;
        }
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.update_search_settings(|s| s.pattern = text.to_string());
    }

    pub fn set_case_sensitive(&mut self, enabled: bool) {
        self.update_search_settings(|s| s.case_sensitive = enabled);
    }

    pub fn set_whole_word(&mut self, enabled: bool) {
        self.update_search_settings(|s| s.whole_word = enabled);
    }

    pub fn set_use_regex(&mut self, enabled: bool) {
        self.update_search_settings(|s| s.use_regex = enabled);
    }

    fn update_search_settings(&mut self, update: impl FnOnce(&mut SearchSettings)) {
        let Some(key) = self.active else {
            return;
        };
        let Some(tab) = self.tabs.get_mut(&key) else {
            return;
        };
        if tab.is_loading() {
            return;
        }
        update(&mut tab.search.settings);
        self.refresh_search(key);
    }

    /// Recount matches and refresh the label and error indicator
    pub(super) fn refresh_search(&mut self, key: TabKey) {
        let Some(tab) = self.tabs.get_mut(&key) else {
            return;
        };
        if tab.is_loading() {
            return;
        }
        let regex = match search::compile(&tab.search.settings) {
            None => {
                tab.search.clear_result();
                return;
            }
            Some(Err(e)) => {
                tracing::debug!("Invalid search expression: {}", e);
                tab.search.set_result(-1, 0);
                tab.search.error = true;
                return;
            }
            Some(Ok(regex)) => regex,
        };

        let matches = search::find_matches(&regex, tab.buffer.text());
        if matches.is_empty() {
            tab.search.set_result(-1, 0);
            tab.search.error = true;
            return;
        }
        let index = tab
            .buffer
            .selection()
            .and_then(|sel| search::occurrence_position(&matches, &sel))
            .map(|i| i as i64)
            .unwrap_or(0);
        tab.search.set_result(index, matches.len() as i64);
        tab.search.error = false;
    }

    pub fn find_next(&mut self) {
        self.queue_navigation(SearchDirection::Forward);
    }

    pub fn find_previous(&mut self) {
        self.queue_navigation(SearchDirection::Backward);
    }

    /// Replace any outstanding navigation with a new request
    fn queue_navigation(&mut self, direction: SearchDirection) {
        let Some(tab) = self.active_tab_mut() else {
            return;
        };
        if tab.is_loading() {
            return;
        }
        tab.cancel_navigation();
        tab.pending_navigation = Some(PendingNavigation {
            direction,
            token: CancellationToken::new(),
        });
    }

    /// Complete a queued navigation: select the next match and update the label
    pub(super) fn complete_navigation(&mut self, key: TabKey) {
        let Some(tab) = self.tabs.get_mut(&key) else {
            return;
        };
        let Some(nav) = tab.pending_navigation.take() else {
            return;
        };
        if nav.token.is_cancelled() || tab.is_loading() {
            return;
        }
        let Some(Ok(regex)) = search::compile(&tab.search.settings) else {
            return;
        };

        let matches = search::find_matches(&regex, tab.buffer.text());
        let from = match (nav.direction, tab.buffer.selection()) {
            (SearchDirection::Forward, Some(sel)) => sel.end,
            (SearchDirection::Backward, Some(sel)) => sel.start,
            (_, None) => tab.buffer.cursor(),
        };

        match search::next_match(&matches, from, nav.direction) {
            Some(found) => {
                tab.buffer.select_range(found.start, found.end);
                let index = search::occurrence_position(&matches, &found).unwrap_or(0);
                tab.search.set_result(index as i64, matches.len() as i64);
                tab.search.error = false;
            }
            None => {
                tab.search.set_result(-1, 0);
                tab.search.error = true;
            }
        }
    }

    /// Replace the selected match and move on to the next one.
    ///
    /// Does nothing unless the selection is exactly a match.
    pub fn replace_one(&mut self, replacement: &str) -> bool {
        let Some(tab) = self.active_tab_mut() else {
            return false;
        };
        if tab.is_loading() {
            return false;
        }
        let Some(Ok(regex)) = search::compile(&tab.search.settings) else {
            return false;
        };
        let Some(selection) = tab.buffer.selection() else {
            return false;
        };
        let matches = search::find_matches(&regex, tab.buffer.text());
        if search::occurrence_position(&matches, &selection).is_none() {
            return false;
        }

        let replacement = search::unescape_search_text(replacement);
        let text = search::expand_replacement(
            &regex,
            tab.search.settings.use_regex,
            tab.buffer.text(),
            &selection,
            &replacement,
        );
        tab.buffer.begin_user_action();
        let replaced = tab.buffer.replace_range(selection, &text);
        tab.buffer.end_user_action();

        if replaced {
            self.find_next();
        }
        replaced
    }

    /// Replace every match in one undoable step; returns how many were replaced
    pub fn replace_all(&mut self, replacement: &str) -> usize {
        let Some(key) = self.active else {
            return 0;
        };
        let Some(tab) = self.tabs.get_mut(&key) else {
            return 0;
        };
        if tab.is_loading() || tab.buffer.is_read_only() {
            return 0;
        }
        let Some(Ok(regex)) = search::compile(&tab.search.settings) else {
            return 0;
        };
        let matches = search::find_matches(&regex, tab.buffer.text());
        if matches.is_empty() {
            tab.search.set_result(-1, 0);
            return 0;
        }

        let replacement = search::unescape_search_text(replacement);
        let use_regex = tab.search.settings.use_regex;
        let replacements: Vec<String> = matches
            .iter()
            .map(|m| {
                search::expand_replacement(&regex, use_regex, tab.buffer.text(), m, &replacement)
            })
            .collect();

        tab.buffer.block_notifications();
        tab.buffer.begin_user_action();
        for (range, text) in matches.iter().zip(&replacements).rev() {
            tab.buffer.replace_range(range.clone(), text);
        }
        tab.buffer.end_user_action();
        tab.buffer.unblock_notifications();

        tracing::debug!("Replaced {} matches in tab {:?}", matches.len(), key);
        self.refresh_search(key);
        matches.len()
    }
}
