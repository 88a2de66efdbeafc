//! Typed input and per-line editor state: auto-closed pairs, overwrite
//! mode, line bookmarks and the cursor status line.

use super::types::Tab;
use super::Session;

/// Opening characters that insert their closing partner when typed
pub const AUTO_PAIRS: [(char, char); 7] = [
    ('\'', '\''),
    ('"', '"'),
    ('(', ')'),
    ('[', ']'),
    ('`', '`'),
    ('{', '}'),
    ('<', '>'),
];

pub fn closing_pair(open: char) -> Option<char> {
    AUTO_PAIRS
        .iter()
        .find(|(candidate, _)| *candidate == open)
        .map(|(_, close)| *close)
}

impl Session {
    /// Type `text` into the active tab as one user action.
    ///
    /// A single opening character from [`AUTO_PAIRS`] inserts the pair and
    /// leaves the cursor between them. A selection is replaced. In overwrite
    /// mode typed characters replace the ones after the cursor, up to the
    /// end of the line.
    pub fn type_text(&mut self, text: &str) -> bool {
        let Some(tab) = self.active_tab_mut() else {
            return false;
        };
        if tab.is_loading() || tab.buffer.is_read_only() || text.is_empty() {
            return false;
        }
        let overwrite = tab.overwrite;
        let buffer = &mut tab.buffer;

        let mut chars = text.chars();
        let pair = match (chars.next(), chars.next()) {
            (Some(open), None) => closing_pair(open).map(|close| (open, close)),
            _ => None,
        };

        buffer.begin_user_action();
        if let Some((open, close)) = pair {
            let at = buffer.cursor();
            buffer.insert(at, &format!("{open}{close}"));
            buffer.place_cursor(at + open.len_utf8());
        } else if let Some(selection) = buffer.selection() {
            buffer.replace_range(selection, text);
        } else if overwrite {
            let start = buffer.cursor();
            let line_end = buffer
                .line_range(buffer.cursor_line())
                .map(|range| range.end)
                .unwrap_or(start);
            let typed = text.chars().take_while(|c| *c != '\n').count();
            let end = buffer.text()[start..line_end]
                .char_indices()
                .nth(typed)
                .map(|(offset, _)| start + offset)
                .unwrap_or(line_end);
            buffer.replace_range(start..end, text);
            buffer.place_cursor(start + text.len());
        } else {
            buffer.insert_at_cursor(text);
        }
        buffer.end_user_action();
        true
    }

    /// Switch the active tab between insert and overwrite mode.
    /// Returns the new overwrite state.
    pub fn toggle_overwrite(&mut self) -> Option<bool> {
        let tab = self.active_tab_mut()?;
        tab.overwrite = !tab.overwrite;
        tracing::debug!("Overwrite mode {} for tab {:?}", tab.overwrite, tab.key);
        Some(tab.overwrite)
    }

    /// Toggle the bookmark on 1-based `line` of the active tab.
    /// Returns whether the line is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, line: usize) -> Option<bool> {
        let tab = self.active_tab_mut()?;
        let line = line.checked_sub(1)?;
        if line >= tab.buffer.line_count() {
            return None;
        }
        Some(tab.buffer.toggle_bookmark(line))
    }

    pub fn toggle_bookmark_at_cursor(&mut self) -> Option<bool> {
        let line = self.active_tab_mut()?.buffer.cursor_line();
        self.toggle_bookmark(line + 1)
    }

    /// `row:col     INS|OVR     filetype` for the active tab, 1-based.
    /// None while the tab is loading.
    pub fn status_line(&self) -> Option<String> {
        let tab = self.active.and_then(|key| self.tabs.get(&key))?;
        if tab.is_loading() {
            return None;
        }
        Some(status_text(tab))
    }
}

fn status_text(tab: &Tab) -> String {
    let buffer = &tab.buffer;
    let row = buffer.cursor_line();
    let line_start = buffer.line_start(row).unwrap_or(0);
    let col = buffer.text()[line_start..buffer.cursor()].chars().count();
    let mode = if tab.overwrite { "OVR" } else { "INS" };

    let mut text = format!("{}:{}     {}", row + 1, col + 1, mode);
    if !tab.file_type.is_empty() {
        text.push_str("     ");
        text.push_str(&tab.file_type);
    }
    text
}
