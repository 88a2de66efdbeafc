//! To-do list editing: marking items done and inline formatting markers.

use super::Session;
use chrono::{Local, NaiveDateTime};

/// Prefix of a completed item
pub const DONE_MARK: &str = "✓ ";

/// Timestamp appended to a completed item
pub const DONE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

impl Session {
    /// Mark the cursor line done with the current local time
    pub fn mark_done(&mut self) -> bool {
        self.mark_done_at(Local::now().naive_local())
    }

    /// Move the cursor line to the end of the buffer as
    /// `✓ <line> [<timestamp>]`, as one undoable step.
    ///
    /// Blank lines are left alone.
    pub fn mark_done_at(&mut self, now: NaiveDateTime) -> bool {
        let Some(tab) = self.active_tab_mut() else {
            return false;
        };
        if tab.is_loading() || tab.buffer.is_read_only() {
            return false;
        }
        let buffer = &mut tab.buffer;
        let line = buffer.cursor_line();
        let Some(range) = buffer.line_range(line) else {
            return false;
        };
        let line_text = buffer.text()[range.clone()].to_string();
        if line_text.trim().is_empty() {
            return false;
        }
        let marked = format!(
            "{DONE_MARK}{line_text} [{}]",
            now.format(DONE_TIMESTAMP_FORMAT)
        );

        // Take the newline with the line when there is one
        let delete_end = if range.end < buffer.len() {
            range.end + 1
        } else {
            range.end
        };

        buffer.begin_user_action();
        buffer.delete(range.start..delete_end);
        if !buffer.is_empty() && !buffer.text().ends_with('\n') {
            buffer.insert(buffer.len(), "\n");
        }
        buffer.insert(buffer.len(), &format!("{marked}\n"));
        buffer.end_user_action();
        true
    }

    pub fn format_bold(&mut self) -> bool {
        self.apply_formatting("**", "**")
    }

    pub fn format_italic(&mut self) -> bool {
        self.apply_formatting("*", "*")
    }

    pub fn format_monospace(&mut self) -> bool {
        self.apply_formatting("`", "`")
    }

    /// Wrap the selection in markers, or insert an empty pair at the cursor
    /// and place the cursor between them
    fn apply_formatting(&mut self, prefix: &str, suffix: &str) -> bool {
        let Some(tab) = self.active_tab_mut() else {
            return false;
        };
        if tab.is_loading() || tab.buffer.is_read_only() {
            return false;
        }
        let buffer = &mut tab.buffer;

        buffer.begin_user_action();
        match buffer.selection() {
            Some(selection) => {
                let selected = buffer.text()[selection.clone()].to_string();
                buffer.replace_range(selection, &format!("{prefix}{selected}{suffix}"));
            }
            None => {
                let at = buffer.cursor();
                buffer.insert(at, &format!("{prefix}{suffix}"));
                buffer.place_cursor(at + prefix.len());
            }
        }
        buffer.end_user_action();
        true
    }
}
