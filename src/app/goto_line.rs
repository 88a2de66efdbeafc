use super::Session;

impl Session {
    /// Show the goto bar pre-filled with the current 1-based line.
    /// Hides the find bar.
    pub fn show_goto_line(&mut self) -> Option<String> {
        let tab = self.active_tab_mut()?;
        if tab.is_loading() {
            return None;
        }
        let current = (tab.buffer.cursor_line() + 1).to_string();
        tab.find_bar_visible = false;
        tab.cancel_navigation();
        tab.goto.visible = true;
        tab.goto.text = Some(current.clone());
        Some(current)
    }

    /// Move the cursor to the start of a 1-based line.
    ///
    /// Input other than digits is ignored. Out-of-range numbers are clamped
    /// to the first or last line. Returns the line moved to.
    pub fn go_to_line(&mut self, text: &str) -> Option<usize> {
        let tab = self.active_tab_mut()?;
        if tab.is_loading() {
            return None;
        }
        let text = text.trim();
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let requested = text.parse::<usize>().unwrap_or(usize::MAX).max(1);
        tab.goto.text = Some(requested.to_string());

        let line = (requested - 1).min(tab.buffer.line_count() - 1);
        let start = tab.buffer.line_start(line)?;
        tab.buffer.place_cursor(start);
        tab.goto.visible = false;
        Some(line + 1)
    }
}
