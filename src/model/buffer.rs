/// In-memory document buffer: text, cursor/selection, undo groups and a
/// polled "changed" notification.
///
/// Offsets are byte offsets into UTF-8 text. Every offset passed in is
/// clamped to the text length and moved back to a char boundary, so callers
/// never split a multi-byte character.
use std::ops::Range;

/// One reversible edit: `deleted` was replaced by `inserted` at `offset`
#[derive(Debug, Clone, PartialEq)]
struct Edit {
    offset: usize,
    deleted: String,
    inserted: String,
}

/// Edits undone/redone together (one user action)
type UndoGroup = Vec<Edit>;

#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
    selection: Option<Range<usize>>,
    modified: bool,
    read_only: bool,
    highlight_syntax: bool,
    language: Option<String>,

    undo_stack: Vec<UndoGroup>,
    redo_stack: Vec<UndoGroup>,
    /// Nesting depth of begin_user_action/end_user_action
    user_action_depth: usize,
    open_group: UndoGroup,
    /// Nesting depth of begin_irreversible_action; edits made inside are not recorded
    irreversible_depth: usize,

    /// Nesting depth of block_notifications; edits made inside do not raise `changed`
    notifications_blocked: usize,
    changed: bool,

    /// Line bookmarks as offsets; they stay put on inserts at their position
    marks: Vec<usize>,
}

impl TextBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            highlight_syntax: true,
            ..Default::default()
        }
    }

    /// Create a buffer holding `text`, unmodified, cursor at the start
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.text = text.to_string();
        buffer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace all content. Not undoable: the undo history is cleared.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = 0;
        self.selection = None;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group.clear();
        self.marks.clear();
        self.modified = true;
        self.notify_changed();
    }

    /// Append text produced by a background load. Bypasses read-only and undo.
    pub(crate) fn append_loaded(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.notify_changed();
    }

    // ---- Modified / read-only / highlighting state ----

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn highlight_syntax(&self) -> bool {
        self.highlight_syntax
    }

    pub fn set_highlight_syntax(&mut self, enabled: bool) {
        self.highlight_syntax = enabled;
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, language: Option<String>) {
        self.language = language;
    }

    // ---- Cursor and selection ----

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clearing any selection
    pub fn place_cursor(&mut self, offset: usize) {
        self.cursor = self.clamp(offset);
        self.selection = None;
    }

    /// Select `start..end`; the cursor moves to `end`
    pub fn select_range(&mut self, start: usize, end: usize) {
        let (start, end) = (self.clamp(start.min(end)), self.clamp(start.max(end)));
        self.cursor = end;
        self.selection = if start == end { None } else { Some(start..end) };
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selection.as_ref().map(|r| &self.text[r.clone()])
    }

    // ---- Lines ----

    /// Number of lines; an empty buffer has one line and a trailing newline
    /// starts a new (empty) line.
    pub fn line_count(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    /// Zero-based line containing `offset`
    pub fn line_of_offset(&self, offset: usize) -> usize {
        let offset = self.clamp(offset);
        self.text[..offset].matches('\n').count()
    }

    pub fn cursor_line(&self) -> usize {
        self.line_of_offset(self.cursor)
    }

    /// Byte offset where zero-based `line` starts
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return Some(0);
        }
        self.text
            .match_indices('\n')
            .nth(line - 1)
            .map(|(pos, _)| pos + 1)
    }

    /// Byte range of zero-based `line`, excluding its newline
    pub fn line_range(&self, line: usize) -> Option<Range<usize>> {
        let start = self.line_start(line)?;
        let end = self.text[start..]
            .find('\n')
            .map(|pos| start + pos)
            .unwrap_or(self.text.len());
        Some(start..end)
    }

    // ---- Editing ----

    /// Insert at `offset`. Returns false if the buffer is read-only.
    pub fn insert(&mut self, offset: usize, text: &str) -> bool {
        let offset = self.clamp(offset);
        self.replace_range(offset..offset, text)
    }

    /// Insert at the cursor
    pub fn insert_at_cursor(&mut self, text: &str) -> bool {
        self.insert(self.cursor, text)
    }

    pub fn delete(&mut self, range: Range<usize>) -> bool {
        self.replace_range(range, "")
    }

    /// Replace `range` with `text`. Returns false if the buffer is read-only.
    ///
    /// The cursor follows the edit: positions after the range shift by the
    /// length difference, positions inside it land after the inserted text.
    /// The selection is cleared.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) -> bool {
        if self.read_only {
            return false;
        }
        let start = self.clamp(range.start.min(range.end));
        let end = self.clamp(range.start.max(range.end));
        if start == end && text.is_empty() {
            return true;
        }

        let deleted = self.text[start..end].to_string();
        self.text.replace_range(start..end, text);
        self.shift_marks(start, end, text.len());

        self.cursor = if self.cursor >= end {
            self.cursor - (end - start) + text.len()
        } else if self.cursor > start {
            start + text.len()
        } else {
            self.cursor
        };
        self.selection = None;
        self.modified = true;

        if self.irreversible_depth == 0 {
            let edit = Edit {
                offset: start,
                deleted,
                inserted: text.to_string(),
            };
            if self.user_action_depth > 0 {
                self.open_group.push(edit);
            } else {
                self.undo_stack.push(vec![edit]);
            }
            self.redo_stack.clear();
        }

        self.notify_changed();
        true
    }

    // ---- Undo grouping ----

    /// Start a user action; edits until the matching `end_user_action` undo together
    pub fn begin_user_action(&mut self) {
        self.user_action_depth += 1;
    }

    pub fn end_user_action(&mut self) {
        if self.user_action_depth == 0 {
            return;
        }
        self.user_action_depth -= 1;
        if self.user_action_depth == 0 && !self.open_group.is_empty() {
            let group = std::mem::take(&mut self.open_group);
            self.undo_stack.push(group);
        }
    }

    /// Start a region whose edits are not recorded (used while loading)
    pub fn begin_irreversible_action(&mut self) {
        self.irreversible_depth += 1;
    }

    /// End an irreversible region; the undo history is reset
    pub fn end_irreversible_action(&mut self) {
        if self.irreversible_depth == 0 {
            return;
        }
        self.irreversible_depth -= 1;
        if self.irreversible_depth == 0 {
            self.undo_stack.clear();
            self.redo_stack.clear();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo the last group. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        let Some(group) = self.undo_stack.pop() else {
            return false;
        };
        for edit in group.iter().rev() {
            let end = edit.offset + edit.inserted.len();
            self.text.replace_range(edit.offset..end, &edit.deleted);
            self.shift_marks(edit.offset, end, edit.deleted.len());
            self.cursor = edit.offset + edit.deleted.len();
        }
        self.redo_stack.push(group);
        self.selection = None;
        self.modified = true;
        self.notify_changed();
        true
    }

    /// Redo the last undone group
    pub fn redo(&mut self) -> bool {
        if self.read_only {
            return false;
        }
        let Some(group) = self.redo_stack.pop() else {
            return false;
        };
        for edit in &group {
            let end = edit.offset + edit.deleted.len();
            self.text.replace_range(edit.offset..end, &edit.inserted);
            self.shift_marks(edit.offset, end, edit.inserted.len());
            self.cursor = edit.offset + edit.inserted.len();
        }
        self.undo_stack.push(group);
        self.selection = None;
        self.modified = true;
        self.notify_changed();
        true
    }

    // ---- Bookmarks ----

    /// Add a bookmark at the start of zero-based `line`, or remove the one
    /// already on it. Returns whether the line is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self, line: usize) -> bool {
        let Some(start) = self.line_start(line) else {
            return false;
        };
        if let Some(index) = self
            .marks
            .iter()
            .position(|offset| self.line_of_offset(*offset) == line)
        {
            self.marks.remove(index);
            false
        } else {
            self.marks.push(start);
            true
        }
    }

    /// Zero-based lines carrying a bookmark, ascending
    pub fn bookmarked_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self
            .marks
            .iter()
            .map(|offset| self.line_of_offset(*offset))
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    /// Move marks after `start..end` was replaced by `inserted_len` bytes
    fn shift_marks(&mut self, start: usize, end: usize, inserted_len: usize) {
        for offset in &mut self.marks {
            if *offset >= end && *offset > start {
                *offset = *offset - (end - start) + inserted_len;
            } else if *offset > start {
                *offset = start;
            }
        }
    }

    // ---- Change notifications ----

    /// Suppress `changed` notifications until the matching unblock
    pub fn block_notifications(&mut self) {
        self.notifications_blocked += 1;
    }

    pub fn unblock_notifications(&mut self) {
        self.notifications_blocked = self.notifications_blocked.saturating_sub(1);
    }

    /// Returns whether the content changed since the last call, and resets it
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn notify_changed(&mut self) {
        if self.notifications_blocked == 0 {
            self.changed = true;
        }
    }

    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
