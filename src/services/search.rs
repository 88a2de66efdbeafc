//! Search engine behind the find bar.
//!
//! Builds the effective expression from the user's pattern and flags, finds
//! every non-empty match in a text, and resolves navigation with wrap-around.
//! The per-tab bookkeeping (count, label, error indicator) lives in
//! [`SearchState`].

use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Pattern and flags as the user entered them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSettings {
    pub pattern: String,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub use_regex: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Search state kept per tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub settings: SearchSettings,
    /// Number of matches, -1 when unknown
    pub match_count: i64,
    /// 1-based index of the selected match, 0 when none is selected,
    /// -1 when unknown
    pub current_match: i64,
    pub result_label: String,
    /// Invalid expression or no matches
    pub error: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            settings: SearchSettings::default(),
            match_count: -1,
            current_match: -1,
            result_label: String::new(),
            error: false,
        }
    }
}

impl SearchState {
    /// Record a count/position pair and refresh the label
    pub fn set_result(&mut self, index: i64, total: i64) {
        self.match_count = total;
        self.current_match = index;
        self.result_label = result_label(index, total);
    }

    /// Reset to "no search"
    pub fn clear_result(&mut self) {
        self.match_count = -1;
        self.current_match = -1;
        self.result_label.clear();
        self.error = false;
    }
}

/// Label for the result area: empty without matches, "0 of N" when no
/// match is selected, "i of N" otherwise
pub fn result_label(index: i64, total: i64) -> String {
    if total <= 0 {
        String::new()
    } else if index < 0 {
        format!("0 of {total}")
    } else {
        format!("{index} of {total}")
    }
}

/// Expression actually searched for
pub fn effective_pattern(settings: &SearchSettings) -> String {
    match (settings.use_regex, settings.whole_word) {
        (true, true) => format!(r"\b(?:{})\b", settings.pattern),
        (true, false) => settings.pattern.clone(),
        (false, true) => format!(r"\b{}\b", regex::escape(&settings.pattern)),
        (false, false) => regex::escape(&settings.pattern),
    }
}

/// Compile the effective expression.
///
/// Returns `None` for an empty pattern and `Some(Err)` for an invalid one.
pub fn compile(settings: &SearchSettings) -> Option<Result<Regex, regex::Error>> {
    if settings.pattern.is_empty() {
        return None;
    }
    Some(
        RegexBuilder::new(&effective_pattern(settings))
            .case_insensitive(!settings.case_sensitive)
            .multi_line(true)
            .build(),
    )
}

/// All non-empty matches in `text`
pub fn find_matches(regex: &Regex, text: &str) -> Vec<Range<usize>> {
    regex
        .find_iter(text)
        .filter(|m| !m.is_empty())
        .map(|m| m.range())
        .collect()
}

/// Next match from `from` in `direction`, wrapping around the buffer.
///
/// Forward returns the first match starting at or after `from`; backward
/// returns the last match ending at or before `from`.
pub fn next_match(
    matches: &[Range<usize>],
    from: usize,
    direction: SearchDirection,
) -> Option<Range<usize>> {
    match direction {
        SearchDirection::Forward => matches
            .iter()
            .find(|m| m.start >= from)
            .or_else(|| matches.first())
            .cloned(),
        SearchDirection::Backward => matches
            .iter()
            .rev()
            .find(|m| m.end <= from)
            .or_else(|| matches.last())
            .cloned(),
    }
}

/// 1-based position of `range` among `matches`, if it is exactly a match
pub fn occurrence_position(matches: &[Range<usize>], range: &Range<usize>) -> Option<usize> {
    matches.iter().position(|m| m == range).map(|i| i + 1)
}

/// Expand `\n`, `\t`, `\r` and `\\` in user-entered search/replace text.
/// Other escapes are kept as typed.
pub fn unescape_search_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Replacement text for the match at `range`.
///
/// In regex mode `$1` / `${name}` refer to capture groups; otherwise the
/// replacement is inserted literally.
pub fn expand_replacement(
    regex: &Regex,
    use_regex: bool,
    text: &str,
    range: &Range<usize>,
    replacement: &str,
) -> String {
    if !use_regex {
        return replacement.to_string();
    }
    match regex.captures_at(text, range.start) {
        Some(caps) if caps.get(0).map(|m| m.range()) == Some(range.clone()) => {
            let mut expanded = String::new();
            caps.expand(replacement, &mut expanded);
            expanded
        }
        _ => replacement.to_string(),
    }
}
