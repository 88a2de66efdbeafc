//! Accelerator parsing and the action keymap.
//!
//! Accelerators use the GTK notation found in the config file:
//! `<Control>s`, `<Control><Shift>s`, `F6`, `<Control>Page_Down`.

use super::commands::Action;
use crate::config::Config;
use std::collections::HashMap;
use std::fmt;

/// A key plus modifiers, normalized for lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Lowercased key name (`s`, `f6`, `page_down`)
    pub key: String,
}

impl KeyCombo {
    pub fn new(key: &str) -> Self {
        Self {
            ctrl: false,
            shift: false,
            alt: false,
            key: key.to_lowercase(),
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("<Control>")?;
        }
        if self.shift {
            f.write_str("<Shift>")?;
        }
        if self.alt {
            f.write_str("<Alt>")?;
        }
        match self.key.as_str() {
            key if key.len() > 1 && key.starts_with('f') && key[1..].parse::<u8>().is_ok() => {
                write!(f, "F{}", &key[1..])
            }
            "escape" => f.write_str("Escape"),
            "page_down" => f.write_str("Page_Down"),
            "page_up" => f.write_str("Page_Up"),
            "insert" => f.write_str("Insert"),
            key => f.write_str(key),
        }
    }
}

/// Parse a GTK-style accelerator. Returns None for malformed strings.
pub fn parse_accelerator(accel: &str) -> Option<KeyCombo> {
    let mut combo = KeyCombo::new("");
    let mut rest = accel.trim();

    while let Some(stripped) = rest.strip_prefix('<') {
        let end = stripped.find('>')?;
        match stripped[..end].to_lowercase().as_str() {
            "control" | "ctrl" | "primary" => combo.ctrl = true,
            "shift" => combo.shift = true,
            "alt" | "mod1" => combo.alt = true,
            _ => return None,
        }
        rest = &stripped[end + 1..];
    }

    if rest.is_empty() || rest.contains(['<', '>']) || rest.chars().any(char::is_whitespace) {
        return None;
    }
    combo.key = rest.to_lowercase();
    Some(combo)
}

/// Bindings used for actions the user has not configured
fn builtin_shortcuts() -> Vec<(Action, &'static str)> {
    vec![
        (Action::SaveAs, "<Control><Shift>s"),
        (Action::Open, "<Control>o"),
        (Action::NewTab, "<Control>n"),
        (Action::CloseTab, "<Control>w"),
        (Action::FindNext, "F3"),
        (Action::FindPrevious, "<Shift>F3"),
        (Action::Escape, "Escape"),
        (Action::NextTab, "<Control>Page_Down"),
        (Action::PreviousTab, "<Control>Page_Up"),
        (Action::ToggleOverwrite, "Insert"),
    ]
}

/// Accelerator → action table
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, Action>,
    by_action: HashMap<Action, KeyCombo>,
}

impl Keymap {
    /// Build the keymap from the configured shortcuts over the built-in ones.
    ///
    /// Unknown action names and malformed accelerators are skipped with a
    /// warning.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::default();
        for (action, accel) in builtin_shortcuts() {
            if let Some(combo) = parse_accelerator(accel) {
                keymap.bind(combo, action);
            }
        }
        for (name, accel) in &config.shortcuts {
            let Some(action) = Action::from_name(name) else {
                tracing::warn!("Ignoring shortcut for unknown action {:?}", name);
                continue;
            };
            let Some(combo) = parse_accelerator(accel) else {
                tracing::warn!("Ignoring malformed accelerator {:?} for {}", accel, name);
                continue;
            };
            keymap.bind(combo, action);
        }
        keymap
    }

    /// Bind `combo` to `action`, replacing the action's previous binding and
    /// whatever the combo was bound to before
    pub fn bind(&mut self, combo: KeyCombo, action: Action) {
        if let Some(old) = self.by_action.remove(&action) {
            self.bindings.remove(&old);
        }
        if let Some(previous) = self.bindings.insert(combo.clone(), action) {
            if previous != action {
                tracing::debug!("{} rebound from {} to {}", combo, previous, action);
                self.by_action.remove(&previous);
            }
        }
        self.by_action.insert(action, combo);
    }

    pub fn resolve(&self, combo: &KeyCombo) -> Option<Action> {
        self.bindings.get(combo).copied()
    }

    pub fn accelerator_for(&self, action: Action) -> Option<&KeyCombo> {
        self.by_action.get(&action)
    }

    /// (accelerator, action) pairs in action order, for help listings
    pub fn bindings(&self) -> Vec<(String, Action)> {
        Action::ALL
            .into_iter()
            .filter_map(|action| {
                self.by_action
                    .get(&action)
                    .map(|combo| (combo.to_string(), action))
            })
            .collect()
    }
}
