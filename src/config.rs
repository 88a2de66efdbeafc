use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Files larger than this are loaded asynchronously in chunks (2 MiB)
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 2 * 1024 * 1024;

/// Delay between the first file-change event and its reconciliation
pub const DEFAULT_FILE_EVENT_DEBOUNCE_MS: u64 = 300;

/// Window after our own save during which file-change events are ignored
pub const DEFAULT_SELF_SAVE_SUPPRESS_MS: u64 = 1500;

/// Main configuration structure
///
/// Every field has a default so a partial (or missing) config file still
/// yields a complete configuration. Keys that this version does not know
/// about are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// The to-do file opened at startup when no files are given
    #[serde(default = "default_filepath")]
    pub filepath: String,

    /// Style scheme id used for highlighting (e.g., "cobalt", "jellypie")
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Editor font family
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Editor font size in points
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Editor font weight (100-900)
    #[serde(default = "default_font_weight")]
    pub font_weight: u32,

    /// Highlight every buffer with the jellypie to-do formatting language
    /// instead of the language guessed from the file
    #[serde(default = "default_true")]
    pub allow_jellypie_formatting: bool,

    /// Keyboard shortcut overrides: action name -> accelerator
    /// (e.g., "save": "<Control>s"). Missing actions keep their default.
    #[serde(default = "default_shortcuts")]
    pub shortcuts: BTreeMap<String, String>,

    /// Last window width (-1 = let the shell decide)
    #[serde(default = "default_window_size")]
    pub window_width: i32,

    /// Last window height (-1 = let the shell decide)
    #[serde(default = "default_window_size")]
    pub window_height: i32,

    /// File size threshold in bytes above which files load asynchronously
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold_bytes: u64,

    /// Debounce delay for external file-change events, in milliseconds
    #[serde(default = "default_file_event_debounce")]
    pub file_event_debounce_ms: u64,

    /// Ignore file-change events arriving this soon after our own save
    #[serde(default = "default_self_save_suppress")]
    pub self_save_suppress_ms: u64,

    /// Watch open files for external modification
    #[serde(default = "default_true")]
    pub watch_files: bool,

    /// Keys not recognised by this version, preserved on save
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_filepath() -> String {
    "~/jellypie.todo".to_string()
}

fn default_scheme() -> String {
    "cobalt".to_string()
}

fn default_font_family() -> String {
    "Noto Sans Mono".to_string()
}

fn default_font_size() -> u32 {
    14
}

fn default_font_weight() -> u32 {
    400
}

fn default_window_size() -> i32 {
    -1
}

fn default_large_file_threshold() -> u64 {
    DEFAULT_LARGE_FILE_THRESHOLD
}

fn default_file_event_debounce() -> u64 {
    DEFAULT_FILE_EVENT_DEBOUNCE_MS
}

fn default_self_save_suppress() -> u64 {
    DEFAULT_SELF_SAVE_SUPPRESS_MS
}

/// Built-in accelerators for the configurable actions
pub fn default_shortcuts() -> BTreeMap<String, String> {
    [
        ("save", "<Control>s"),
        ("find", "<Control>f"),
        ("go_to_line", "<Control>g"),
        ("font", "F6"),
        ("quick_help", "F1"),
        ("quit", "<Control>q"),
        ("mark_done", "<Control>d"),
        ("format_bold", "<Control>b"),
        ("format_italic", "<Control>i"),
        ("format_monospace", "<Control>t"),
    ]
    .into_iter()
    .map(|(action, accel)| (action.to_string(), accel.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filepath: default_filepath(),
            scheme: default_scheme(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
            allow_jellypie_formatting: true,
            shortcuts: default_shortcuts(),
            window_width: default_window_size(),
            window_height: default_window_size(),
            large_file_threshold_bytes: DEFAULT_LARGE_FILE_THRESHOLD,
            file_event_debounce_ms: DEFAULT_FILE_EVENT_DEBOUNCE_MS,
            self_save_suppress_ms: DEFAULT_SELF_SAVE_SUPPRESS_MS,
            watch_files: true,
            extra: Map::new(),
        }
    }
}

impl Config {
    /// The config filename used in the data directory
    pub const FILENAME: &'static str = "config.json";

    /// Parse a config document and merge it over the defaults.
    ///
    /// Scalar keys simply override. The shortcut map is merged key by key so a
    /// user who rebinds one action keeps the defaults for all the others.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.merge_default_shortcuts();
        config.validate()?;
        Ok(config)
    }

    /// Load and merge a config file from disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    fn merge_default_shortcuts(&mut self) {
        let user = std::mem::take(&mut self.shortcuts);
        self.shortcuts = default_shortcuts();
        self.shortcuts.extend(user);
    }

    /// The configured to-do file with `~` expanded
    pub fn todo_file_path(&self) -> PathBuf {
        expand_tilde(&self.filepath)
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.font_size == 0 {
            return Err(ConfigError::Validation(
                "font_size must be greater than 0".to_string(),
            ));
        }
        if !(100..=1000).contains(&self.font_weight) {
            return Err(ConfigError::Validation(
                "font_weight must be between 100 and 1000".to_string(),
            ));
        }
        if self.large_file_threshold_bytes == 0 {
            return Err(ConfigError::Validation(
                "large_file_threshold_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand a leading `~` or `~/` to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
