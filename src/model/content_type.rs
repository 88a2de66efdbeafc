//! Content-type sniffing for files being opened or saved.
//!
//! A file is classified from its name first (MIME hint and highlighting
//! language). Only when neither says "text" is the first [`PROBE_LEN`] bytes
//! decoded as UTF-8 to decide whether it is binary.
//!
//! [`PROBE_LEN`]: crate::model::filesystem::PROBE_LEN

use std::path::Path;

/// Language id used when to-do formatting is enabled for every buffer
pub const FORMATTED_LANGUAGE: &str = "jellypie-formatted";

/// MIME types shown without any highlighting language
pub const PLAIN_WHITELIST: &[&str] = &[
    "text/csv",
    "text/tab-separated-values",
    "text/x-log",
    "text/x-gettext-translation",
    "application/x-hex-dump",
    "application/octet-stream",
];

/// Fallback MIME type when the name gives no hint
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// (extension, MIME type, highlighting language)
const EXTENSIONS: &[(&str, &str, Option<&str>)] = &[
    ("txt", "text/plain", None),
    ("todo", "text/plain", None),
    ("md", "text/markdown", Some("markdown")),
    ("markdown", "text/markdown", Some("markdown")),
    ("log", "text/x-log", None),
    ("csv", "text/csv", None),
    ("tsv", "text/tab-separated-values", None),
    ("po", "text/x-gettext-translation", Some("gettext-translation")),
    ("rs", "text/rust", Some("rust")),
    ("py", "text/x-python", Some("python3")),
    ("c", "text/x-csrc", Some("c")),
    ("h", "text/x-chdr", Some("c")),
    ("cpp", "text/x-c++src", Some("cpp")),
    ("js", "application/javascript", Some("js")),
    ("ts", "application/x-typescript", Some("typescript")),
    ("json", "application/json", Some("json")),
    ("toml", "application/toml", Some("toml")),
    ("yaml", "application/x-yaml", Some("yaml")),
    ("yml", "application/x-yaml", Some("yaml")),
    ("xml", "application/xml", Some("xml")),
    ("html", "text/html", Some("html")),
    ("css", "text/css", Some("css")),
    ("sh", "application/x-shellscript", Some("sh")),
    ("ini", "text/plain", Some("ini")),
    ("hex", "application/x-hex-dump", None),
    ("png", "image/png", None),
    ("jpg", "image/jpeg", None),
    ("jpeg", "image/jpeg", None),
    ("gif", "image/gif", None),
    ("pdf", "application/pdf", None),
    ("zip", "application/zip", None),
    ("gz", "application/gzip", None),
];

/// What the name of a file says about its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub mime_type: String,
    /// Guessed highlighting language
    pub language: Option<String>,
}

impl ContentType {
    /// Type of a document that has never been saved
    pub fn plain_text() -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            language: None,
        }
    }

    /// Classify `path` from its extension alone
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let entry = extension
            .as_deref()
            .and_then(|ext| EXTENSIONS.iter().find(|(e, _, _)| *e == ext));

        match entry {
            Some((_, mime, language)) => Self {
                mime_type: (*mime).to_string(),
                language: language.map(str::to_string),
            },
            None => Self {
                mime_type: UNKNOWN_MIME.to_string(),
                language: None,
            },
        }
    }

    /// Classify `path`, using the content prefix to refine an unknown type.
    ///
    /// Returns `None` when the file is binary.
    pub fn sniff(path: &Path, prefix: &[u8]) -> Option<Self> {
        let mut content_type = Self::from_path(path);
        if !content_type.needs_probe() {
            return Some(content_type);
        }
        if !probe_utf8(prefix) {
            return None;
        }
        // Readable text with an unhelpful name
        if content_type.mime_type == UNKNOWN_MIME {
            content_type.mime_type = "text/plain".to_string();
        }
        Some(content_type)
    }

    /// Neither a language nor a text MIME type vouches for this file
    pub fn needs_probe(&self) -> bool {
        self.language.is_none() && !self.mime_type.starts_with("text")
    }

    /// Short label for the status area: the MIME subtype uppercased, with
    /// any `x-` prefix removed (`text/x-log` -> `LOG`)
    pub fn file_type_label(&self) -> String {
        let subtype = self
            .mime_type
            .split_once('/')
            .map(|(_, sub)| sub)
            .unwrap_or(&self.mime_type);
        subtype
            .strip_prefix("x-")
            .unwrap_or(subtype)
            .to_uppercase()
    }

    /// Language to highlight the buffer with
    pub fn language_for_buffer(&self, allow_formatting: bool) -> Option<String> {
        if allow_formatting {
            return Some(FORMATTED_LANGUAGE.to_string());
        }
        if PLAIN_WHITELIST.contains(&self.mime_type.as_str()) {
            None
        } else {
            self.language.clone()
        }
    }
}

/// Whether `prefix` decodes as UTF-8.
///
/// A multi-byte sequence cut off at the end of the probe window counts as
/// valid, since the probe boundary is arbitrary.
pub fn probe_utf8(prefix: &[u8]) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
