//! Document model
//!
//! The in-memory buffer plus the file access and content sniffing the
//! session uses to fill it.

pub mod buffer;
pub mod content_type;
pub mod filesystem;
