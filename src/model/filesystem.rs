//! Filesystem access used by the session.
//!
//! All reads and writes go through [`FileSystem`] so tests can observe or
//! fail them without touching real permissions.

use std::io::{self, Read, Write};
use std::path::Path;

/// Size of the prefix read for content sniffing
pub const PROBE_LEN: usize = 2048;

/// Minimal file operations needed by the editor core
pub trait FileSystem: Send + Sync {
    /// Read the whole file
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read at most `len` bytes from the start of the file
    fn read_prefix(&self, path: &Path, len: usize) -> io::Result<Vec<u8>>;

    /// Replace the file's content
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// File size in bytes
    fn len(&self, path: &Path) -> io::Result<u64>;

    fn exists(&self, path: &Path) -> bool;

    /// Open a streaming reader, used by the background loader
    fn open_reader(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_prefix(&self, path: &Path, len: usize) -> io::Result<Vec<u8>> {
        let file = std::fs::File::open(path)?;
        let mut buf = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Write to a temp file in the target directory, then rename over the
    /// destination. The original file's permissions are carried over.
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let original_permissions = std::fs::metadata(path).ok().map(|m| m.permissions());

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;
        if let Some(permissions) = original_permissions {
            // Best effort
            let _ = std::fs::set_permissions(temp.path(), permissions);
        }
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open_reader(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }
}
