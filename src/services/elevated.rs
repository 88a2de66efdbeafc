//! Privileged write fallback.
//!
//! When a plain save fails with permission denied, the session retries the
//! same write through an [`ElevatedWriter`]. The default implementation
//! pipes the content to `pkexec tee <path>`.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

pub trait ElevatedWriter {
    /// Write `contents` to `path` with elevated privileges
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes through `pkexec tee`
#[derive(Debug, Clone)]
pub struct PkexecWriter {
    program: String,
}

impl Default for PkexecWriter {
    fn default() -> Self {
        Self {
            program: "pkexec".to_string(),
        }
    }
}

impl PkexecWriter {
    /// Use a different escalation helper with the same calling convention
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ElevatedWriter for PkexecWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut child = Command::new(&self.program)
            .arg("tee")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(contents) {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!("Writing to {} for {:?} failed: {}", self.program, path, e);
                return Err(e);
            }
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            tracing::info!("Elevated write to {:?} succeeded", path);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!("Elevated write to {:?} failed: {}", path, stderr.trim());
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} exited with {}", self.program, output.status),
            ))
        }
    }
}

/// Elevated writer that always refuses, for sessions without escalation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoElevation;

impl ElevatedWriter for NoElevation {
    fn write(&self, _path: &Path, _contents: &[u8]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "elevated writes are disabled",
        ))
    }
}
