use std::path::PathBuf;

/// Errors raised by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is already registered to another tab", path.display())]
    DuplicateRegistration { path: PathBuf },
    #[error("Could not watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
