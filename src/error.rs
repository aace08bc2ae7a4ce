use std::path::PathBuf;

use thiserror::Error;

/// Typed error surface for the object store and pack-transfer pipeline.
///
/// Library code returns `Result<T>` built on this enum; `main` converts it to
/// `anyhow::Error` at the process boundary (see `crate::main`).
#[derive(Debug, Error)]
pub enum GitError {
    #[error("object {0} not found")]
    NotFound(String),

    #[error("corrupt object: {0}")]
    Corrupt(String),

    #[error("unsupported tree entry mode {0:o}")]
    UnsupportedMode(u32),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("remote error: {0}")]
    RemoteError(String),

    #[error("delta application mismatch: {0}")]
    DeltaMismatch(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    IoPlain(#[from] std::io::Error),
}

impl GitError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GitError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitError>;
