use std::path::PathBuf;

use crate::Hash;

/// error type for jit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a jit repository (no .jit in {0} or any parent)")]
    NoRepo(PathBuf),

    #[error(".jit directory already exists at {0}")]
    RepoExists(PathBuf),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error("invalid ref name: {0}")]
    InvalidRef(String),

    #[error("object not found: {0}")]
    ObjectNotFound(Hash),

    #[error("corrupt object: digest mismatch for {0}")]
    CorruptObject(Hash),

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("malformed index entry: {0}")]
    MalformedIndex(String),

    #[error("invalid object type: {0}")]
    InvalidObjectType(String),

    #[error("invalid digest hex: {0}")]
    InvalidHashHex(String),

    #[error("invalid tree entry name: {0}")]
    InvalidEntryName(String),

    #[error("duplicate tree entry name: {0}")]
    DuplicateEntryName(String),

    #[error("path is outside the working tree: {0}")]
    OutsideWorkTree(PathBuf),

    #[error("lock contention on repository")]
    LockContention,

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
