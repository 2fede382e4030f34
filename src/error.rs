//! Library error type

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid connection settings: {0}")]
    InvalidSettings(String),

    #[error("native client not initialized; call client::init_client first")]
    ClientNotInitialized,

    #[error(
        "native client already initialized from {}, refusing {}",
        .current.display(),
        .requested.display()
    )]
    ClientAlreadyInitialized { current: PathBuf, requested: PathBuf },

    #[error("native client directory {} does not exist or is not a directory", .0.display())]
    InvalidClientDir(PathBuf),

    #[error("session is closed")]
    SessionClosed,

    /// Whatever the database driver reported, carried untouched.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Driver(Box::new(err))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<tiberius::error::Error> for Error {
    fn from(err: tiberius::error::Error) -> Self {
        Error::driver(err)
    }
}
