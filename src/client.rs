//! Process-wide native client initialization
//!
//! The client directory has to be registered once, before any session is
//! opened. Drivers that need it read it back through [`client_dir`].

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CLIENT_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Register the client library directory.
///
/// Calling this again with the same directory is a no-op; a different
/// directory is rejected.
pub fn init_client(dir: impl AsRef<Path>) -> Result<()> {
    let requested = dir.as_ref();
    if !requested.is_dir() {
        return Err(Error::InvalidClientDir(requested.to_path_buf()));
    }

    let requested = requested
        .canonicalize()
        .map_err(|e| Error::io(requested, e))?;
    let current = CLIENT_DIR.get_or_init(|| requested.clone());

    if *current != requested {
        return Err(Error::ClientAlreadyInitialized {
            current: current.clone(),
            requested,
        });
    }

    tracing::debug!(dir = %current.display(), "native client initialized");
    Ok(())
}

/// The registered client directory, if [`init_client`] has run.
pub fn client_dir() -> Option<&'static Path> {
    CLIENT_DIR.get().map(PathBuf::as_path)
}

/// Like [`client_dir`], but an error when the client was never initialized.
pub fn require_client() -> Result<&'static Path> {
    client_dir().ok_or(Error::ClientNotInitialized)
}
