//! File-backed document store
//!
//! The store owns exactly one file. It never caches the document: the widget
//! and external editors may read or replace the file at any time, so every
//! read goes to disk.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};

/// Contents of a freshly initialized document, and the read fallback
pub const EMPTY_DOCUMENT: &[u8] = b"{}";

/// Persistent storage for the checklist document
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the document as `{}` if it does not exist yet.
    ///
    /// Existing files are left alone whatever they contain.
    pub fn initialize(&self) -> Result<()> {
        if let Some(dir) = self.parent_dir() {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        // The document only appears at its path once fully written
        let temp = self.write_temp(EMPTY_DOCUMENT)?;
        match temp.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::info!("Created empty document at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(StoreError::Persist {
                path: self.path.clone(),
                source: e.error,
            }),
        }
    }

    /// Raw document bytes
    pub fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })
    }

    /// Raw document bytes, or `{}` if the file cannot be read
    pub fn read_or_empty(&self) -> Vec<u8> {
        match self.read() {
            Ok(bytes) => bytes,
            Err(StoreError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!("Document {:?} missing, serving empty", self.path);
                EMPTY_DOCUMENT.to_vec()
            }
            Err(e) => {
                tracing::warn!("{}, serving empty document", e);
                EMPTY_DOCUMENT.to_vec()
            }
        }
    }

    /// Replace the whole document with `bytes`.
    ///
    /// The bytes go to a temp file in the same directory which is then
    /// renamed over the target, so readers see either the old or the new
    /// document and never a partial one.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let temp = self.write_temp(bytes)?;

        // Keep whatever mode the current document has; temp files are 0600
        if let Ok(meta) = fs::metadata(&self.path) {
            temp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|source| StoreError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }

        temp.persist(&self.path)
            .map_err(|e| StoreError::Persist {
                path: self.path.clone(),
                source: e.error,
            })?;

        tracing::debug!("Wrote {} bytes to {:?}", bytes.len(), self.path);
        Ok(())
    }

    /// Fully written and synced temp file next to the document
    fn write_temp(&self, bytes: &[u8]) -> Result<NamedTempFile> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        temp.write_all(bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok(temp)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}
