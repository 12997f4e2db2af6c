//! Whole-file access to the patched artifacts.
//!
//! A [`TextDocument`] is a snapshot taken at the start of an operation. Edits
//! happen on an owned copy of the text and the result goes back to disk in a
//! single atomic write (tempfile + fsync + rename), so readers never observe a
//! half-written file.

use crate::error::PatchError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Immutable snapshot of one artifact's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    path: PathBuf,
    content: String,
}

impl TextDocument {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read `path` into a snapshot.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let content = read_document(path)?;
        Ok(Self::new(path, content))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Produce the successor snapshot with new content for the same path.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self::new(self.path.clone(), content)
    }

    /// Persist this snapshot, replacing whatever is on disk.
    pub fn write(&self) -> Result<(), PatchError> {
        write_document(&self.path, &self.content)
    }
}

/// Read a whole artifact as UTF-8.
pub fn read_document(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => PatchError::NotFound {
            path: path.to_path_buf(),
        },
        _ => PatchError::ReadFailure {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Overwrite an artifact with `content`.
///
/// Any OS-level failure (permissions, missing parent, full disk) surfaces as
/// [`PatchError::WriteFailure`]; nothing is retried.
pub fn write_document(path: &Path, content: &str) -> Result<(), PatchError> {
    atomic_write(path, content.as_bytes()).map_err(|source| PatchError::WriteFailure {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = content.len(), "wrote document");
    Ok(())
}

fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Tempfile must live on the same filesystem for the rename to be atomic.
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Keep the original file mode; nginx and the dashboard read these as another user.
    if let Ok(meta) = fs::metadata(path) {
        temp.as_file().set_permissions(meta.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
