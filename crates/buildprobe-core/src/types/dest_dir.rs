//! Resolved destination directory type.

use crate::ExtractionError;
use crate::Result;
use crate::security::resolve_on_disk;
use std::path::Path;
use std::path::PathBuf;

/// The directory an archive is extracted into.
///
/// Construction resolves the path once, the same way every entry path is
/// resolved later:
/// - relative paths are made absolute against the current directory
/// - `.` and `..` are removed
/// - the longest existing ancestor is canonicalized, so a destination
///   reached through a symlink compares equal to its real location
///
/// The directory itself does not have to exist yet; [`DestDir::create`]
/// makes it once validation has passed.
///
/// # Examples
///
/// ```no_run
/// use buildprobe_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("out/project")?;
/// assert!(dest.as_path().is_absolute());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Resolves `path` into a destination directory.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::Io` if the current directory is unavailable,
    /// canonicalization fails, or the path exists and is not a directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let resolved = resolve_on_disk(&path).map_err(|e| {
            ExtractionError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to resolve destination {}: {e}", path.display()),
            ))
        })?;

        if resolved.exists() && !resolved.is_dir() {
            return Err(ExtractionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path is not a directory: {}", resolved.display()),
            )));
        }

        Ok(Self(resolved))
    }

    /// Returns the resolved absolute path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Creates the directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn create(&self) -> Result<()> {
        std::fs::create_dir_all(&self.0)?;
        Ok(())
    }

    /// Returns `true` if `path` is this directory or lies beneath it.
    ///
    /// `path` must already be absolute and normalized; comparison is by
    /// path components.
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.0)
    }

    /// Joins a validated entry path to this directory.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &super::SafePath) -> PathBuf {
        self.join_path(safe_path.as_path())
    }

    /// Joins an already validated relative path to this directory.
    ///
    /// An empty path yields the directory itself, without a trailing
    /// separator.
    #[inline]
    #[must_use]
    pub fn join_path(&self, path: &Path) -> PathBuf {
        if path.as_os_str().is_empty() {
            self.0.clone()
        } else {
            self.0.join(path)
        }
    }
}
