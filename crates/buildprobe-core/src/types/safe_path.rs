//! Validated entry path type.

use crate::ExtractionError;
use crate::Result;
use crate::security::normalize_lexical;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;

/// An entry path that lexically resolves inside a [`DestDir`].
///
/// The stored value is relative to the destination and normalized: no `.`
/// or `..` components, no root. It is empty for entries naming the
/// destination itself (`./` in most tarballs).
///
/// `..` is accepted as long as the result stays inside: `a/../b.txt` becomes
/// `b.txt`, while `../b.txt` is rejected. Absolute entry paths replace the
/// destination when joined and are rejected unless they point back into it.
///
/// # Security Properties
///
/// - Can ONLY be constructed through validation
/// - NO `From<PathBuf>` implementation
/// - Containment is decided by path components, not string prefixes
///
/// Symlinks are not considered here; see [`crate::security::LinkTree`] and
/// [`crate::security::resolve_on_disk`].
///
/// # Examples
///
/// ```no_run
/// use buildprobe_core::types::DestDir;
/// use buildprobe_core::types::SafePath;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/out")?;
///
/// let safe = SafePath::validate(Path::new("pkg/./src/../setup.py"), &dest)?;
/// assert_eq!(safe.as_path(), Path::new("pkg/setup.py"));
///
/// assert!(SafePath::validate(Path::new("../etc/passwd"), &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates `path` against `dest`.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject null bytes
    /// 2. Join the entry path to the destination
    /// 3. Normalize `.` and `..` lexically
    /// 4. Require the destination as a component prefix of the result
    ///
    /// # Errors
    ///
    /// - `ExtractionError::SecurityViolation` for null bytes
    /// - `ExtractionError::PathTraversal` if the result escapes `dest`
    pub fn validate(path: &Path, dest: &DestDir) -> Result<Self> {
        if has_null_bytes(path) {
            return Err(ExtractionError::SecurityViolation {
                reason: format!("path contains null bytes: {}", path.display()),
            });
        }

        let candidate = normalize_lexical(&dest.join_path(path));

        match candidate.strip_prefix(dest.as_path()) {
            Ok(relative) => Ok(Self(relative.to_path_buf())),
            Err(_) => Err(ExtractionError::PathTraversal {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Returns the path relative to the destination.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` for the destination itself.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

/// Checks if a path contains null bytes.
#[cfg(unix)]
fn has_null_bytes(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().contains(&b'\0')
}

/// Checks if a path contains null bytes.
#[cfg(not(unix))]
fn has_null_bytes(path: &Path) -> bool {
    path.to_str().is_none_or(|s| s.contains('\0'))
}
