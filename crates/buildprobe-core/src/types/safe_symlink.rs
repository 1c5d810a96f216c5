//! Validated symlink type.

use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::Result;
use crate::security::normalize_lexical;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;
use super::SafePath;

/// A symlink whose target lexically resolves inside the destination.
///
/// The target is kept exactly as stored in the archive; it is resolved
/// relative to the link's parent directory only for the containment check.
///
/// # Examples
///
/// ```no_run
/// use buildprobe_core::ExtractionConfig;
/// use buildprobe_core::types::DestDir;
/// use buildprobe_core::types::SafePath;
/// use buildprobe_core::types::SafeSymlink;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/out")?;
/// let config = ExtractionConfig::default();
///
/// let link = SafePath::validate(Path::new("dir/link"), &dest)?;
/// let symlink = SafeSymlink::validate(&link, Path::new("../file.txt"), &dest, &config)?;
/// assert_eq!(symlink.target_path(), Path::new("../file.txt"));
///
/// let outside = SafeSymlink::validate(&link, Path::new("../../x"), &dest, &config);
/// assert!(outside.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSymlink {
    link_path: PathBuf,
    target_path: PathBuf,
}

impl SafeSymlink {
    /// Validates a symlink entry.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::SecurityViolation` if symlinks are disabled or the
    ///   target is empty
    /// - `ExtractionError::SymlinkEscape` if the target is absolute or
    ///   resolves outside `dest`
    pub fn validate(
        link: &SafePath,
        target: &Path,
        dest: &DestDir,
        config: &ExtractionConfig,
    ) -> Result<Self> {
        if !config.allowed.symlinks {
            return Err(ExtractionError::SecurityViolation {
                reason: format!("symlinks not allowed: {}", link.as_path().display()),
            });
        }

        if target.as_os_str().is_empty() {
            return Err(ExtractionError::SecurityViolation {
                reason: format!("symlink has empty target: {}", link.as_path().display()),
            });
        }

        if target.has_root() {
            return Err(ExtractionError::SymlinkEscape {
                path: link.as_path().to_path_buf(),
            });
        }

        let resolved = normalize_lexical(&dest.join_path(link_parent(link)).join(target));
        if !dest.contains(&resolved) {
            return Err(ExtractionError::SymlinkEscape {
                path: link.as_path().to_path_buf(),
            });
        }

        Ok(Self {
            link_path: link.as_path().to_path_buf(),
            target_path: target.to_path_buf(),
        })
    }

    /// Returns the link path, relative to the destination.
    #[inline]
    #[must_use]
    pub fn link_path(&self) -> &Path {
        &self.link_path
    }

    /// Returns the target as stored in the archive.
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Returns the target joined to the link's parent, unresolved.
    ///
    /// This is the path the link points at when read from the destination
    /// root, which is what link resolution walks.
    #[must_use]
    pub fn target_from_root(&self) -> PathBuf {
        self.link_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.target_path)
    }
}

fn link_parent(link: &SafePath) -> &Path {
    link.as_path().parent().unwrap_or_else(|| Path::new(""))
}
